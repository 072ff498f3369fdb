//! Script-gated text normalisation.
//!
//! Blocks written in a different script from the query would never share
//! terms with it, so they are routed through an external translator before
//! entering the vector space. Normalisation is strictly best-effort: every
//! failure path returns the input unchanged and the pipeline never sees an
//! error.

use crate::config::TranslationConfig;
use std::io::Write;
use std::ops::RangeInclusive;
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Maps a text span to its normalised form. Must never fail.
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Pass-through normalizer, used when translation is disabled and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl TextNormalizer for IdentityNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Why a translation attempt was abandoned.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("failed to run translator '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("translator I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("translator exited with {0}")]
    ExitStatus(std::process::ExitStatus),

    #[error("translator reported: {0}")]
    Stderr(String),

    #[error("translator produced no output")]
    EmptyOutput,
}

/// A fallible translation backend.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

/// Runs a command-line translator: `<command> <src>-<tgt>`, text on stdin,
/// translation on stdout. Any stderr output counts as failure.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    command: String,
    language_pair: String,
}

impl CommandTranslator {
    pub fn new(command: impl Into<String>, language_pair: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language_pair: language_pair.into(),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.command.clone(), config.language_pair())
    }
}

impl Translator for CommandTranslator {
    fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let mut child = Command::new(&self.command)
            .arg(&self.language_pair)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TranslationError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty translator cannot
        // fill its stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_owned();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output()?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(res) => res?,
                Err(_) => {
                    return Err(TranslationError::Io(std::io::Error::other(
                        "stdin writer panicked",
                    )))
                }
            }
        }

        if !output.status.success() {
            return Err(TranslationError::ExitStatus(output.status));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(TranslationError::Stderr(stderr.trim().to_string()));
        }
        let translated = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if translated.is_empty() {
            return Err(TranslationError::EmptyOutput);
        }
        Ok(translated)
    }
}

/// Translates only text containing a character from `script`.
pub struct ScriptNormalizer {
    script: RangeInclusive<char>,
    translator: Arc<dyn Translator>,
}

impl ScriptNormalizer {
    pub fn new(script: RangeInclusive<char>, translator: Arc<dyn Translator>) -> Self {
        Self { script, translator }
    }

    /// The command-line translator described by `config`.
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(
            config.script_range(),
            Arc::new(CommandTranslator::from_config(config)),
        )
    }
}

impl TextNormalizer for ScriptNormalizer {
    fn normalize(&self, text: &str) -> String {
        if !contains_script(text, &self.script) {
            return text.to_string();
        }
        match self.translator.translate(text) {
            Ok(translated) => translated,
            Err(e) => {
                debug!("Translation skipped, keeping original text: {}", e);
                text.to_string()
            }
        }
    }
}

/// True when any character of `text` falls inside `script`.
pub fn contains_script(text: &str, script: &RangeInclusive<char>) -> bool {
    text.chars().any(|c| script.contains(&c))
}

/// Pick the normalizer for a run: an explicit one wins, disabled
/// translation yields the identity, otherwise the configured command.
pub fn resolve_normalizer(
    explicit: Option<&Arc<dyn TextNormalizer>>,
    translation: &TranslationConfig,
) -> Arc<dyn TextNormalizer> {
    if let Some(normalizer) = explicit {
        return Arc::clone(normalizer);
    }
    if !translation.enabled {
        return Arc::new(IdentityNormalizer);
    }
    Arc::new(ScriptNormalizer::from_config(translation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct UpperTranslator {
        calls: AtomicUsize,
    }

    impl Translator for UpperTranslator {
        fn translate(&self, text: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("translated: {text}"))
        }
    }

    struct FailingTranslator;

    impl Translator for FailingTranslator {
        fn translate(&self, _text: &str) -> Result<String, TranslationError> {
            Err(TranslationError::EmptyOutput)
        }
    }

    fn kana() -> RangeInclusive<char> {
        '\u{3040}'..='\u{30FF}'
    }

    #[test]
    fn detects_kana() {
        assert!(contains_script("Tokyo とうきょう", &kana()));
        assert!(contains_script("カタカナ", &kana()));
        assert!(!contains_script("plain ascii text", &kana()));
        // Kanji sits outside the kana block.
        assert!(!contains_script("東京", &kana()));
    }

    #[test]
    fn latin_text_bypasses_translator() {
        let translator = Arc::new(UpperTranslator {
            calls: AtomicUsize::new(0),
        });
        let n = ScriptNormalizer::new(kana(), translator.clone());
        assert_eq!(n.normalize("hello world"), "hello world");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn kana_text_is_translated() {
        let translator = Arc::new(UpperTranslator {
            calls: AtomicUsize::new(0),
        });
        let n = ScriptNormalizer::new(kana(), translator.clone());
        assert_eq!(n.normalize("すし"), "translated: すし");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn translator_failure_returns_original() {
        let n = ScriptNormalizer::new(kana(), Arc::new(FailingTranslator));
        assert_eq!(n.normalize("すし"), "すし");
    }

    #[test]
    fn missing_binary_returns_original() {
        let translator = CommandTranslator::new("pdfrank-no-such-translator-binary", "ja-en");
        assert!(matches!(
            translator.translate("すし"),
            Err(TranslationError::Spawn { .. })
        ));
        let n = ScriptNormalizer::new(kana(), Arc::new(translator));
        assert_eq!(n.normalize("すし"), "すし");
    }

    #[cfg(unix)]
    #[test]
    fn stderr_output_counts_as_failure() {
        // `cat ja-en` fails to open a file named "ja-en" and complains on stderr.
        let translator = CommandTranslator::new("cat", "pdfrank-missing-file-ja-en");
        assert!(translator.translate("すし").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_returned_trimmed() {
        // `cat -` echoes stdin back.
        let translator = CommandTranslator::new("cat", "-");
        assert_eq!(translator.translate("  すしと天ぷら\n").unwrap(), "すしと天ぷら");
    }

    #[cfg(unix)]
    #[test]
    fn large_input_does_not_deadlock() {
        // Far larger than a pipe buffer in both directions.
        let text = "ramen ".repeat(100_000);
        let translator = CommandTranslator::new("cat", "-");
        let out = translator.translate(&text).unwrap();
        assert_eq!(out.len(), text.trim_end().len());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_without_stderr_is_failure() {
        let translator = CommandTranslator::new("false", "ja-en");
        assert!(matches!(
            translator.translate("すし"),
            Err(TranslationError::ExitStatus(status)) if !status.success()
        ));
        let n = ScriptNormalizer::new(kana(), Arc::new(translator));
        assert_eq!(n.normalize("すし"), "すし");
    }

    #[test]
    fn resolve_prefers_explicit_then_disabled() {
        let explicit: Arc<dyn TextNormalizer> = Arc::new(IdentityNormalizer);
        let n = resolve_normalizer(Some(&explicit), &TranslationConfig::default());
        assert_eq!(n.normalize("すし"), "すし");

        let disabled = TranslationConfig {
            enabled: false,
            ..TranslationConfig::default()
        };
        let n = resolve_normalizer(None, &disabled);
        assert_eq!(n.normalize("すし"), "すし");
    }
}
