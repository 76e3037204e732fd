// src/config.rs
//! Runtime configuration: Gemini credential, model selection, behavior
//! variant, and the public URL embedded in share links.
//!
//! Everything is read from the environment once at startup (after
//! `dotenvy::dotenv()`); the resulting `AppConfig` is passed explicitly into
//! the diagnosis pipeline. No module reads env vars after boot.

use std::env;

use thiserror::Error;

// --- env defaults & names ---
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_GEMINI_API_URL: &str = "GEMINI_API_URL";
pub const ENV_DIAGNOSIS_VARIANT: &str = "DIAGNOSIS_VARIANT";
pub const ENV_APP_PUBLIC_URL: &str = "APP_PUBLIC_URL";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_APP_PUBLIC_URL: &str = "https://enjo-risk-analyzer.shuttleapp.rs";

/// Shown verbatim when the service refuses to start without a credential.
pub const SETUP_INSTRUCTIONS: &str =
    "GEMINI_API_KEY が設定されていません。.env または Shuttle の Secrets に設定してください。";

/// Which generation of the diagnosis behavior runs.
///
/// The two variants differ in rating domain (1–5 vs 0–5), prompt contents
/// (language detection, regional analysis) and score normalization
/// (reconciliation exists only in `Extended`). They are deliberately kept as
/// two distinct behaviors behind one switch rather than merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosisVariant {
    Base,
    Extended,
}

impl DiagnosisVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisVariant::Base => "base",
            DiagnosisVariant::Extended => "extended",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{SETUP_INSTRUCTIONS}")]
    MissingApiKey,
    #[error("Unsupported {ENV_DIAGNOSIS_VARIANT} value: {0:?} (expected \"base\" or \"extended\")")]
    InvalidVariant(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub variant: DiagnosisVariant,
    pub app_public_url: String,
}

impl AppConfig {
    /// Read configuration from the environment. Missing credential is fatal;
    /// everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = match env::var(ENV_GEMINI_API_KEY) {
            Ok(k) if !k.trim().is_empty() => k,
            _ => return Err(ConfigError::MissingApiKey),
        };

        Ok(Self {
            api_key,
            model: env_or(ENV_GEMINI_MODEL, DEFAULT_GEMINI_MODEL),
            api_url: trim_trailing_slash(env_or(ENV_GEMINI_API_URL, DEFAULT_GEMINI_API_URL)),
            variant: parse_variant(env::var(ENV_DIAGNOSIS_VARIANT).ok())?,
            app_public_url: env_or(ENV_APP_PUBLIC_URL, DEFAULT_APP_PUBLIC_URL),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

// parse optional variant env; unknown values are a startup error, not a
// silent default (the variants score differently)
fn parse_variant(raw: Option<String>) -> Result<DiagnosisVariant, ConfigError> {
    match raw {
        None => Ok(DiagnosisVariant::Extended),
        Some(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(DiagnosisVariant::Extended),
            "base" => Ok(DiagnosisVariant::Base),
            "extended" => Ok(DiagnosisVariant::Extended),
            _ => Err(ConfigError::InvalidVariant(s)),
        },
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_defaults_to_extended() {
        assert_eq!(parse_variant(None).unwrap(), DiagnosisVariant::Extended);
        assert_eq!(
            parse_variant(Some("".into())).unwrap(),
            DiagnosisVariant::Extended
        );
    }

    #[test]
    fn variant_parses_both_generations() {
        assert_eq!(
            parse_variant(Some("base".into())).unwrap(),
            DiagnosisVariant::Base
        );
        assert_eq!(
            parse_variant(Some("  Extended ".into())).unwrap(),
            DiagnosisVariant::Extended
        );
    }

    #[test]
    fn variant_rejects_unknown_values() {
        let err = parse_variant(Some("v3".into())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVariant(_)));
    }

    #[test]
    fn missing_key_error_carries_setup_instructions() {
        let msg = ConfigError::MissingApiKey.to_string();
        assert_eq!(msg, SETUP_INSTRUCTIONS);
    }

    #[test]
    fn api_url_loses_trailing_slashes() {
        assert_eq!(
            trim_trailing_slash("https://example.com/v1beta//".into()),
            "https://example.com/v1beta"
        );
    }
}
