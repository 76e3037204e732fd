// src/diagnose/mod.rs
//! Diagnosis pipeline: one submission in, one outcome out.
//!
//! Order is fixed: signature check, field validation, prompt, one model
//! call, parse, normalize, render. Nothing is persisted between
//! submissions and nothing is retried; given the completion text the rest
//! of the pipeline is deterministic.

pub mod client;
pub mod normalize;
pub mod parse;
pub mod prompt;
pub mod report;
pub mod request;

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

use client::{CompletionClient, InvokeError};
use parse::ParseError;
use report::Report;
use request::DiagnosisRequest;

/// Post texts that short-circuit into the attribution banner.
pub const CREATOR_SIGNATURES: [&str; 2] = ["debug_creator", "author"];

const SIGNATURE_MESSAGE: &str = "👑 Developed by enjo-risk-lab - Original Code";

#[derive(Debug, Error)]
pub enum DiagnoseError {
    #[error("投稿テキストを入力してください。")]
    EmptyPost,
    #[error("年齢の値が不正です: {0}（0〜120で入力してください）")]
    InvalidAge(u8),
    #[error("model invocation failed: {0}")]
    Invoke(#[from] InvokeError),
    #[error("completion parse failed: {0}")]
    Parse(#[from] ParseError),
}

impl DiagnoseError {
    /// Validation failures are the user's to fix; the rest collapse to one
    /// generic message at the HTTP boundary.
    pub fn is_validation(&self) -> bool {
        matches!(self, DiagnoseError::EmptyPost | DiagnoseError::InvalidAge(_))
    }

    /// Stable label for metrics/logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagnoseError::EmptyPost | DiagnoseError::InvalidAge(_) => "validation",
            DiagnoseError::Invoke(_) => "invoke",
            DiagnoseError::Parse(_) => "parse",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureBanner {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosisOutcome {
    Report { report: Report },
    Signature { banner: SignatureBanner },
}

/// Run one submission end to end. At most one model call; zero for the
/// signature and validation short-circuits.
pub async fn run_diagnosis(
    req: &DiagnosisRequest,
    client: &dyn CompletionClient,
    config: &AppConfig,
) -> Result<DiagnosisOutcome, DiagnoseError> {
    // The signature check comes before validation: a padded sentinel is a
    // sentinel, an empty post is not.
    if let Some(banner) = signature_banner(&req.post_text) {
        info!(target: "diagnosis", "signature bypass hit");
        return Ok(DiagnosisOutcome::Signature { banner });
    }
    request::validate(req)?;

    let prompt = prompt::build_prompt(req, config.variant);

    let started = Instant::now();
    let completion = client.complete(&prompt).await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let raw = parse::parse_completion(&completion)?;
    let diagnosis = normalize::normalize(raw, config.variant);

    // Never log raw post text; hashed id only.
    info!(
        target: "diagnosis",
        id = %anon_hash(&req.post_text),
        model = client.model_id(),
        variant = config.variant.as_str(),
        elapsed_ms,
        completion_chars = completion.chars().count(),
        score = diagnosis.score,
        "diagnosis complete"
    );

    let report = report::render_report(&diagnosis, config.variant, &config.app_public_url);
    Ok(DiagnosisOutcome::Report { report })
}

fn signature_banner(post_text: &str) -> Option<SignatureBanner> {
    let trimmed = post_text.trim();
    if CREATOR_SIGNATURES.iter().any(|s| trimmed == *s) {
        return Some(SignatureBanner {
            message: SIGNATURE_MESSAGE.to_string(),
        });
    }
    None
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
