// src/diagnose/parse.rs
//! Completion decoding: fence stripping plus a loose serde mirror of the
//! schema the prompt pins.
//!
//! `total_score` and the ratings decode as raw `serde_json::Value`; integer
//! coercion and clamping belong to `normalize`. Missing keys default instead
//! of failing, so a partially conforming completion still renders. Only
//! undecodable JSON is an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model returned undecodable JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDiagnosis {
    #[serde(default)]
    pub total_score: Value,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub critiques: RawCritiques,
    #[serde(default)]
    pub regional_analysis: Vec<RawRegion>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCritiques {
    #[serde(default)]
    pub class_rep: RawCritique,
    #[serde(default)]
    pub kyoto_okami: RawCritique,
    #[serde(default)]
    pub reply_ojisan: RawCritique,
    #[serde(default)]
    pub doxing_team: RawCritique,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCritique {
    #[serde(default)]
    pub rating: Value,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRegion {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub risk_score: Value,
    #[serde(default)]
    pub reason: String,
}

/// Strip the Markdown code fence Gemini adds despite being told not to.
/// Only the `json`-tagged opener is recognized; the two checks are
/// independent, matching the observed completions.
pub fn strip_code_fence(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```json") {
        t = rest;
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t
}

/// Decode one completion into the loose document shape.
pub fn parse_completion(text: &str) -> Result<RawDiagnosis, ParseError> {
    Ok(serde_json::from_str(strip_code_fence(text))?)
}
