// src/diagnose/normalize.rs
//! Score normalization: deterministic repair of whatever the model sent.
//!
//! The model is told to emit integers in fixed ranges; it does not always
//! comply. Everything numeric is coerced and clamped here so the renderer
//! can trust its input. The two variants normalize differently and are kept
//! as separate paths on purpose:
//!
//! * Base: `total_score` is used directly (default 0), clamped to 0–100;
//!   ratings pass through as coerced and are clamped at star rendering.
//! * Extended: ratings are clamped to 0–5 here, a rating-based score is
//!   derived, and the final score is `max(clamped total, rating-based)`.
//!   The maximum always wins, even when the model's total contradicts its
//!   own ratings.

use serde::Serialize;
use serde_json::Value;

use crate::config::DiagnosisVariant;

use super::parse::{RawCritique, RawCritiques, RawDiagnosis, RawRegion};

/// Normalized diagnosis, safe to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    /// Final flame-war risk, 0–100.
    pub score: u8,
    pub detected_language: Option<String>,
    pub critiques: PersonaCritiques,
    pub regional: Vec<RegionRisk>,
    pub summary: String,
    /// Derived from the four clamped ratings; `None` in the base variant.
    pub rating_based_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaCritiques {
    pub class_rep: PersonaCritique,
    pub kyoto_okami: PersonaCritique,
    pub reply_ojisan: PersonaCritique,
    pub doxing_team: PersonaCritique,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaCritique {
    pub rating: i64,
    /// `None` when the model omitted the comment; display decides the
    /// placeholder, the share text quotes it as empty.
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRisk {
    pub region: String,
    pub risk_score: u8,
    pub reason: String,
}

/// Normalize one decoded completion under the configured variant.
pub fn normalize(raw: RawDiagnosis, variant: DiagnosisVariant) -> Diagnosis {
    match variant {
        DiagnosisVariant::Base => normalize_base(raw),
        DiagnosisVariant::Extended => normalize_extended(raw),
    }
}

fn normalize_base(raw: RawDiagnosis) -> Diagnosis {
    let score = clamp_score(coerce_int(&raw.total_score).unwrap_or(0));
    Diagnosis {
        score,
        // The base schema never asks for these; drop them even if volunteered.
        detected_language: None,
        critiques: PersonaCritiques {
            class_rep: critique_as_coerced(raw.critiques.class_rep),
            kyoto_okami: critique_as_coerced(raw.critiques.kyoto_okami),
            reply_ojisan: critique_as_coerced(raw.critiques.reply_ojisan),
            doxing_team: critique_as_coerced(raw.critiques.doxing_team),
        },
        regional: Vec::new(),
        summary: raw.summary,
        rating_based_score: None,
    }
}

fn normalize_extended(raw: RawDiagnosis) -> Diagnosis {
    let critiques = PersonaCritiques {
        class_rep: critique_clamped(raw.critiques.class_rep),
        kyoto_okami: critique_clamped(raw.critiques.kyoto_okami),
        reply_ojisan: critique_clamped(raw.critiques.reply_ojisan),
        doxing_team: critique_clamped(raw.critiques.doxing_team),
    };

    let rating_based = rating_based_score([
        critiques.class_rep.rating,
        critiques.kyoto_okami.rating,
        critiques.reply_ojisan.rating,
        critiques.doxing_team.rating,
    ]);

    let total = match coerce_int(&raw.total_score) {
        Some(t) => clamp_score(t),
        None => rating_based,
    };
    let score = total.max(rating_based);

    let regional = raw
        .regional_analysis
        .into_iter()
        .map(|r: RawRegion| RegionRisk {
            region: r.region,
            risk_score: clamp_score(coerce_int(&r.risk_score).unwrap_or(0)),
            reason: r.reason,
        })
        .collect();

    Diagnosis {
        score,
        detected_language: raw.detected_language,
        critiques,
        regional,
        summary: raw.summary,
        rating_based_score: Some(rating_based),
    }
}

/// Mean of the four ratings projected onto 0–100.
fn rating_based_score(ratings: [i64; 4]) -> u8 {
    let sum: i64 = ratings.iter().sum();
    ((sum as f64 / 4.0) * 20.0).round() as u8
}

fn critique_as_coerced(raw: RawCritique) -> PersonaCritique {
    PersonaCritique {
        rating: coerce_int(&raw.rating).unwrap_or(0),
        comment: raw.comment,
    }
}

fn critique_clamped(raw: RawCritique) -> PersonaCritique {
    PersonaCritique {
        rating: coerce_int(&raw.rating).unwrap_or(0).clamp(0, 5),
        comment: raw.comment,
    }
}

/// Integer coercion: integers pass, floats truncate toward zero, numeric
/// strings parse; everything else fails.
fn coerce_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn clamp_score(x: i64) -> u8 {
    x.clamp(0, 100) as u8
}

/// Loosen a normalized diagnosis back into the decoded shape. Lets callers
/// re-run `normalize` over an already-normalized value (a no-op) and feeds
/// the idempotence tests.
impl From<&Diagnosis> for RawDiagnosis {
    fn from(d: &Diagnosis) -> Self {
        fn raw_critique(c: &PersonaCritique) -> RawCritique {
            RawCritique {
                rating: Value::from(c.rating),
                comment: c.comment.clone(),
            }
        }
        RawDiagnosis {
            total_score: Value::from(d.score),
            detected_language: d.detected_language.clone(),
            critiques: RawCritiques {
                class_rep: raw_critique(&d.critiques.class_rep),
                kyoto_okami: raw_critique(&d.critiques.kyoto_okami),
                reply_ojisan: raw_critique(&d.critiques.reply_ojisan),
                doxing_team: raw_critique(&d.critiques.doxing_team),
            },
            regional_analysis: d
                .regional
                .iter()
                .map(|r| RawRegion {
                    region: r.region.clone(),
                    risk_score: Value::from(r.risk_score),
                    reason: r.reason.clone(),
                })
                .collect(),
            summary: d.summary.clone(),
        }
    }
}
