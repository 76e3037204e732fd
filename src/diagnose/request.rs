// src/diagnose/request.rs
//! Submission payload: the post under diagnosis plus optional author
//! metadata. Wire field values for the author category are the Japanese
//! labels the form shows, so the page posts what it displays.

use serde::{Deserialize, Serialize};

use super::DiagnoseError;

/// Upper bound for the optional author age.
pub const MAX_AUTHOR_AGE: u8 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthorCategory {
    #[default]
    #[serde(rename = "一般人")]
    General,
    #[serde(rename = "インフルエンサー")]
    Influencer,
    #[serde(rename = "公式垢")]
    OfficialAccount,
    #[serde(rename = "おじさん構文")]
    OjisanStyle,
    #[serde(rename = "就活生")]
    JobSeeker,
}

impl AuthorCategory {
    /// Label as embedded into the prompt (same as the wire value).
    pub fn label(&self) -> &'static str {
        match self {
            AuthorCategory::General => "一般人",
            AuthorCategory::Influencer => "インフルエンサー",
            AuthorCategory::OfficialAccount => "公式垢",
            AuthorCategory::OjisanStyle => "おじさん構文",
            AuthorCategory::JobSeeker => "就活生",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub post_text: String,
    #[serde(default)]
    pub author_category: AuthorCategory,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub has_history: bool,
    /// Optional author age; embedded into the extended prompt only.
    #[serde(default)]
    pub age: Option<u8>,
}

/// Field checks that run after the signature short-circuit and before any
/// model call. A whitespace-only post counts as empty.
pub fn validate(req: &DiagnosisRequest) -> Result<(), DiagnoseError> {
    if req.post_text.trim().is_empty() {
        return Err(DiagnoseError::EmptyPost);
    }
    if let Some(age) = req.age {
        if age > MAX_AUTHOR_AGE {
            return Err(DiagnoseError::InvalidAge(age));
        }
    }
    Ok(())
}
