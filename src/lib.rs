// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod diagnose;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState, GENERIC_FAILURE_MESSAGE};
pub use crate::config::{AppConfig, ConfigError, DiagnosisVariant};
pub use crate::diagnose::client::{
    build_completion_client, CompletionClient, DynCompletionClient, GeminiClient, InvokeError,
    ScriptedClient, MOCK_COMPLETION,
};
pub use crate::diagnose::normalize::{normalize, Diagnosis};
pub use crate::diagnose::parse::{parse_completion, strip_code_fence, ParseError, RawDiagnosis};
pub use crate::diagnose::prompt::build_prompt;
pub use crate::diagnose::report::{render_report, GaugeColor, Persona, Report};
pub use crate::diagnose::request::{AuthorCategory, DiagnosisRequest};
pub use crate::metrics::Metrics;
pub use crate::diagnose::{
    run_diagnosis, DiagnoseError, DiagnosisOutcome, SignatureBanner, CREATOR_SIGNATURES,
};
