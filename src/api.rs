use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::warn;

use crate::config::AppConfig;
use crate::diagnose::client::DynCompletionClient;
use crate::diagnose::request::DiagnosisRequest;
use crate::diagnose::{self, DiagnoseError, DiagnosisOutcome};

/// The one message users see for invocation and parse failures alike. The
/// specific cause travels in the collapsed `detail` field.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "エラーが発生しました。しばらく待ってから再度お試しください。";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: DynCompletionClient,
}

impl AppState {
    pub fn new(config: AppConfig, client: DynCompletionClient) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/diagnose", post(diagnose))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct DiagnoseResp {
    #[serde(flatten)]
    outcome: DiagnosisOutcome,
    latency_ms: u64,
}

async fn diagnose(
    State(state): State<AppState>,
    Json(body): Json<DiagnosisRequest>,
) -> Result<Json<DiagnoseResp>, ApiError> {
    counter!("diagnoses_total").increment(1);
    let started = Instant::now();

    match diagnose::run_diagnosis(&body, state.client.as_ref(), &state.config).await {
        Ok(outcome) => {
            if matches!(outcome, DiagnosisOutcome::Signature { .. }) {
                counter!("signature_hits_total").increment(1);
            }
            Ok(Json(DiagnoseResp {
                outcome,
                latency_ms: started.elapsed().as_millis() as u64,
            }))
        }
        Err(err) => {
            counter!("diagnose_failures_total", "kind" => err.kind()).increment(1);
            Err(ApiError::from(err))
        }
    }
}

#[derive(Debug)]
enum ApiError {
    /// Recoverable input problems; the message itself is user-facing.
    Validation(String),
    /// Invocation/parse failures: generic message plus collapsed detail.
    Upstream { detail: String },
}

impl From<DiagnoseError> for ApiError {
    fn from(err: DiagnoseError) -> Self {
        if err.is_validation() {
            return ApiError::Validation(err.to_string());
        }
        warn!(target: "diagnosis", kind = err.kind(), detail = %err, "diagnosis failed");
        ApiError::Upstream {
            detail: err.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: message,
                    detail: None,
                },
            ),
            ApiError::Upstream { detail } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: GENERIC_FAILURE_MESSAGE.to_string(),
                    detail: Some(detail),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
