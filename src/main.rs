//! Flame-War Risk Diagnosis Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring config, the model client, and routes.
//!
//! See `README.md` for quickstart.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use enjo_risk_analyzer::api::{create_router, AppState};
use enjo_risk_analyzer::config::AppConfig;
use enjo_risk_analyzer::diagnose::client::build_completion_client;
use enjo_risk_analyzer::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - DIAGNOSIS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("DIAGNOSIS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diagnosis=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // Refuses to boot without a credential; the error text is the setup
    // instruction shown to the operator.
    let config = AppConfig::from_env().map_err(anyhow::Error::new)?;

    let metrics = Metrics::init(config.variant);
    let client = build_completion_client(&config);
    let state = AppState::new(config, client);

    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
