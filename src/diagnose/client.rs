// src/diagnose/client.rs
//! Completion client: the narrow seam between the pipeline and the hosted
//! model. Production uses `GeminiClient`; tests inject `ScriptedClient`.
//! One submission makes at most one call here. No retries, no streaming.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;

const USER_AGENT: &str = "enjo-risk-analyzer/0.1";

/// Model invocation failures. All of them collapse to the same generic user
/// message at the HTTP boundary; the variants only feed the diagnostic
/// detail.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("malformed API response: {0}")]
    BadResponse(String),
    #[error("no candidate text in response")]
    EmptyCompletion,
}

/// Trait object used by the pipeline and tests.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one prompt, return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, InvokeError>;
    /// Model name for diagnostics/logs.
    fn model_id(&self) -> &str;
}

/// Convenient alias used by callers.
pub type DynCompletionClient = Arc<dyn CompletionClient>;

/// Factory: build the client for the configured model.
///
/// `AI_TEST_MODE=mock` swaps in a deterministic scripted client so the
/// service can run end-to-end without touching the network.
pub fn build_completion_client(config: &AppConfig) -> DynCompletionClient {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(ScriptedClient::replying(MOCK_COMPLETION));
    }
    Arc::new(GeminiClient::from_config(config))
}

// ------------------------------------------------------------
// Real provider
// ------------------------------------------------------------

/// Calls the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl GeminiClient {
    pub fn from_config(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, InvokeError> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            contents: Vec<Content<'a>>,
        }
        #[derive(Deserialize, Default)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }
        #[derive(Deserialize, Default)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }
        #[derive(Deserialize, Default)]
        struct Candidate {
            #[serde(default)]
            content: CandidateContent,
        }
        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        debug!(target: "diagnosis", model = %self.model, "calling generateContent");

        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(target: "diagnosis", status = status.as_u16(), "generateContent failed");
            return Err(InvokeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| InvokeError::BadResponse(e.to_string()))?;

        let text = data
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(InvokeError::EmptyCompletion);
        }
        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ------------------------------------------------------------
// Scripted client (tests, AI_TEST_MODE=mock)
// ------------------------------------------------------------

/// Deterministic in-process client. Replies with a fixed completion or a
/// scripted failure and counts invocations, so tests can assert that the
/// short-circuit paths never reach the model.
pub struct ScriptedClient {
    script: Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn replying(completion: &str) -> Self {
        Self {
            script: Ok(completion.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            script: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _prompt: &str) -> Result<String, InvokeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(InvokeError::Api {
                status: 503,
                message: message.clone(),
            }),
        }
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Canned completion used by `AI_TEST_MODE=mock`. Valid for both variants
/// (the base normalizer ignores the extended keys).
pub const MOCK_COMPLETION: &str = r#"{
    "total_score": 42,
    "detected_language": "日本語",
    "critiques": {
        "class_rep": { "rating": 2, "comment": "表現は概ね良識的ですが、断定口調が気になります。" },
        "kyoto_okami": { "rating": 3, "comment": "ようまあ、そんな堂々と言わはりますなあ。" },
        "reply_ojisan": { "rating": 2, "comment": "FF外から失礼します。私の経験では逆ですね。" },
        "doxing_team": { "rating": 1, "comment": "位置情報に繋がる要素は見当たりません。" }
    },
    "regional_analysis": [
        { "region": "Japan", "risk_score": 45, "reason": "国内では軽い反発を招く可能性があります。" },
        { "region": "Asia", "risk_score": 30, "reason": "文化的な摩擦は限定的です。" },
        { "region": "Americas", "risk_score": 20, "reason": "文脈が伝わりにくく話題になりにくいです。" },
        { "region": "Europe", "risk_score": 20, "reason": "関心を集める要素が少ないです。" },
        { "region": "Global", "risk_score": 25, "reason": "拡散の起点になる要素は弱いです。" }
    ],
    "summary": "断定口調を和らげれば大きな炎上には至らないでしょう。"
}"#;
