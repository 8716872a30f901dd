//! Story service client: `/health` and `/generate_story`.
//!
//! [`StoryClient`] talks to the same server that hosts the frame generator.
//! All connection details come from [`ServerConfig`]; nothing is hardcoded.
//! Response bodies are decoded by the pure `parse_*` functions so the error
//! mapping can be tested without a live server.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::api::url::join_route;
use crate::config::ServerConfig;
use crate::story::StoryRequest;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the story / health endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No server URL has been configured yet.
    #[error("no server URL configured; run `story-frames connect <URL>` first")]
    NotConfigured,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse server response: {0}")]
    Parse(String),

    /// The server reported `success: false`.
    #[error("story generation failed: {0}")]
    Service(String),

    /// `/health` answered but did not report `healthy`.
    #[error("server is not healthy (status: {0})")]
    Unhealthy(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Decoded `/health` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub gpu_available: Option<bool>,
    #[serde(default)]
    pub service: Option<String>,
    /// Per-backend availability, e.g. `{"gemini": true, "stability": {"status": true}}`.
    #[serde(default)]
    pub services: Option<serde_json::Value>,
}

impl HealthStatus {
    /// Names of the backends listed in `services` that report themselves
    /// available, either as `true` or as an object with `"status": true`.
    pub fn available_services(&self) -> Vec<String> {
        let Some(serde_json::Value::Object(map)) = &self.services else {
            return Vec::new();
        };
        map.iter()
            .filter(|(_, v)| match v {
                serde_json::Value::Bool(up) => *up,
                serde_json::Value::Object(o) => o.get("status").and_then(|s| s.as_bool()) == Some(true),
                _ => false,
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// A generated story.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub text: String,
    /// Pre-rendered narration, when the server produced one.
    pub audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    story: Option<String>,
    #[serde(default, rename = "audioUrl")]
    audio_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// StoryClient
// ---------------------------------------------------------------------------

/// HTTP client for the story generation server.
#[derive(Debug, Clone)]
pub struct StoryClient {
    client: reqwest::Client,
    base_url: String,
    story_timeout: Duration,
    health_timeout: Duration,
}

impl StoryClient {
    /// Build a client from config; fails with [`ApiError::NotConfigured`]
    /// when no base URL is cached.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.clone().ok_or(ApiError::NotConfigured)?;
        Ok(Self::new(
            base_url,
            Duration::from_secs(config.story_timeout_secs),
            Duration::from_secs(config.health_timeout_secs),
        ))
    }

    pub fn new(base_url: String, story_timeout: Duration, health_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            story_timeout,
            health_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`; succeeds only when the server reports `healthy`.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = join_route(&self.base_url, "/health");
        log::debug!("story: GET {url}");

        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_health_response(status, &body)
    }

    /// `POST /generate_story`.
    pub async fn generate_story(&self, request: &StoryRequest) -> Result<Story, ApiError> {
        let url = join_route(&self.base_url, "/generate_story");
        log::info!(
            "story: requesting {} {}-word story from {} image(s)",
            request.genre,
            request.length.words(),
            request.images.len()
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.story_timeout)
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_story_response(status, &body)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

/// Map a `/health` status + body to a result.
pub fn parse_health_response(status: u16, body: &str) -> Result<HealthStatus, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Http {
            status,
            message: error_message(body),
        });
    }
    let health: HealthStatus =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    if health.status != "healthy" {
        return Err(ApiError::Unhealthy(health.status));
    }
    Ok(health)
}

/// Map a `/generate_story` status + body to a result.
pub fn parse_story_response(status: u16, body: &str) -> Result<Story, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Http {
            status,
            message: error_message(body),
        });
    }
    let parsed: StoryResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;

    match (parsed.success, parsed.story) {
        (true, Some(text)) if !text.trim().is_empty() => Ok(Story {
            text,
            audio_url: parsed.audio_url,
        }),
        (true, _) => Err(ApiError::Parse("response contained no story".into())),
        (false, _) => Err(ApiError::Service(
            parsed
                .error
                .unwrap_or_else(|| "Failed to generate story".into()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
