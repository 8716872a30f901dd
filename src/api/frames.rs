//! Core `FrameGenerator` trait and `HttpFrameGenerator` implementation.
//!
//! `HttpFrameGenerator` posts one templated prompt to the server's
//! image-generation route (`/generate_image` or `/generate_frame`) and
//! classifies the reply into a [`Frame`] or a [`FrameError`].  The
//! classification is what drives the worker's retry policy, so rate limits
//! and the "disable stop motion" kill switch are first-class variants rather
//! than generic failures.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;

use crate::api::url::join_route;
use crate::config::FrameConfig;
use crate::story::{Prompt, PromptTemplate};

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One generated image: a `data:` URI or a remote URL, treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub image: String,
}

impl Frame {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }

    pub fn is_data_uri(&self) -> bool {
        self.image.starts_with("data:")
    }

    /// Decode a base64 `data:` URI into raw image bytes.
    ///
    /// Returns `None` for remote URLs and malformed payloads.
    pub fn decode_data_uri(&self) -> Option<Vec<u8>> {
        let rest = self.image.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        if !meta.ends_with(";base64") {
            return None;
        }
        STANDARD.decode(payload.trim()).ok()
    }

    /// File extension guessed from the data-URI media type.
    pub fn extension(&self) -> &'static str {
        if self.image.starts_with("data:image/jpeg") {
            "jpg"
        } else if self.image.starts_with("data:image/webp") {
            "webp"
        } else {
            "png"
        }
    }
}

// ---------------------------------------------------------------------------
// FrameError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating one frame.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("frame request timed out")]
    Timeout,

    /// Non-success HTTP status other than 429.
    #[error("server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// HTTP 429 or an explicit quota payload.
    #[error("rate limited by frame service")]
    RateLimited { retry_after: Option<Duration> },

    /// The server asked clients to stop requesting frames altogether.
    #[error("frame generation disabled by server: {0}")]
    Disabled(String),

    /// `success: false` without a recognised reason, or no image data.
    #[error("malformed frame response: {0}")]
    Malformed(String),
}

impl FrameError {
    /// `false` only for the terminal kill switch.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FrameError::Disabled(_))
    }
}

impl From<reqwest::Error> for FrameError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FrameError::Timeout
        } else {
            FrameError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// FrameGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for prompt → image generation.
///
/// Implementors must be `Send + Sync` so they can be shared with the worker
/// task behind an `Arc<dyn FrameGenerator>`.
#[async_trait]
pub trait FrameGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<Frame, FrameError>;
}

// ---------------------------------------------------------------------------
// HttpFrameGenerator
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FrameResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
    #[serde(default)]
    disable_stop_motion: bool,
}

/// Calls `POST {base_url}/generate_image` (or `/generate_frame`).
pub struct HttpFrameGenerator {
    client: reqwest::Client,
    url: String,
    template: PromptTemplate,
}

impl HttpFrameGenerator {
    /// Build a generator for `base_url` using the endpoint, template and
    /// per-request timeout from `config`.
    pub fn from_config(base_url: &str, config: &FrameConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: join_route(base_url, config.endpoint.path()),
            template: PromptTemplate::new(config.prompt_template.clone()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FrameGenerator for HttpFrameGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Frame, FrameError> {
        let body = serde_json::json!({ "prompt": self.template.render(prompt) });

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        parse_frame_response(status, &text)
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Shortest wait accepted from a server `retry_after`.  Hints do not use up
/// retries, so a server answering `0` forever must not cause a busy loop.
pub const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);
/// Longest wait accepted from a server `retry_after`.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(600);

/// Server hint in seconds, clamped to `[MIN_RETRY_AFTER, MAX_RETRY_AFTER]`.
/// Negative values are ignored.
fn seconds(value: f64) -> Option<Duration> {
    if !(value >= 0.0) {
        return None;
    }
    let secs = value.clamp(MIN_RETRY_AFTER.as_secs_f64(), MAX_RETRY_AFTER.as_secs_f64());
    Some(Duration::from_secs_f64(secs))
}

/// Map an image-service status + body onto the error taxonomy.
///
/// Precedence: kill switch, then 429, then other HTTP errors, then payload
/// content.
pub fn parse_frame_response(status: u16, body: &str) -> Result<Frame, FrameError> {
    let parsed = serde_json::from_str::<FrameResponse>(body).ok();

    if let Some(resp) = &parsed {
        if resp.disable_stop_motion {
            return Err(FrameError::Disabled(
                resp.error
                    .clone()
                    .unwrap_or_else(|| "stop motion disabled".into()),
            ));
        }
    }

    if status == 429 {
        let retry_after = parsed
            .as_ref()
            .and_then(|r| r.retry_after)
            .and_then(seconds);
        return Err(FrameError::RateLimited { retry_after });
    }

    if !(200..300).contains(&status) {
        let message = parsed
            .and_then(|r| r.error)
            .unwrap_or_else(|| body.trim().chars().take(200).collect());
        return Err(FrameError::Http { status, message });
    }

    let resp = parsed.ok_or_else(|| FrameError::Malformed("response is not JSON".into()))?;

    match resp.image {
        Some(image) if resp.success && !image.trim().is_empty() => Ok(Frame::new(image)),
        _ => {
            if let Some(retry_after) = resp.retry_after {
                return Err(FrameError::RateLimited {
                    retry_after: seconds(retry_after),
                });
            }
            Err(FrameError::Malformed(
                resp.error.unwrap_or_else(|| "no image in response".into()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
