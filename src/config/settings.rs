//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::api::normalize_server_url;
use crate::narration::{Accent, SpeechSpeed};
use crate::story::segment::DEFAULT_MIN_CHARS;
use crate::story::{Genre, StoryLength};

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Connection settings for the story / frame generation server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Cached base URL of the generation server (e.g. an ngrok tunnel).
    ///
    /// `None` until the user connects once.  Without it the frame worker
    /// stays idle and story generation is unavailable.
    pub base_url: Option<String>,
    /// Maximum seconds to wait for `/generate_story`.
    pub story_timeout_secs: u64,
    /// Maximum seconds to wait for `/health`.
    pub health_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            story_timeout_secs: 300,
            health_timeout_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameEndpoint
// ---------------------------------------------------------------------------

/// Which image-generation route the server exposes.
///
/// Deployments differ: the Colab notebook serves `/generate_image`, the
/// hosted Flask backend serves `/generate_frame`.  Both speak the same JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FrameEndpoint {
    #[default]
    GenerateImage,
    GenerateFrame,
}

impl FrameEndpoint {
    /// URL path (with leading slash) for this endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            FrameEndpoint::GenerateImage => "/generate_image",
            FrameEndpoint::GenerateFrame => "/generate_frame",
        }
    }
}

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

/// Settings for the narration-synchronised frame pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Whether illustrative frames are generated at all.
    pub enabled: bool,
    /// Image-generation route on the server.
    pub endpoint: FrameEndpoint,
    /// Template wrapped around every prompt; `{prompt}` is replaced by the
    /// sanitised sentence.
    pub prompt_template: String,
    /// Upper bound on prompts (and therefore frames) per story.
    pub max_frames: usize,
    /// Sentences shorter than this (in characters, after sanitising) are
    /// dropped.
    pub min_sentence_chars: usize,
    /// Spread prompts across the whole story instead of taking the first
    /// `max_frames` sentences.
    pub spread_evenly: bool,
    /// Target presentation frame rate; the index commit delay is `1000 / fps` ms.
    pub fps: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries after the first attempt before a prompt is abandoned.
    pub max_retries: u32,
    /// Backoff base; retry *n* waits `base * 2^n`.
    pub backoff_base_ms: u64,
    /// Lower bound of the randomised pause between successful requests.
    pub inter_request_min_ms: u64,
    /// Upper bound of the randomised pause between successful requests.
    pub inter_request_max_ms: u64,
}

impl FrameConfig {
    /// Delay applied before committing a new displayed frame index.
    ///
    /// ```
    /// use story_frames::config::FrameConfig;
    /// use std::time::Duration;
    ///
    /// let cfg = FrameConfig { fps: 10, ..FrameConfig::default() };
    /// assert_eq!(cfg.commit_delay(), Duration::from_millis(100));
    /// ```
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: FrameEndpoint::default(),
            prompt_template: "Cinematic storybook illustration, family-friendly: {prompt}".into(),
            max_frames: 12,
            min_sentence_chars: DEFAULT_MIN_CHARS,
            spread_evenly: true,
            fps: 12,
            request_timeout_secs: 15,
            max_retries: 3,
            backoff_base_ms: 5_000,
            inter_request_min_ms: 5_000,
            inter_request_max_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// StoryConfig
// ---------------------------------------------------------------------------

/// Default story parameters used when the command line does not override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    pub genre: Genre,
    pub length: StoryLength,
}

// ---------------------------------------------------------------------------
// NarrationConfig
// ---------------------------------------------------------------------------

/// Settings for the simulated narration clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Speaking speed preset.
    pub speed: SpeechSpeed,
    /// Narrator accent.
    #[serde(default)]
    pub accent: Accent,
    /// Speaking rate at `SpeechSpeed::Normal`.
    pub words_per_minute: u32,
    /// How often the playback position is published, in milliseconds.
    pub tick_ms: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            speed: SpeechSpeed::default(),
            accent: Accent::default(),
            words_per_minute: 150,
            tick_ms: 250,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use story_frames::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation server connection.
    pub server: ServerConfig,
    /// Frame pipeline settings.
    pub frames: FrameConfig,
    /// Default story parameters.
    pub story: StoryConfig,
    /// Narration clock settings.
    pub narration: NarrationConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Normalise `url` and cache it as the server base URL.
    ///
    /// Returns the stored value, or `None` (leaving the config untouched)
    /// when `url` is blank.
    pub fn remember_server_url(&mut self, url: &str) -> Option<&str> {
        let normalized = normalize_server_url(url)?;
        self.server.base_url = Some(normalized);
        self.server.base_url.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
