//! HTTP clients for the story generation server.
//!
//! This module provides:
//! * [`StoryClient`] — `/health` and `/generate_story`.
//! * [`FrameGenerator`] — async trait implemented by all image backends.
//! * [`HttpFrameGenerator`] — `/generate_image` (or `/generate_frame`) backend.
//! * [`Frame`] / [`FrameError`] — one generated image and the error taxonomy
//!   the frame worker retries on.
//! * [`normalize_server_url`] — cleans up pasted server URLs.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use story_frames::api::{FrameGenerator, HttpFrameGenerator};
//! use story_frames::config::FrameConfig;
//! use story_frames::story::Prompt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let gen = HttpFrameGenerator::from_config("http://localhost:5000", &FrameConfig::default());
//!     match gen.generate(&Prompt::new("A red kite above the dunes.")).await {
//!         Ok(frame) => println!("got {} bytes of image uri", frame.image.len()),
//!         Err(e) => eprintln!("frame failed: {e}"),
//!     }
//! }
//! ```

pub mod client;
pub mod frames;
pub mod url;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiError, HealthStatus, Story, StoryClient};
pub use frames::{parse_frame_response, Frame, FrameError, FrameGenerator, HttpFrameGenerator};
pub use url::normalize_server_url;
