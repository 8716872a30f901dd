//! Headless narration playback.
//!
//! There is no speech engine here; [`NarrationClock`] simulates the playback
//! position of a story read aloud at [`SpeechSpeed`] in an [`Accent`], and [`spawn_ticker`]
//! publishes that position for the frame clock to follow.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use story_frames::narration::{estimate_duration, spawn_ticker, NarrationClock, SpeechSpeed};
//!
//! #[tokio::main]
//! async fn main() {
//!     let text = "Once upon a time a small dragon learned to fly.";
//!     let clock = NarrationClock::new(estimate_duration(text, 150, SpeechSpeed::Normal));
//!     let clock = Arc::new(Mutex::new(clock));
//!     clock.lock().unwrap().play();
//!
//!     let (mut rx, _task) = spawn_ticker(clock, Duration::from_millis(250));
//!     while rx.changed().await.is_ok() {
//!         println!("at {:.2}s", *rx.borrow());
//!     }
//! }
//! ```

pub mod clock;
pub mod speed;
pub mod voice;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use clock::{spawn_ticker, NarrationClock};
pub use speed::{estimate_duration, SpeechSpeed};
pub use voice::Accent;
