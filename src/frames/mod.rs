//! Frame generation pipeline and playback synchronisation.
//!
//! This module provides:
//! * [`FramePipeline`] — session controller: segments a story, resets the
//!   shared state and spawns the fetch worker.
//! * [`FrameWorker`] — drains the prompt queue one request at a time with
//!   backoff, abandonment and a service-side kill switch.
//! * [`RetryPolicy`] — how long to wait and when to give up.
//! * [`FrameClock`] — debounced mapping from narration position to the
//!   displayed frame slot.
//! * [`FrameState`] / [`SharedFrames`] — the single source of truth for one
//!   session, shared as `Arc<Mutex<…>>`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use story_frames::config::AppConfig;
//! use story_frames::frames::{FrameClock, FramePipeline};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let mut pipeline = FramePipeline::from_config(&config);
//!     pipeline.set_story("The kite climbed above the dunes. The wind carried it toward the sea.");
//!
//!     let mut clock = FrameClock::new(pipeline.state(), config.frames.commit_delay());
//!     clock.on_time_update(3.0, 10.0);
//!
//!     pipeline.join().await;
//!     println!("{:?}", pipeline.state().lock().unwrap().view());
//! }
//! ```

pub mod clock;
pub mod debounce;
pub mod pipeline;
pub mod policy;
pub mod state;
pub mod worker;

#[cfg(test)]
pub mod testing;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use clock::{displayed_slot, frame_index, resolve_slot, FrameClock};
pub use debounce::Debouncer;
pub use pipeline::FramePipeline;
pub use policy::{FailureAction, RetryPolicy};
pub use state::{
    new_shared_frames, FrameSlot, FrameState, FrameStatus, FrameView, QueuedPrompt, SharedFrames,
    WorkerState,
};
pub use worker::FrameWorker;
