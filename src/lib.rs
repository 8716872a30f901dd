//! Story frames: narrated stories with generated illustrations.
//!
//! Talks to a story generation server, turns the story into frame prompts,
//! fetches one illustration per prompt in the background and keeps the
//! displayed frame in step with a narration clock.
//!
//! * [`config`]: settings and platform paths.
//! * [`api`]: HTTP clients for the story and frame endpoints.
//! * [`story`]: prompt segmentation and story request types.
//! * [`frames`]: fetch worker, pipeline controller and playback mapping.
//! * [`narration`]: simulated narration clock.

pub mod api;
pub mod config;
pub mod frames;
pub mod narration;
pub mod story;
