//! Story text handling.
//!
//! This module provides:
//! * [`PromptSegmenter`] — story text → ordered, bounded frame prompts.
//! * [`Prompt`] / [`PromptTemplate`] — a sanitised sentence and the styling
//!   template wrapped around it for the image service.
//! * [`StoryRequest`], [`Genre`], [`StoryLength`] — the `/generate_story`
//!   request body and its parameters.
//! * [`encode_image_file`] — downscale, JPEG re-encode and base64 an upload.
//! * [`format_story`] — paragraph layout for display.
//!
//! # Quick start
//!
//! ```rust
//! use story_frames::story::{PromptSegmenter, PromptTemplate};
//!
//! let story = "The lantern flickered in the attic window. \
//!              Far below, a boat slipped away from the pier.";
//! let prompts = PromptSegmenter::new(8, 20, true).segment(story);
//! let template = PromptTemplate::new("Cinematic illustration: {prompt}");
//!
//! for prompt in &prompts {
//!     println!("{}", template.render(prompt));
//! }
//! assert_eq!(prompts.len(), 2);
//! ```

pub mod format;
pub mod prompt;
pub mod request;
pub mod segment;
pub mod upload;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use format::format_story;
pub use prompt::{Prompt, PromptTemplate};
pub use request::{strip_data_uri, Genre, StoryError, StoryLength, StoryRequest};
pub use segment::PromptSegmenter;
pub use upload::{encode_image_file, prepare_image};
