//! Frame prompts and the template that wraps them for the image service.
//!
//! A [`Prompt`] is one sanitised sentence of the story.  The image service
//! never sees the bare sentence: [`PromptTemplate::render`] embeds it in a
//! styling instruction so every frame comes back in the same illustrative
//! look.

use std::fmt;

/// Placeholder replaced by the sentence in a template string.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// An immutable, sanitised sentence used as input to one frame request.
///
/// Only the [`PromptSegmenter`](crate::story::PromptSegmenter) creates
/// prompts from story text; tests and callers with pre-cleaned text can use
/// [`Prompt::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// PromptTemplate
// ---------------------------------------------------------------------------

/// Fixed styling template applied to every prompt before it is sent.
///
/// # Example
/// ```rust
/// use story_frames::story::{Prompt, PromptTemplate};
///
/// let template = PromptTemplate::new("Watercolour scene: {prompt}");
/// let rendered = template.render(&Prompt::new("A fox crossed the frozen river."));
/// assert_eq!(rendered, "Watercolour scene: A fox crossed the frozen river.");
/// ```
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template.  A template without `{prompt}` gets the sentence
    /// appended after a single space.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, prompt: &Prompt) -> String {
        if self.template.contains(PROMPT_PLACEHOLDER) {
            self.template.replace(PROMPT_PLACEHOLDER, prompt.as_str())
        } else if self.template.trim().is_empty() {
            prompt.as_str().to_string()
        } else {
            format!("{} {}", self.template.trim_end(), prompt.as_str())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
