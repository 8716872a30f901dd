//! Prompt segmenter: story text → ordered, bounded list of frame prompts.
//!
//! Steps, in order:
//!
//! 1. Split into sentences ending in `.`, `!` or `?`.  Text with no terminal
//!    punctuation at all is treated as one sentence; a trailing fragment
//!    after the last terminal mark is dropped.
//! 2. Sanitise: remove every character that is not an ASCII word character
//!    (`[A-Za-z0-9_]`), whitespace or `.`, then trim.
//! 3. Drop sentences shorter than `min_chars` characters.
//! 4. Select at most `max_frames`, either the first ones or (with
//!    `spread_evenly`) every `stride`-th one where
//!    `stride = max(1, count / max_frames)`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::FrameConfig;
use crate::story::prompt::Prompt;

static RE_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]+").unwrap());
// `[:word:]` is ASCII-only; accented letters are stripped like punctuation.
static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^[:word:]\s.]").unwrap());

/// Default minimum prompt length in characters.
pub const DEFAULT_MIN_CHARS: usize = 20;

// ---------------------------------------------------------------------------
// PromptSegmenter
// ---------------------------------------------------------------------------

/// Pure, deterministic splitter from story text to frame prompts.
///
/// # Example
/// ```rust
/// use story_frames::story::PromptSegmenter;
///
/// let segmenter = PromptSegmenter::new(4, 20, true);
/// let prompts = segmenter.segment("Ok. The dragon woke beneath the mountain! Who dares enter my hall?");
/// assert_eq!(prompts.len(), 2);
/// assert_eq!(prompts[0].as_str(), "The dragon woke beneath the mountain");
/// ```
#[derive(Debug, Clone)]
pub struct PromptSegmenter {
    max_frames: usize,
    min_chars: usize,
    spread_evenly: bool,
}

impl PromptSegmenter {
    pub fn new(max_frames: usize, min_chars: usize, spread_evenly: bool) -> Self {
        Self {
            max_frames,
            min_chars,
            spread_evenly,
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(
            config.max_frames,
            config.min_sentence_chars,
            config.spread_evenly,
        )
    }

    /// Produce the ordered prompt list for `text`.
    pub fn segment(&self, text: &str) -> Vec<Prompt> {
        if self.max_frames == 0 {
            return Vec::new();
        }

        let candidates: Vec<String> = split_sentences(text)
            .into_iter()
            .map(sanitize)
            .filter(|s| s.chars().count() >= self.min_chars)
            .collect();

        let stride = if self.spread_evenly && candidates.len() > self.max_frames {
            (candidates.len() / self.max_frames).max(1)
        } else {
            1
        };

        candidates
            .into_iter()
            .step_by(stride)
            .take(self.max_frames)
            .map(Prompt::new)
            .collect()
    }
}

impl Default for PromptSegmenter {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split on terminal punctuation, keeping the marks with their sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let sentences: Vec<&str> = RE_SENTENCE.find_iter(text).map(|m| m.as_str()).collect();
    if sentences.is_empty() && !text.trim().is_empty() {
        vec![text]
    } else {
        sentences
    }
}

/// Strip everything except ASCII word characters, whitespace and periods;
/// trim.
pub fn sanitize(sentence: &str) -> String {
    RE_DISALLOWED.replace_all(sentence, "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn long_sentence(i: usize) -> String {
        format!("Sentence number {i} describes a quiet forest scene. ")
    }

    #[test]
    fn splits_on_all_terminal_marks() {
        let parts = split_sentences("One. Two! Three? trailing");
        assert_eq!(parts, vec!["One.", " Two!", " Three?"]);
    }

    #[test]
    fn text_without_terminal_marks_is_one_sentence() {
        assert_eq!(split_sentences("no punctuation here"), vec!["no punctuation here"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn sanitize_keeps_words_spaces_and_periods() {
        assert_eq!(
            sanitize("  \"Hello,\" she said — quietly... right?! "),
            "Hello she said  quietly... right"
        );
    }

    #[test]
    fn sanitize_drops_non_ascii_letters() {
        assert_eq!(sanitize("Café über naïve 東京."), "Caf ber nave .");
        assert_eq!(sanitize("Ünïcödé"), "ncd");
    }

    #[test]
    fn short_fragments_are_discarded() {
        let seg = PromptSegmenter::new(10, 20, true);
        let prompts = seg.segment("Ok. Yes! The lighthouse keeper lit the lamp at dusk.");
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].as_str(), "The lighthouse keeper lit the lamp at dusk.");
    }

    #[test]
    fn no_qualifying_sentences_yields_empty() {
        let seg = PromptSegmenter::new(10, 20, true);
        assert!(seg.segment("Hi. Ok. Go!").is_empty());
        assert!(seg.segment("").is_empty());
    }

    #[test]
    fn never_exceeds_max_and_respects_min_length() {
        let text: String = (0..50).map(long_sentence).collect();
        for max in [1, 3, 8, 24] {
            for spread in [true, false] {
                let seg = PromptSegmenter::new(max, 20, spread);
                let prompts = seg.segment(&text);
                assert!(prompts.len() <= max);
                assert!(prompts.iter().all(|p| p.char_len() >= 20));
            }
        }
    }

    #[test]
    fn even_striding_spreads_across_story() {
        let text: String = (0..10).map(long_sentence).collect();
        let seg = PromptSegmenter::new(3, 20, true);
        let prompts = seg.segment(&text);

        // stride = 10 / 3 = 3 → sentences 0, 3, 6
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].as_str().contains("number 0 "));
        assert!(prompts[1].as_str().contains("number 3 "));
        assert!(prompts[2].as_str().contains("number 6 "));
    }

    #[test]
    fn without_striding_takes_the_first_sentences() {
        let text: String = (0..10).map(long_sentence).collect();
        let seg = PromptSegmenter::new(3, 20, false);
        let prompts = seg.segment(&text);

        assert!(prompts[1].as_str().contains("number 1 "));
        assert!(prompts[2].as_str().contains("number 2 "));
    }

    #[test]
    fn zero_max_frames_yields_empty() {
        let seg = PromptSegmenter::new(0, 20, true);
        assert!(seg.segment(&long_sentence(1)).is_empty());
    }

    #[test]
    fn segmentation_is_deterministic() {
        let text: String = (0..30).map(long_sentence).collect();
        let seg = PromptSegmenter::default();
        assert_eq!(seg.segment(&text), seg.segment(&text));
    }
}
