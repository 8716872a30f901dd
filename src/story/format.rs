//! Plain-text layout for a generated story.

/// Sentences grouped into each paragraph.
const SENTENCES_PER_PARAGRAPH: usize = 3;

/// Re-flow `story` into paragraphs of three sentences separated by a blank
/// line.  Sentences are split on `.` only; blank pieces are dropped and every
/// sentence is re-terminated with a single `.`.
///
/// ```
/// use story_frames::story::format_story;
///
/// let text = "One. Two. Three. Four.";
/// assert_eq!(format_story(text), "One. Two. Three.\n\nFour.");
/// ```
pub fn format_story(story: &str) -> String {
    let sentences: Vec<String> = story
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect();

    sentences
        .chunks(SENTENCES_PER_PARAGRAPH)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}
