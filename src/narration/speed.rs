//! Speaking speed presets and duration estimates.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Narration speed preset, stored as `"slow"`, `"normal"` or `"fast"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl SpeechSpeed {
    /// Multiplier applied to the base words-per-minute.
    pub fn rate(&self) -> f64 {
        match self {
            SpeechSpeed::Slow => 0.75,
            SpeechSpeed::Normal => 1.0,
            SpeechSpeed::Fast => 1.25,
        }
    }
}

impl fmt::Display for SpeechSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpeechSpeed::Slow => "slow",
            SpeechSpeed::Normal => "normal",
            SpeechSpeed::Fast => "fast",
        })
    }
}

impl FromStr for SpeechSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(SpeechSpeed::Slow),
            "normal" => Ok(SpeechSpeed::Normal),
            "fast" => Ok(SpeechSpeed::Fast),
            _ => Err(format!("unknown speed: {s}")),
        }
    }
}

/// Estimated time to read `text` aloud.
///
/// ```
/// use std::time::Duration;
/// use story_frames::narration::{estimate_duration, SpeechSpeed};
///
/// let text = "one two three four five six seven eight nine ten";
/// assert_eq!(estimate_duration(text, 150, SpeechSpeed::Normal), Duration::from_secs(4));
/// assert_eq!(estimate_duration("", 150, SpeechSpeed::Fast), Duration::ZERO);
/// ```
pub fn estimate_duration(text: &str, words_per_minute: u32, speed: SpeechSpeed) -> Duration {
    let words = text.split_whitespace().count();
    let per_minute = f64::from(words_per_minute) * speed.rate();
    if words == 0 || per_minute <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(words as f64 * 60.0 / per_minute)
}
