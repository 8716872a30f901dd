//! Story generation parameters and the `/generate_story` request body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// StoryError
// ---------------------------------------------------------------------------

/// Errors raised while preparing a story request.
#[derive(Debug, Error)]
pub enum StoryError {
    /// `/generate_story` needs at least one image.
    #[error("please provide at least one image")]
    NoImages,

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not an image the decoder understands.
    #[error("could not process image: {0}")]
    Image(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Story genre offered to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Genre {
    #[default]
    Fantasy,
    Adventure,
    Romance,
    Horror,
    Mystery,
    #[serde(rename = "Moral Story")]
    MoralStory,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Fantasy,
        Genre::Adventure,
        Genre::Romance,
        Genre::Horror,
        Genre::Mystery,
        Genre::MoralStory,
    ];

    /// Name sent on the wire and shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Fantasy => "Fantasy",
            Genre::Adventure => "Adventure",
            Genre::Romance => "Romance",
            Genre::Horror => "Horror",
            Genre::Mystery => "Mystery",
            Genre::MoralStory => "Moral Story",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Genre {
    type Err = String;

    /// Case-insensitive; accepts `moral`, `moral-story` and `moral story`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "fantasy" => Ok(Genre::Fantasy),
            "adventure" => Ok(Genre::Adventure),
            "romance" => Ok(Genre::Romance),
            "horror" => Ok(Genre::Horror),
            "mystery" => Ok(Genre::Mystery),
            "moral" | "moralstory" => Ok(Genre::MoralStory),
            _ => Err(format!("unknown genre: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// StoryLength
// ---------------------------------------------------------------------------

/// Target story length, serialised as its word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum StoryLength {
    #[default]
    Short,
    Medium,
    Long,
}

impl StoryLength {
    pub fn words(&self) -> u32 {
        match self {
            StoryLength::Short => 200,
            StoryLength::Medium => 500,
            StoryLength::Long => 1000,
        }
    }
}

impl From<StoryLength> for u32 {
    fn from(length: StoryLength) -> u32 {
        length.words()
    }
}

impl TryFrom<u32> for StoryLength {
    type Error = String;

    fn try_from(words: u32) -> Result<Self, Self::Error> {
        match words {
            200 => Ok(StoryLength::Short),
            500 => Ok(StoryLength::Medium),
            1000 => Ok(StoryLength::Long),
            other => Err(format!("unsupported story length: {other} words")),
        }
    }
}

impl FromStr for StoryLength {
    type Err = String;

    /// Accepts `short` / `medium` / `long` or the word counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" | "200" => Ok(StoryLength::Short),
            "medium" | "500" => Ok(StoryLength::Medium),
            "long" | "1000" => Ok(StoryLength::Long),
            other => Err(format!("unknown story length: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// StoryRequest
// ---------------------------------------------------------------------------

/// JSON body for `POST /generate_story`.
#[derive(Debug, Clone, Serialize)]
pub struct StoryRequest {
    /// Base64-encoded images, no data-URI prefix.
    pub images: Vec<String>,
    pub genre: Genre,
    pub length: StoryLength,
}

impl StoryRequest {
    /// Build a request; at least one image is required.
    pub fn new(images: Vec<String>, genre: Genre, length: StoryLength) -> Result<Self, StoryError> {
        if images.is_empty() {
            return Err(StoryError::NoImages);
        }
        Ok(Self {
            images,
            genre,
            length,
        })
    }
}

// ---------------------------------------------------------------------------
// Data URIs
// ---------------------------------------------------------------------------

/// Return the payload of a `data:` URI (everything after the first comma).
///
/// Strings without a comma are returned unchanged, so already-bare base64
/// passes straight through.
pub fn strip_data_uri(uri: &str) -> &str {
    match uri.split_once(',') {
        Some((_, payload)) => payload,
        None => uri,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_serialises_with_display_name() {
        assert_eq!(serde_json::to_string(&Genre::MoralStory).unwrap(), "\"Moral Story\"");
        assert_eq!(serde_json::to_string(&Genre::Horror).unwrap(), "\"Horror\"");
    }

    #[test]
    fn genre_parses_loosely() {
        assert_eq!("moral-story".parse::<Genre>().unwrap(), Genre::MoralStory);
        assert_eq!("Moral Story".parse::<Genre>().unwrap(), Genre::MoralStory);
        assert_eq!(" MYSTERY ".parse::<Genre>().unwrap(), Genre::Mystery);
        assert!("western".parse::<Genre>().is_err());
    }

    #[test]
    fn length_serialises_as_word_count() {
        assert_eq!(serde_json::to_string(&StoryLength::Medium).unwrap(), "500");
        let parsed: StoryLength = serde_json::from_str("1000").unwrap();
        assert_eq!(parsed, StoryLength::Long);
        assert!(serde_json::from_str::<StoryLength>("300").is_err());
    }

    #[test]
    fn length_parses_names_and_numbers() {
        assert_eq!("short".parse::<StoryLength>().unwrap(), StoryLength::Short);
        assert_eq!("1000".parse::<StoryLength>().unwrap(), StoryLength::Long);
        assert!("epic".parse::<StoryLength>().is_err());
    }

    #[test]
    fn defaults_are_fantasy_and_short() {
        assert_eq!(Genre::default(), Genre::Fantasy);
        assert_eq!(StoryLength::default(), StoryLength::Short);
    }

    #[test]
    fn request_requires_an_image() {
        let err = StoryRequest::new(vec![], Genre::Fantasy, StoryLength::Short).unwrap_err();
        assert!(matches!(err, StoryError::NoImages));
        assert_eq!(err.to_string(), "please provide at least one image");
    }

    #[test]
    fn request_body_shape() {
        let req = StoryRequest::new(vec!["AAAA".into()], Genre::MoralStory, StoryLength::Short)
            .unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["images"][0], "AAAA");
        assert_eq!(json["genre"], "Moral Story");
        assert_eq!(json["length"], 200);
    }

    #[test]
    fn strip_data_uri_returns_payload() {
        assert_eq!(strip_data_uri("data:image/png;base64,iVBORw0"), "iVBORw0");
        assert_eq!(strip_data_uri("iVBORw0"), "iVBORw0");
    }
}
