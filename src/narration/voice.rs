//! Narration voice accent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// English accent of the narrator, stored as the speech service's regional
/// domain (`"com"`, `"co.uk"`, `"co.in"`, `"com.au"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accent {
    #[default]
    #[serde(rename = "com")]
    Us,
    #[serde(rename = "co.uk")]
    Uk,
    #[serde(rename = "co.in")]
    India,
    #[serde(rename = "com.au")]
    Australia,
}

impl Accent {
    pub const ALL: [Accent; 4] = [Accent::Us, Accent::Uk, Accent::India, Accent::Australia];

    /// Regional domain of the speech service for this accent.
    pub fn tld(&self) -> &'static str {
        match self {
            Accent::Us => "com",
            Accent::Uk => "co.uk",
            Accent::India => "co.in",
            Accent::Australia => "com.au",
        }
    }

    /// BCP 47 language tag.
    pub fn language_tag(&self) -> &'static str {
        match self {
            Accent::Us => "en-US",
            Accent::Uk => "en-GB",
            Accent::India => "en-IN",
            Accent::Australia => "en-AU",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Accent::Us => "US English",
            Accent::Uk => "UK English",
            Accent::India => "Indian English",
            Accent::Australia => "Australian English",
        }
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Accent {
    type Err = String;

    /// Accepts the domain (`co.uk`), a short name (`uk`) or the language tag
    /// (`en-GB`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Accent::ALL
            .into_iter()
            .find(|a| key == a.tld() || key == a.language_tag().to_ascii_lowercase())
            .or(match key.as_str() {
                "us" => Some(Accent::Us),
                "uk" | "gb" => Some(Accent::Uk),
                "in" | "india" => Some(Accent::India),
                "au" | "australia" => Some(Accent::Australia),
                _ => None,
            })
            .ok_or_else(|| format!("unknown accent: {s}"))
    }
}
