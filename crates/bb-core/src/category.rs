//! Closed vocabularies shared by the catalog, the selection engine and the
//! profile record.
//!
//! All three serialize as the snake_case strings the persisted profile and
//! the catalog use (`social_media`, `moderate`, `coach`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Behavior type a user can opt into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SocialMedia,
    Porn,
    Substance,
}

impl Category {
    /// Fixed order; also the keyword-matching priority.
    pub const ALL: [Category; 3] = [Category::SocialMedia, Category::Porn, Category::Substance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SocialMedia => "social_media",
            Category::Porn => "porn",
            Category::Substance => "substance",
        }
    }

    /// Unit the per-category stat and goals are counted in.
    pub fn unit(&self) -> &'static str {
        match self {
            Category::SocialMedia => "minutes",
            Category::Porn => "sessions",
            Category::Substance => "cigarettes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "social_media" | "social" => Ok(Category::SocialMedia),
            "porn" => Ok(Category::Porn),
            "substance" => Ok(Category::Substance),
            other => Err(CoreError::Validation(format!("unknown category '{other}'"))),
        }
    }
}

/// Severity tier of a quote, and the harshness a user asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Mild,
    Moderate,
    #[default]
    Extreme,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Mild => "mild",
            Intensity::Moderate => "moderate",
            Intensity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Intensity::Mild),
            "moderate" => Ok(Intensity::Moderate),
            "extreme" => Ok(Intensity::Extreme),
            other => Err(CoreError::Validation(format!("unknown intensity '{other}'"))),
        }
    }
}

/// Tone family a persona answers in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaStyle {
    Parent,
    Romantic,
    Coach,
}

impl PersonaStyle {
    pub const ALL: [PersonaStyle; 3] =
        [PersonaStyle::Parent, PersonaStyle::Romantic, PersonaStyle::Coach];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaStyle::Parent => "parent",
            PersonaStyle::Romantic => "romantic",
            PersonaStyle::Coach => "coach",
        }
    }

    /// Opening line a persona of this style starts a chat with.
    pub fn greeting(&self) -> &'static str {
        match self {
            PersonaStyle::Parent => "I've always been disappointed in you.",
            PersonaStyle::Romantic => "I left because you couldn't control yourself.",
            PersonaStyle::Coach => "I'm here to whip you into shape, weakling!",
        }
    }
}

impl fmt::Display for PersonaStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parent" => Ok(PersonaStyle::Parent),
            "romantic" => Ok(PersonaStyle::Romantic),
            "coach" => Ok(PersonaStyle::Coach),
            other => Err(CoreError::Validation(format!("unknown persona style '{other}'"))),
        }
    }
}
