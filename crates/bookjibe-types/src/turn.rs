use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

/// Which part of the book a turn belongs to.
///
/// Stored as its string form (`synopsis`, `chapter3`, ...). Anything that is
/// not a synopsis or a well-formed chapter label is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionLabel {
    Synopsis,
    Chapter(u32),
    Other(String),
}

const SYNOPSIS: &str = "synopsis";
const CHAPTER_PREFIX: &str = "chapter";

impl SectionLabel {
    pub fn chapter_number(&self) -> Option<u32> {
        match self {
            SectionLabel::Chapter(n) => Some(*n),
            _ => None,
        }
    }

    fn parse(s: &str) -> Self {
        if s == SYNOPSIS {
            return SectionLabel::Synopsis;
        }
        if let Some(suffix) = s.strip_prefix(CHAPTER_PREFIX) {
            // "chapter01" must survive a round trip, so only canonical numbers count
            if let Ok(n) = suffix.parse::<u32>() {
                if n > 0 && n.to_string() == suffix {
                    return SectionLabel::Chapter(n);
                }
            }
        }
        SectionLabel::Other(s.to_string())
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionLabel::Synopsis => f.write_str(SYNOPSIS),
            SectionLabel::Chapter(n) => write!(f, "{}{}", CHAPTER_PREFIX, n),
            SectionLabel::Other(s) => f.write_str(s),
        }
    }
}

impl FromStr for SectionLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SectionLabel::parse(s))
    }
}

impl From<String> for SectionLabel {
    fn from(s: String) -> Self {
        SectionLabel::parse(&s)
    }
}

impl From<&str> for SectionLabel {
    fn from(s: &str) -> Self {
        SectionLabel::parse(s)
    }
}

impl From<SectionLabel> for String {
    fn from(label: SectionLabel) -> Self {
        label.to_string()
    }
}

/// A single utterance in the writing conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<SectionLabel>,
    pub text: String,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            label: None,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            label: None,
            text: text.into(),
        }
    }

    pub fn labelled(mut self, label: impl Into<SectionLabel>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn chapter_number(&self) -> Option<u32> {
        self.label.as_ref().and_then(SectionLabel::chapter_number)
    }
}
