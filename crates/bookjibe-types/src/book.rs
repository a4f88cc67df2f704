use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::turn::SectionLabel;

/// The human request and the assistant answer that make up one book section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPair {
    #[serde(alias = "human")]
    pub human_message: String,
    #[serde(alias = "ai")]
    pub ai_message: String,
}

impl SectionPair {
    pub fn new(human_message: impl Into<String>, ai_message: impl Into<String>) -> Self {
        Self {
            human_message: human_message.into(),
            ai_message: ai_message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSection {
    pub label: SectionLabel,
    pub pair: SectionPair,
}

/// Sections of a book in file order.
///
/// Serialized as a JSON object `section name -> {human_message, ai_message}`;
/// key order is kept on both read and write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookData {
    pub sections: Vec<BookSection>,
}

/// A saved conversation history has the same shape as an imported book.
pub type HistoryRecord = BookData;

impl BookData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<SectionLabel>, pair: SectionPair) {
        self.sections.push(BookSection {
            label: label.into(),
            pair,
        });
    }

    pub fn get(&self, label: &SectionLabel) -> Option<&SectionPair> {
        self.sections
            .iter()
            .find(|s| &s.label == label)
            .map(|s| &s.pair)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Serialize for BookData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.label.to_string(), &section.pair)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BookData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BookDataVisitor;

        impl<'de> Visitor<'de> for BookDataVisitor {
            type Value = BookData;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of section name to {human_message, ai_message}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<BookData, A::Error> {
                let mut book = BookData::new();
                while let Some((name, pair)) = access.next_entry::<String, SectionPair>()? {
                    book.push(name, pair);
                }
                Ok(book)
            }
        }

        deserializer.deserialize_map(BookDataVisitor)
    }
}

/// One generated version of a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterCandidate {
    pub human_message: String,
    pub ai_message: String,
}

/// The two candidate versions offered for a chapter. Neither is part of the
/// transcript until one is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterVersions {
    pub chapter: u32,
    pub candidates: [ChapterCandidate; 2],
}

impl ChapterVersions {
    /// `choice` is 1-based, as presented to the user.
    pub fn candidate(&self, choice: u8) -> Option<&ChapterCandidate> {
        match choice {
            1 | 2 => self.candidates.get(usize::from(choice - 1)),
            _ => None,
        }
    }

    /// Text block appended to the chapter's draft log.
    pub fn render_draft(&self) -> String {
        format!(
            "Chapter {}\nVersion 1:\n{}\nVersion 2:\n{}\n\n\n",
            self.chapter, self.candidates[0].ai_message, self.candidates[1].ai_message
        )
    }
}
