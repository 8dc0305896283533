//! Structural elements of a source document
//!
//! Elements are the unit handed from the parser to the chunker. They are
//! created once, in source order, and never mutated afterwards.

pub mod parser;

pub use parser::{DocumentSummary, ElementParser, ParserConfig};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Section label used for elements that precede the first header
pub const DEFAULT_SECTION: &str = "General information";

/// Structural classification of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Paragraph,
    SectionHeader,
    YearHeader,
    ProjectHeader,
    NumberedItem,
    BulletItem,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Paragraph => "paragraph",
            ElementType::SectionHeader => "section_header",
            ElementType::YearHeader => "year_header",
            ElementType::ProjectHeader => "project_header",
            ElementType::NumberedItem => "numbered_item",
            ElementType::BulletItem => "bullet_item",
        }
    }

    /// List items (numbered or bulleted)
    pub fn is_list_item(&self) -> bool {
        matches!(self, ElementType::NumberedItem | ElementType::BulletItem)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One unit of parsed source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub text: String,
    pub element_type: ElementType,
    /// Label of the enclosing section, inherited from the most recent header
    pub section: String,
    /// Ordinal position in source order
    pub sequence_index: u64,
}

impl Element {
    pub fn new(
        sequence_index: u64,
        element_type: ElementType,
        text: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            element_type,
            section: section.into(),
            sequence_index,
        }
    }

    /// Number of whitespace-separated words in the element text
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
