//! Plain-text element parser
//!
//! Splits a document into non-empty lines and classifies each line into an
//! [`ElementType`], tracking the current section label as headers appear.

use super::{Element, ElementType, DEFAULT_SECTION};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Configuration for line classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Phrases that mark a line as a section header (case-insensitive containment)
    pub section_headers: Vec<String>,
    /// Keywords that mark a short line as a project header
    pub project_keywords: Vec<String>,
    /// Lines at or above this many characters are never project headers
    pub max_project_header_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            section_headers: [
                "Основные направления деятельности",
                "Уставный капитал. Акции",
                "Информация",
                "Проекты",
                "История",
                "Корпоративное управление",
                "Устав и внутренние документы",
                "Факты",
                "Main activities",
                "Share capital",
                "Projects",
                "History",
                "Corporate governance",
                "Charter and internal documents",
                "Facts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            project_keywords: ["проект", "строительство", "project", "construction"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_project_header_chars: 150,
        }
    }
}

/// Classifies document lines into elements
pub struct ElementParser {
    config: ParserConfig,
    lowered_headers: Vec<String>,
    year: Regex,
    numbered: Regex,
    project: Option<Regex>,
}

impl ElementParser {
    pub fn new(config: ParserConfig) -> Result<Self> {
        let project = if config.project_keywords.is_empty() {
            None
        } else {
            let alternation = config
                .project_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                RegexBuilder::new(&alternation)
                    .case_insensitive(true)
                    .build()?,
            )
        };

        let lowered_headers = config
            .section_headers
            .iter()
            .map(|h| h.to_lowercase())
            .filter(|h| !h.trim().is_empty())
            .collect();

        Ok(Self {
            config,
            lowered_headers,
            year: Regex::new(r"^\d{3,4}\.?$")?,
            numbered: Regex::new(r"^\d+[.)]")?,
            project,
        })
    }

    /// Parse a UTF-8 text file
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<Element>> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.parse(&text))
    }

    /// Parse text into elements, one per non-empty line
    pub fn parse(&self, text: &str) -> Vec<Element> {
        let mut elements = Vec::new();
        let mut current_section = DEFAULT_SECTION.to_string();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (element_type, text) = self.classify(line);
            if text.is_empty() {
                continue;
            }
            if element_type == ElementType::SectionHeader {
                current_section = text.clone();
            }

            elements.push(Element::new(
                elements.len() as u64,
                element_type,
                text,
                current_section.clone(),
            ));
        }

        log::debug!("Parsed {} elements", elements.len());
        elements
    }

    /// Classify a single trimmed line, returning the type and the element text
    pub fn classify(&self, line: &str) -> (ElementType, String) {
        if line.starts_with('#') {
            let heading = line.trim_start_matches('#').trim();
            return (ElementType::SectionHeader, heading.to_string());
        }

        let lowered = line.to_lowercase();
        if self.lowered_headers.iter().any(|h| lowered.contains(h)) {
            return (ElementType::SectionHeader, line.to_string());
        }

        if self.year.is_match(line) {
            return (ElementType::YearHeader, line.to_string());
        }

        if self.numbered.is_match(line) {
            return (ElementType::NumberedItem, line.to_string());
        }

        if line.starts_with(['-', '•', '—', '*']) {
            return (ElementType::BulletItem, line.to_string());
        }

        if let Some(project) = &self.project {
            if line.chars().count() < self.config.max_project_header_chars
                && project.is_match(line)
            {
                return (ElementType::ProjectHeader, line.to_string());
            }
        }

        (ElementType::Paragraph, line.to_string())
    }
}

/// Structural overview of a parsed document
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentSummary {
    pub total_elements: usize,
    /// Distinct section labels in order of first appearance
    pub sections: Vec<String>,
    pub type_counts: BTreeMap<ElementType, usize>,
}

impl DocumentSummary {
    pub fn from_elements(elements: &[Element]) -> Self {
        let mut summary = Self {
            total_elements: elements.len(),
            ..Default::default()
        };

        for element in elements {
            if !summary.sections.contains(&element.section) {
                summary.sections.push(element.section.clone());
            }
            *summary.type_counts.entry(element.element_type).or_default() += 1;
        }

        summary
    }
}
