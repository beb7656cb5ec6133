//! Three-level delimited documents.
//!
//! A response body is split into sections, each section into records and each
//! record into fields. Splitting is purely positional: nothing is trimmed or
//! coerced, and trailing empty pieces are dropped at every level so that a
//! terminating delimiter does not produce a phantom element.

use crate::error::{Coordinates, WireError};
use std::fmt;
use tracing::trace;

/// Default delimiter between sections
pub const SECTION_DELIMITER: char = '@';
/// Default delimiter between records
pub const RECORD_DELIMITER: char = ';';
/// Default delimiter between fields
pub const FIELD_DELIMITER: char = ',';

/// Delimiter set used to split and join a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Outermost delimiter
    pub section: char,
    /// Middle delimiter
    pub record: char,
    /// Innermost delimiter
    pub field: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            section: SECTION_DELIMITER,
            record: RECORD_DELIMITER,
            field: FIELD_DELIMITER,
        }
    }
}

/// A record is an ordered list of string fields
pub type Record = Vec<String>;
/// A section is an ordered list of records
pub type Section = Vec<Record>;

/// Parsed wire document indexed as `[section][record][field]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

/// Split on `delim`, dropping trailing empty pieces.
pub(crate) fn split_trimmed(text: &str, delim: char) -> Vec<&str> {
    let mut parts: Vec<&str> = text.split(delim).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

impl Document {
    /// Parse with the default delimiters
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, &Delimiters::default())
    }

    /// Parse a body that may be absent; an absent body is an empty document
    pub fn parse_opt(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    /// Parse with an explicit delimiter set
    pub fn parse_with(raw: &str, delims: &Delimiters) -> Self {
        let sections: Vec<Section> = split_trimmed(raw, delims.section)
            .into_iter()
            .map(|section| {
                split_trimmed(section, delims.record)
                    .into_iter()
                    .map(|record| {
                        split_trimmed(record, delims.field)
                            .into_iter()
                            .map(str::to_string)
                            .collect()
                    })
                    .collect()
            })
            .collect();

        trace!("parsed document with {} sections", sections.len());
        Self { sections }
    }

    /// Build a document from already split sections
    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Join back into wire text with the default delimiters
    pub fn serialize(&self) -> String {
        self.serialize_with(&Delimiters::default())
    }

    /// Join back into wire text with an explicit delimiter set
    pub fn serialize_with(&self, delims: &Delimiters) -> String {
        let field = delims.field.to_string();
        let record = delims.record.to_string();
        let section = delims.section.to_string();

        self.sections
            .iter()
            .map(|s| {
                s.iter()
                    .map(|r| r.join(&field))
                    .collect::<Vec<_>>()
                    .join(&record)
            })
            .collect::<Vec<_>>()
            .join(&section)
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the document has no sections at all
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate over sections
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Consume the document, yielding its sections
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    /// Section `i`, or a parser error
    pub fn section(&self, i: usize) -> Result<&Section, WireError> {
        self.sections
            .get(i)
            .ok_or(WireError::MissingElement(Coordinates::section(i)))
    }

    /// Record `j` of section `i`, or a parser error
    pub fn record(&self, i: usize, j: usize) -> Result<&Record, WireError> {
        self.sections
            .get(i)
            .and_then(|s| s.get(j))
            .ok_or(WireError::MissingElement(Coordinates::record(i, j)))
    }

    /// Field `k` of record `j` of section `i`, or a parser error
    pub fn field(&self, i: usize, j: usize, k: usize) -> Result<&str, WireError> {
        self.sections
            .get(i)
            .and_then(|s| s.get(j))
            .and_then(|r| r.get(k))
            .map(String::as_str)
            .ok_or(WireError::MissingElement(Coordinates::field(i, j, k)))
    }

    /// Whether section `i` exists
    pub fn has_section(&self, i: usize) -> bool {
        i < self.sections.len()
    }

    /// Whether record `j` of section `i` exists
    pub fn has_record(&self, i: usize, j: usize) -> bool {
        self.sections.get(i).is_some_and(|s| j < s.len())
    }

    /// Whether field `k` of record `j` of section `i` exists
    pub fn has_field(&self, i: usize, j: usize, k: usize) -> bool {
        self.sections
            .get(i)
            .and_then(|s| s.get(j))
            .is_some_and(|r| k < r.len())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl From<&str> for Document {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
