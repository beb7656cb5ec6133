//! Wire format error types.

use std::fmt;
use thiserror::Error;

/// Position inside a parsed document requested by a strict accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    /// Section index
    pub section: usize,
    /// Record index, if the access went that deep
    pub record: Option<usize>,
    /// Field index, if the access went that deep
    pub field: Option<usize>,
}

impl Coordinates {
    pub(crate) fn section(section: usize) -> Self {
        Self {
            section,
            record: None,
            field: None,
        }
    }

    pub(crate) fn record(section: usize, record: usize) -> Self {
        Self {
            section,
            record: Some(record),
            field: None,
        }
    }

    pub(crate) fn field(section: usize, record: usize, field: usize) -> Self {
        Self {
            section,
            record: Some(record),
            field: Some(field),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.section)?;
        if let Some(record) = self.record {
            write!(f, "[{}]", record)?;
        }
        if let Some(field) = self.field {
            write!(f, "[{}]", field)?;
        }
        Ok(())
    }
}

/// Wire format errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Strict access to an element the document does not contain
    #[error("parser error: missing element at {0}")]
    MissingElement(Coordinates),

    /// Field text could not be coerced to the requested number type
    #[error("parser error: invalid number {0:?}")]
    InvalidNumber(String),
}
