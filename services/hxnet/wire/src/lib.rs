//! Delimited wire format, escaping, and sub-field grammars for hxnet.
//!
//! This crate provides the text codec spoken by the game server: a three-level
//! delimited document, the control-byte escaping that lets free text survive
//! inside a field, and the small grammars packed into individual fields.
//!
//! ## Wire Format
//!
//! ```text
//! sections := section ('@' section)*
//! section  := record  (';' record)*
//! record   := field   (',' field)*
//! ```
//!
//! Every leaf is a string. Coercion to numbers or flags is left to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod escape;
pub mod subfield;

// Re-export main types
pub use document::{
    Delimiters, Document, Record, Section, FIELD_DELIMITER, RECORD_DELIMITER, SECTION_DELIMITER,
};
pub use error::{Coordinates, WireError};
pub use escape::{decode, decode_list, encode, encode_list};
pub use subfield::{join_list, parse_num, split_list, split_tuple};
