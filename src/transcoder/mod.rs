//! Test-definition transcoder
//!
//! Converts between [`TestDefinition`] and the YAML test document the
//! execution backend consumes:
//!
//! ```text
//! test_info:
//!   name: "<string>"
//!   description: "<string>"
//!   author: "<string>"
//!   version: "<string>"
//!
//! global_settings:
//!   sample_rate_hz: <number>
//!   max_test_time_s: <number>
//!
//! sequence:
//!   - step: <kind>
//!     description: "<string>"
//!     <param_key>: <value>
//! ```
//!
//! # Modules
//!
//! - `lexer`: classifies each line (header, entry, list item) and decodes scalars
//! - `parser`: recursive descent over the classified lines
//! - `serializer`: deterministic document rendering
//!
//! The serializer only ever emits documents the parser reads back to the same
//! definition. The parser additionally accepts hand-edited documents:
//! comments, bare or single-quoted scalars, unknown sections and parameters.

mod lexer;
mod parser;
mod serializer;

use thiserror::Error;

use crate::model::{ParamValue, TestDefinition};
use crate::settings::{DocumentMeta, GlobalSettings};

/// Why a test document could not be read. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `sequence:` section in the document
    #[error("document has no 'sequence:' section")]
    MissingSequence,

    /// Line does not fit the document grammar
    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// Step kind outside the catalog
    #[error("line {line}: unknown step kind '{kind}'")]
    UnknownStepKind { line: usize, kind: String },

    /// Quoted string without a closing quote
    #[error("line {line}: unterminated quoted string")]
    UnterminatedString { line: usize },

    /// Unrecognised backslash escape in a double-quoted string
    #[error("line {line}: invalid escape sequence '\\{escape}'")]
    InvalidEscape { line: usize, escape: String },

    /// Indentation that does not match the enclosing block
    #[error("line {line}: unexpected indentation")]
    UnexpectedIndent { line: usize },

    /// A top-level section appears twice
    #[error("line {line}: section '{name}' appears more than once")]
    DuplicateSection { line: usize, name: String },

    /// A key appears twice in the same mapping
    #[error("line {line}: key '{key}' appears more than once")]
    DuplicateKey { line: usize, key: String },

    /// Nested mappings, lists, flow collections or block scalars as values
    #[error("line {line}: '{key}' holds a nested value, only scalars are supported")]
    UnsupportedNesting { line: usize, key: String },

    /// A `global_settings` entry that is not a number
    #[error("line {line}: setting '{key}' must be a number, found '{value}'")]
    InvalidSetting {
        line: usize,
        key: String,
        value: String,
    },
}

impl ParseError {
    /// Line the error points at, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingSequence => None,
            Self::MalformedLine { line, .. }
            | Self::UnknownStepKind { line, .. }
            | Self::UnterminatedString { line }
            | Self::InvalidEscape { line, .. }
            | Self::UnexpectedIndent { line }
            | Self::DuplicateSection { line, .. }
            | Self::DuplicateKey { line, .. }
            | Self::UnsupportedNesting { line, .. }
            | Self::InvalidSetting { line, .. } => Some(*line),
        }
    }
}

/// Everything a test document carries
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub definition: TestDefinition,
    pub meta: DocumentMeta,
    pub settings: GlobalSettings,
}

/// Serializer/parser pair bound to the metadata and settings it emits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcoder {
    pub meta: DocumentMeta,
    pub settings: GlobalSettings,
}

impl Transcoder {
    pub fn new(meta: DocumentMeta, settings: GlobalSettings) -> Self {
        Self { meta, settings }
    }

    /// Render a definition; the same input always yields the same bytes.
    pub fn serialize(&self, definition: &TestDefinition) -> String {
        serializer::render(definition, &self.meta, &self.settings)
    }

    /// Recover the definition from a document. Metadata and settings found
    /// in the text are read but not returned; see [`parse_document`].
    pub fn parse(&self, text: &str) -> Result<TestDefinition, ParseError> {
        parse(text)
    }
}

/// Keys a step uses for itself and that cannot name a parameter
pub const RESERVED_STEP_KEYS: &[&str] = &["step", "description"];

/// Whether `key` can be written as a step parameter and read back as one
pub fn is_param_key(key: &str) -> bool {
    lexer::is_key(key) && !RESERVED_STEP_KEYS.contains(&key)
}

/// Read a bare parameter value the way the parser does: boolean literal,
/// then number, then plain text.
pub fn infer_value(raw: &str) -> ParamValue {
    match raw {
        "true" => ParamValue::Boolean(true),
        "false" => ParamValue::Boolean(false),
        _ => match parser::parse_number(raw) {
            Some(n) => ParamValue::Number(n),
            None => ParamValue::String(raw.to_string()),
        },
    }
}

/// Serialize with the default metadata and settings
pub fn serialize(definition: &TestDefinition) -> String {
    Transcoder::default().serialize(definition)
}

pub fn serialize_document(document: &Document) -> String {
    serializer::render(&document.definition, &document.meta, &document.settings)
}

/// Parse a test document into a definition
pub fn parse(text: &str) -> Result<TestDefinition, ParseError> {
    parse_document(text).map(|doc| doc.definition)
}

/// Parse a test document, keeping its metadata and global settings
pub fn parse_document(text: &str) -> Result<Document, ParseError> {
    let lines = lexer::lex(text)?;
    let document = parser::Parser::new(lines).document()?;
    tracing::debug!(
        name = %document.definition.name,
        steps = document.definition.steps.len(),
        "parsed test document"
    );
    Ok(document)
}
