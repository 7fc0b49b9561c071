//! Motorbench Library
//!
//! Test-definition authoring for an industrial motor test bench: the step
//! model, an editing session over it, and the YAML document format the
//! execution backend consumes.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod settings;
pub mod store;
pub mod transcoder;

// Re-export main types for convenience
pub use catalog::{ParamSpec, ParamType, SchemaDefault, StepKind};
pub use config::BenchConfig;
pub use editor::{Direction, Editor, StepId, ViewMode};
pub use error::BenchError;
pub use model::{ParamValue, Params, SchemaIssue, Step, TestDefinition, UNTITLED_TEST};
pub use settings::{DocumentMeta, GlobalSettings};
pub use store::{DefinitionStore, FsStore, StoredDefinition};
pub use transcoder::{Document, ParseError, Transcoder, parse, parse_document, serialize};
