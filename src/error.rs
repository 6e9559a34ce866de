//! Error types for the tabsheet library.
//!
//! Every variant names the entity that triggered it (chord name, section
//! label, line index) so a caller can report or skip precisely that item.

use std::io;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SheetError {
    /// Malformed chord symbol (bad root letter or unrecognized suffix)
    #[error("invalid chord '{chord}': {reason}")]
    InvalidChordSyntax { chord: String, reason: String },

    /// Fret/finger data that cannot be drawn in the diagram window
    #[error("invalid fret data for chord '{chord}': {reason}")]
    InvalidFretData { chord: String, reason: String },

    /// Content references a chord absent from the chord map
    #[error("no chord definition for '{chord}' (section '{section}', line {line})")]
    MissingChordDefinition {
        chord: String,
        section: String,
        line: usize,
    },

    /// A section cannot fit on a page and mid-section breaks are forbidden
    #[error("section '{section}' does not fit on a single page and may not be split")]
    OverflowUnresolved { section: String },

    /// Capo suggestion requested for an empty chord set
    #[error("no capo suggestion possible for an empty chord set")]
    NoSimplificationFound,

    #[error("unknown section type '{value}'")]
    UnknownSectionType { value: String },

    #[error("section '{section}' references unknown pattern '{pattern}'")]
    UnknownPattern { pattern: String, section: String },

    /// Malformed inline chord markers in a line of content
    #[error("invalid annotated line '{line}': {reason}")]
    InvalidAnnotation { line: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for SheetError {
    fn from(error: io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidInput(error.to_string())
    }
}
