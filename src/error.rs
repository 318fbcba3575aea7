use std::{fmt::Display, path::PathBuf};

use thiserror::Error;

/// S-expression and extraction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected `)` at byte {at}")]
    UnexpectedClose { at: usize },
    #[error("{depth} list(s) not closed at end of input")]
    UnclosedList { depth: usize },
    #[error("String starting at byte {at} is not terminated")]
    UnterminatedString { at: usize },
    #[error("Escape character at byte {at} has nothing to escape")]
    DanglingEscape { at: usize },
    #[error("Quote at byte {at} is not followed by a value")]
    DanglingQuote { at: usize },
    #[error("Invalid token at byte {at}")]
    InvalidToken { at: usize },
    #[error("Input contains no value")]
    Empty,
    #[error("Unexpected input after the top-level value at byte {at}")]
    TrailingInput { at: usize },
    #[error("Missing required field `{key}` in node `{context}`")]
    MissingField { key: String, context: String },
    #[error("Expected {expected} in node `{context}`")]
    UnexpectedNode { expected: String, context: String },
    #[error("Invalid number `{value}` in node `{context}`")]
    InvalidNumber { value: String, context: String },
    #[error("Module {reference} in node `{context}` is not declared in the net file")]
    UnknownReference { reference: String, context: String },
    #[error("Top-level value at byte {at} is not a list")]
    NotAList { at: usize },
}

impl ParseError {
    /// Prefix the node context of a lookup error with the key of its parent.
    pub fn within(self, parent: &str) -> Self {
        match self {
            Self::MissingField { key, context } => Self::MissingField {
                key,
                context: format!("{parent}/{context}"),
            },
            Self::UnexpectedNode { expected, context } => Self::UnexpectedNode {
                expected,
                context: format!("{parent}/{context}"),
            },
            Self::InvalidNumber { value, context } => Self::InvalidNumber {
                value,
                context: format!("{parent}/{context}"),
            },
            Self::UnknownReference { reference, context } => Self::UnknownReference {
                reference,
                context: format!("{parent}/{context}"),
            },
            e => e,
        }
    }
}

/// Which of the two input documents an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFile {
    Net,
    Pcb,
}

impl Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFile::Net => write!(f, "net"),
            SourceFile::Pcb => write!(f, "pcb"),
        }
    }
}

/// Errors reading a design from its net and pcb files
#[derive(Error, Debug)]
pub enum DesignError {
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid {file} file")]
    Parse {
        file: SourceFile,
        #[source]
        source: ParseError,
    },
}

impl DesignError {
    pub fn source_file(&self) -> Option<SourceFile> {
        match self {
            DesignError::Io { .. } => None,
            DesignError::Parse { file, .. } => Some(*file),
        }
    }
}

/// Errors writing manufacturing files
#[derive(Error, Debug)]
pub enum OutputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Design {0} has no Edge.Cuts outline")]
    MissingOutline(String),
}
