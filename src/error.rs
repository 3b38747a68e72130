use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Format;
use crate::validate::ValidationReport;
use crate::value::ValueType;

/// A position inside a config file, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum LayerfigError {
    #[error("Duplicate {kind} '{name}' declared by '{key}'")]
    DuplicateKey {
        kind: &'static str,
        name: String,
        key: String,
    },

    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to parse {path} as {format}{}: {message}", at(location))]
    ParseError {
        path: PathBuf,
        format: Format,
        location: Option<Location>,
        message: String,
    },

    #[error("Unknown key '{key}' in {path}{}", at_line(*line))]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: Option<usize>,
    },

    #[error("Unknown keys in config file:\n{}", bullets(.0))]
    UnknownKeys(Vec<LayerfigError>),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("{0}")]
    InvalidFlagSyntax(String),

    #[error("Invalid value for '{key}': expected {expected}, got '{raw}'")]
    TypeMismatch {
        key: String,
        raw: String,
        expected: ValueType,
    },

    #[error("Configuration is invalid:\n{0}")]
    ValidationFailure(ValidationReport),

    #[error("Config file already exists: {path} (refusing to overwrite)")]
    AlreadyExists { path: PathBuf },

    #[error("Unsupported config format '{given}' (expected one of: {})", Format::allowed())]
    UnsupportedFormat { given: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Key '{key}' has no default value")]
    MissingDefault { key: String },

    #[error("Key '{key}' has unsupported type {found} (expected string, integer or boolean)")]
    UnsupportedType { key: String, found: String },

    #[error("App name is required: call .app_name() on the builder")]
    AppNameRequired,
}

impl LayerfigError {
    /// Process exit code for this error. Argument errors follow clap's convention.
    pub fn exit_code(&self) -> u8 {
        match self {
            LayerfigError::InvalidFlagSyntax(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(feature = "clap")]
impl From<clap::Error> for LayerfigError {
    fn from(err: clap::Error) -> Self {
        LayerfigError::InvalidFlagSyntax(err.render().to_string().trim_end().to_string())
    }
}

fn at(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" ({loc})"),
        None => String::new(),
    }
}

fn at_line(line: Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

fn bullets(errors: &[LayerfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
