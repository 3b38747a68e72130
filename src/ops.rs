//! Config operations: key lookup, listing, and result types.
//!
//! Provides the logic behind `config list` and `config get`, and the
//! `ConfigResult` enum that callers use to display results (including the
//! confirmation returned by [`persist::write`](crate::persist::write)).

use std::fmt;
use std::path::PathBuf;

use crate::error::LayerfigError;
use crate::snapshot::Snapshot;
use crate::types::{Format, Origin};
use crate::value::Value;

/// One row of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: String,
    pub value: Value,
    pub origin: Origin,
}

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// Confirmation that a config file was written, echoing what was written.
    Written {
        path: PathBuf,
        format: Format,
        snapshot: Snapshot,
    },
    /// All resolved values in schema order.
    Listing { entries: Vec<ListEntry> },
    /// A key's resolved value, where it came from, and its doc comment.
    KeyValue {
        key: String,
        value: Value,
        origin: Origin,
        doc: Vec<String>,
    },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Written { path, format, .. } => {
                write!(f, "Config file written to {} ({format})", path.display())
            }
            ConfigResult::KeyValue {
                key,
                value,
                origin,
                doc,
            } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value} ({origin})")
            }
            ConfigResult::Listing { entries } => {
                for (i, e) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{} = {} ({})", e.key, e.value, e.origin)?;
                }
                Ok(())
            }
        }
    }
}

/// Get a resolved value by key, including its doc comment.
pub fn get_value(snapshot: &Snapshot, key: &str) -> Result<ConfigResult, LayerfigError> {
    let (entry, resolved) = snapshot
        .iter()
        .find(|(e, _)| e.key() == key)
        .ok_or_else(|| LayerfigError::KeyNotFound(key.into()))?;

    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: resolved.value.clone(),
        origin: resolved.origin,
        doc: entry.doc_lines().to_vec(),
    })
}

/// List all resolved values with the layer each one came from.
pub fn list_values(snapshot: &Snapshot) -> ConfigResult {
    let entries = snapshot
        .iter()
        .map(|(entry, resolved)| ListEntry {
            key: entry.key().to_string(),
            value: resolved.value.clone(),
            origin: resolved.origin,
        })
        .collect();
    ConfigResult::Listing { entries }
}
