//! The resolved configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::Table;

use crate::error::LayerfigError;
use crate::schema::{Schema, SchemaEntry};
use crate::types::Origin;
use crate::value::Value;

/// One resolved value and the layer it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub origin: Origin,
}

/// An immutable, complete configuration: exactly one typed value for every
/// schema entry, in registration order.
///
/// Snapshots are produced by [`Resolver`](crate::Resolver) and never change
/// afterwards. Use the typed getters for individual keys, or
/// [`extract`](Snapshot::extract) to deserialize the whole thing into an
/// application struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    schema: Arc<Schema>,
    values: Vec<Resolved>,
    files: Vec<PathBuf>,
}

impl Snapshot {
    /// `values` must line up with `schema.entries()`.
    pub(crate) fn new(schema: Arc<Schema>, values: Vec<Resolved>, files: Vec<PathBuf>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self {
            schema,
            values,
            files,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.resolved(key).map(|r| &r.value)
    }

    pub fn origin(&self, key: &str) -> Option<Origin> {
        self.resolved(key).map(|r| r.origin)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Value::as_i32)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Entries with their resolved values, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&SchemaEntry, &Resolved)> {
        self.schema.entries().zip(&self.values)
    }

    /// Config files that contributed to the file layer, lowest priority first.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The highest-priority config file read, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.files.last().map(PathBuf::as_path)
    }

    /// Nested view keyed by file key: top-level fields plus one table per
    /// section.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        for (entry, resolved) in self.iter() {
            set_nested(&mut table, entry.file_key_path(), resolved.value.to_toml());
        }
        table
    }

    /// The nested view as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for (entry, resolved) in self.iter() {
            set_nested_json(&mut root, entry.file_key_path(), json_of(&resolved.value));
        }
        serde_json::Value::Object(root)
    }

    /// Deserialize the nested view into `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, LayerfigError> {
        toml::Value::Table(self.to_table())
            .try_into()
            .map_err(|e: toml::de::Error| LayerfigError::InvalidValue {
                key: "<snapshot>".into(),
                reason: e.message().to_string(),
            })
    }

    fn resolved(&self, key: &str) -> Option<&Resolved> {
        self.schema.position(key).map(|i| &self.values[i])
    }
}

fn json_of(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Int32(i) => serde_json::Value::from(*i),
        Value::Bool(b) => serde_json::Value::Bool(*b),
    }
}

/// Insert `value` at a dotted path, creating intermediate tables. A schema
/// never registers a value where another entry has a section, so a non-table
/// in the way is simply replaced.
fn set_nested(table: &mut Table, dotted_key: &str, value: toml::Value) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, sections)) = segments.split_last() else {
        return;
    };

    let mut current = table;
    for segment in sections {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = toml::Value::Table(Table::new());
        }
        current = match slot {
            toml::Value::Table(next) => next,
            _ => return,
        };
    }
    current.insert(leaf.to_string(), value);
}

fn set_nested_json(
    map: &mut serde_json::Map<String, serde_json::Value>,
    dotted_key: &str,
    value: serde_json::Value,
) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, sections)) = segments.split_last() else {
        return;
    };

    let mut current = map;
    for segment in sections {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| serde_json::Value::Object(Default::default()));
        if !slot.is_object() {
            *slot = serde_json::Value::Object(Default::default());
        }
        current = match slot {
            serde_json::Value::Object(next) => next,
            _ => return,
        };
    }
    current.insert(leaf.to_string(), value);
}
