//! The schema registry: every configuration key, its default, its type, and
//! the name it goes by in each source.
//!
//! Entries are registered on a [`SchemaBuilder`] and sealed into a read-only
//! [`Schema`] with [`build()`](SchemaBuilder::build). There is no way to add or
//! change entries on a built `Schema`, so it can be shared behind an `Arc` for
//! the whole process.
//!
//! Per-source names are derived from the dotted key unless set explicitly:
//!
//! | Key | File key | Env suffix | Flag |
//! |-----|----------|------------|------|
//! | `log_level` | `log_level` | `LOG_LEVEL` | `--log-level` |
//! | `web.port` | `web.port` | `WEB_PORT` | `--web-port` |

use std::collections::HashMap;

use confique::Config;
use confique::meta::{FieldKind, LeafKind, Meta};
use serde::Serialize;

use crate::error::LayerfigError;
use crate::value::{Value, ValueType};

/// Declaration of one configuration key.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    key: String,
    default: Value,
    file_key: String,
    env_suffix: String,
    flag_name: String,
    short: Option<char>,
    doc: Vec<String>,
}

impl SchemaEntry {
    /// Declare `key` with its default. The default also fixes the entry's type.
    pub fn new(key: &str, default: impl Into<Value>) -> Self {
        Self {
            key: key.to_string(),
            default: default.into(),
            file_key: key.to_string(),
            env_suffix: key.replace('.', "_").to_uppercase(),
            flag_name: key.replace(['.', '_'], "-"),
            short: None,
            doc: Vec::new(),
        }
    }

    /// Override the dotted path used in config files.
    pub fn file_key(mut self, file_key: &str) -> Self {
        self.file_key = file_key.to_string();
        self
    }

    /// Override the environment variable suffix (the part after `PREFIX_`).
    pub fn env_suffix(mut self, suffix: &str) -> Self {
        self.env_suffix = suffix.to_string();
        self
    }

    /// Override the long flag name (without leading dashes).
    pub fn flag_name(mut self, flag: &str) -> Self {
        self.flag_name = flag.to_string();
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Append a line of documentation.
    pub fn doc(mut self, line: &str) -> Self {
        self.doc.push(line.to_string());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn value_type(&self) -> ValueType {
        self.default.value_type()
    }

    pub fn file_key_path(&self) -> &str {
        &self.file_key
    }

    pub fn env_name_suffix(&self) -> &str {
        &self.env_suffix
    }

    pub fn flag(&self) -> &str {
        &self.flag_name
    }

    pub fn short_flag(&self) -> Option<char> {
        self.short
    }

    pub fn doc_lines(&self) -> &[String] {
        &self.doc
    }
}

/// Collects schema entries before sealing them into a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entries: Vec<SchemaEntry>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive entries from a confique config struct.
    ///
    /// Leaf fields become keys, `#[config(nested)]` structs become dotted
    /// sections, `#[config(default = ...)]` values become defaults and `///`
    /// doc comments become entry docs. Every leaf must have a default and be a
    /// string, integer or boolean.
    pub fn from_config<C: Config + Serialize>() -> Result<Self, LayerfigError> {
        if let Some(key) = first_without_default(&C::META, "") {
            return Err(LayerfigError::MissingDefault { key });
        }
        let config = C::builder().load()?;
        let value = toml::Value::try_from(&config).map_err(|e| LayerfigError::InvalidValue {
            key: "<defaults>".into(),
            reason: e.to_string(),
        })?;
        let table = value
            .as_table()
            .ok_or_else(|| LayerfigError::InvalidValue {
                key: "<defaults>".into(),
                reason: "config did not serialize to a table".into(),
            })?;

        let mut entries = Vec::new();
        collect_entries(&C::META, "", table, &mut entries)?;

        entries
            .into_iter()
            .try_fold(Self::new(), |builder, entry| builder.register(entry))
    }

    /// Add an entry. Fails with [`LayerfigError::DuplicateKey`] if its key, file
    /// key, env suffix or flag name is already taken.
    pub fn register(mut self, entry: SchemaEntry) -> Result<Self, LayerfigError> {
        check_path(&entry.key)?;
        check_path(&entry.file_key)?;

        for existing in &self.entries {
            let clashes = [
                ("key", &existing.key, &entry.key),
                ("file key", &existing.file_key, &entry.file_key),
                ("env suffix", &existing.env_suffix, &entry.env_suffix),
                ("flag", &existing.flag_name, &entry.flag_name),
            ];
            if let Some((kind, _, name)) = clashes.into_iter().find(|(_, a, b)| a == b) {
                return Err(LayerfigError::DuplicateKey {
                    kind,
                    name: name.clone(),
                    key: entry.key.clone(),
                });
            }
            if let Some(short) = entry.short
                && existing.short == Some(short)
            {
                return Err(LayerfigError::DuplicateKey {
                    kind: "short flag",
                    name: short.to_string(),
                    key: entry.key.clone(),
                });
            }
            if is_section_of(&existing.file_key, &entry.file_key)
                || is_section_of(&entry.file_key, &existing.file_key)
            {
                return Err(LayerfigError::InvalidValue {
                    key: entry.key.clone(),
                    reason: format!(
                        "'{}' and '{}' cannot both be values",
                        existing.file_key, entry.file_key
                    ),
                });
            }
        }

        self.entries.push(entry);
        Ok(self)
    }

    /// Attach a short flag to an already-registered key.
    pub fn short(mut self, key: &str, short: char) -> Result<Self, LayerfigError> {
        if let Some(other) = self
            .entries
            .iter()
            .find(|e| e.short == Some(short) && e.key != key)
        {
            return Err(LayerfigError::DuplicateKey {
                kind: "short flag",
                name: short.to_string(),
                key: other.key.clone(),
            });
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.key == key)
            .ok_or_else(|| LayerfigError::KeyNotFound(key.into()))?;
        entry.short = Some(short);
        Ok(self)
    }

    /// Seal the registry.
    pub fn build(self) -> Schema {
        let by_key = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();
        Schema {
            entries: self.entries,
            by_key,
        }
    }
}

/// A sealed, read-only set of schema entries in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    entries: Vec<SchemaEntry>,
    by_key: HashMap<String, usize>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// All entries in registration order. Each call starts a fresh iteration.
    pub fn entries(&self) -> std::slice::Iter<'_, SchemaEntry> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn by_flag(&self, flag: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.flag_name == flag)
    }

    pub fn by_file_key(&self, file_key: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.file_key == file_key)
    }

    /// True if `path` is a strict prefix section of some entry's file key
    /// (e.g. `web` for `web.port`).
    pub fn is_section(&self, path: &str) -> bool {
        self.entries.iter().any(|e| is_section_of(path, &e.file_key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_entries(
    meta: &Meta,
    prefix: &str,
    table: &toml::Table,
    out: &mut Vec<SchemaEntry>,
) -> Result<(), LayerfigError> {
    for field in meta.fields {
        let key = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf { .. } => {
                let value = table
                    .get(field.name)
                    .ok_or_else(|| LayerfigError::MissingDefault { key: key.clone() })?;
                let default = Value::from_toml(&key, value)?;
                let entry = field
                    .doc
                    .iter()
                    .fold(SchemaEntry::new(&key, default), |e, line| e.doc(line.trim()));
                out.push(entry);
            }
            FieldKind::Nested { meta: nested, .. } => {
                let sub = table
                    .get(field.name)
                    .and_then(|v| v.as_table())
                    .ok_or_else(|| LayerfigError::MissingDefault { key: key.clone() })?;
                collect_entries(nested, &key, sub, out)?;
            }
        }
    }
    Ok(())
}

/// The first leaf, in declaration order, that has no `#[config(default)]`.
fn first_without_default(meta: &Meta, prefix: &str) -> Option<String> {
    meta.fields.iter().find_map(|field| {
        let key = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf {
                kind: LeafKind::Required { default: Some(_) },
                ..
            } => None,
            FieldKind::Leaf { .. } => Some(key),
            FieldKind::Nested { meta: nested, .. } => first_without_default(nested, &key),
        }
    })
}

fn check_path(path: &str) -> Result<(), LayerfigError> {
    if path.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(LayerfigError::InvalidValue {
            key: path.into(),
            reason: "dotted keys must not contain empty segments".into(),
        });
    }
    Ok(())
}

/// `section` is a strict dotted prefix of `path`.
fn is_section_of(section: &str, path: &str) -> bool {
    path.strip_prefix(section)
        .is_some_and(|rest| rest.starts_with('.'))
}
