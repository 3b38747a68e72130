//! Config persistence: render a snapshot to TOML, JSON or YAML and write it
//! to a new file.
//!
//! TOML is built with `toml_edit` so each entry's doc text lands above it as
//! `#` comments. Existing files are never overwritten. Creates parent
//! directories as needed.

use std::io::Write;
use std::path::{Path, PathBuf};

use toml_edit::{DocumentMut, Item, Table};

use crate::error::LayerfigError;
use crate::ops::ConfigResult;
use crate::snapshot::Snapshot;
use crate::types::Format;
use crate::value::Value;

/// Pure function: render `snapshot` as a document in `format`.
///
/// Only schema fields are emitted, nested by section.
pub fn render(snapshot: &Snapshot, format: Format) -> Result<String, LayerfigError> {
    match format {
        Format::Toml => Ok(render_toml(snapshot)),
        Format::Json => serde_json::to_string_pretty(&snapshot.to_json())
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| render_error(format, e)),
        Format::Yaml | Format::Yml => {
            serde_yaml::to_string(&snapshot.to_json()).map_err(|e| render_error(format, e))
        }
    }
}

fn render_toml(snapshot: &Snapshot) -> String {
    let mut doc = DocumentMut::new();

    for (entry, resolved) in snapshot.iter() {
        let segments: Vec<&str> = entry.file_key_path().split('.').collect();
        let Some((leaf, sections)) = segments.split_last() else {
            continue;
        };
        let Some(table) = section_mut(doc.as_table_mut(), sections) else {
            continue;
        };

        table.insert(leaf, toml_edit::value(edit_value(&resolved.value)));
        if !entry.doc_lines().is_empty()
            && let Some(mut key) = table.key_mut(leaf)
        {
            let comment: String = entry
                .doc_lines()
                .iter()
                .map(|line| format!("# {line}\n"))
                .collect();
            key.leaf_decor_mut().set_prefix(comment);
        }
    }

    doc.to_string()
}

/// Walk (creating as needed) to the table for `sections`.
fn section_mut<'a>(root: &'a mut Table, sections: &[&str]) -> Option<&'a mut Table> {
    let mut current = root;
    for section in sections {
        current = current
            .entry(section)
            .or_insert_with(|| {
                let mut table = Table::new();
                table.decor_mut().set_prefix("\n");
                Item::Table(table)
            })
            .as_table_mut()?;
    }
    Some(current)
}

fn edit_value(value: &Value) -> toml_edit::Value {
    match value {
        Value::String(s) => toml_edit::Value::from(s.as_str()),
        Value::Int32(i) => toml_edit::Value::from(i64::from(*i)),
        Value::Bool(b) => toml_edit::Value::from(*b),
    }
}

fn render_error(format: Format, err: impl std::fmt::Display) -> LayerfigError {
    LayerfigError::InvalidValue {
        key: format!("<{format} output>"),
        reason: err.to_string(),
    }
}

/// Where `init` writes: `explicit` if given, otherwise `{stem}.{ext}` in the
/// current directory.
///
/// An explicit path without an extension gets the format's extension
/// appended. An explicit path with an extension keeps it, and the extension
/// then decides the format; an unsupported one fails with
/// [`LayerfigError::UnsupportedFormat`].
pub fn init_target(
    explicit: Option<&Path>,
    stem: &str,
    format: Format,
) -> Result<(PathBuf, Format), LayerfigError> {
    match explicit {
        None => Ok((
            PathBuf::from(format!("{stem}.{}", format.extension())),
            format,
        )),
        Some(path) => match path.extension() {
            None => Ok((path.with_extension(format.extension()), format)),
            Some(ext) => {
                let format = Format::from_path(path).ok_or_else(|| {
                    LayerfigError::UnsupportedFormat {
                        given: ext.to_string_lossy().into_owned(),
                    }
                })?;
                Ok((path.to_path_buf(), format))
            }
        },
    }
}

/// I/O wrapper: render and write to a new file at `path`.
///
/// Fails with [`LayerfigError::AlreadyExists`] if anything is already there,
/// leaving it untouched.
pub fn write(
    snapshot: &Snapshot,
    path: &Path,
    format: Format,
) -> Result<ConfigResult, LayerfigError> {
    let content = render(snapshot, format)?;

    if path.exists() {
        return Err(LayerfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LayerfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => LayerfigError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => LayerfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

    write_or_remove(file, path, content.as_bytes())?;

    tracing::info!(path = %path.display(), %format, "config file written");

    Ok(ConfigResult::Written {
        path: path.to_path_buf(),
        format,
        snapshot: snapshot.clone(),
    })
}

/// Write `content` to the freshly created `path`, deleting it again if the
/// write fails so no partial file is left behind.
fn write_or_remove(
    mut writer: impl Write,
    path: &Path,
    content: &[u8],
) -> Result<(), LayerfigError> {
    let result = writer.write_all(content).and_then(|()| writer.flush());
    drop(writer);
    result.map_err(|e| {
        if let Err(cleanup) = std::fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %cleanup,
                "could not remove partial config file"
            );
        }
        LayerfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
