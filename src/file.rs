//! Config file discovery, parsing and strict key checking.
//!
//! # Discovery
//!
//! An explicitly requested file must exist, or loading fails with
//! [`FileNotFound`](LayerfigError::FileNotFound). Without one, each
//! [`SearchPath`] is resolved to a directory and probed for `{stem}.{ext}`
//! for every supported extension (`toml`, `json`, `yaml`, `yml`, in that
//! order; the first one present in a directory is used). Search paths are
//! **priority-ascending**: the last entry wins.
//!
//! - [`SearchMode::FirstMatch`]: only the highest-priority file found is read.
//! - [`SearchMode::Merge`]: every file found is read and layered.
//!
//! Finding nothing is not an error: the file layer is simply empty.
//!
//! # Parsing
//!
//! All three formats are parsed into a common JSON tree, then walked to
//! collect scalar leaves by dotted path. Paths are matched against each
//! entry's file key. In strict mode, paths that match no entry are reported
//! with their line number when it can be found.

use std::path::{Path, PathBuf};

use serde_json::Value as Json;

use crate::error::{LayerfigError, Location};
use crate::schema::Schema;
use crate::source::{RawMap, Source};
use crate::types::{Format, Origin, SearchMode, SearchPath};
use crate::value::RawValue;

/// A config file read from disk, not yet parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub format: Format,
    pub content: String,
}

/// The file layer plus the files that contributed to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileLayer {
    pub map: RawMap,
    pub paths: Vec<PathBuf>,
}

/// Reads the config file layer, from an explicit path or by searching.
#[derive(Debug, Clone)]
pub struct FileSource {
    explicit: Option<PathBuf>,
    format: Option<Format>,
    stem: String,
    app_name: String,
    search_paths: Vec<SearchPath>,
    mode: SearchMode,
    strict: bool,
}

impl FileSource {
    /// Read exactly `path`; it must exist.
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
            ..Self::search(Vec::new(), "config", "")
        }
    }

    /// Probe `search_paths` for `{stem}.{ext}`. `app_name` names the platform
    /// config directory.
    pub fn search(search_paths: Vec<SearchPath>, stem: &str, app_name: &str) -> Self {
        Self {
            explicit: None,
            format: None,
            stem: stem.to_string(),
            app_name: app_name.to_string(),
            search_paths,
            mode: SearchMode::default(),
            strict: true,
        }
    }

    /// Force the format instead of inferring it from the extension. When
    /// searching, only that format's extension is probed.
    pub fn format(mut self, format: Option<Format>) -> Self {
        self.format = format;
        self
    }

    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject keys that match no schema entry (default: `true`).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Locate and read the files for this layer, in priority order.
    pub fn load(&self) -> Result<Vec<LoadedFile>, LayerfigError> {
        if let Some(path) = &self.explicit {
            return load_explicit(path, self.format).map(|f| vec![f]);
        }

        let dirs = expand_search_paths(&self.search_paths, &self.app_name);
        let formats: Vec<Format> = match self.format {
            Some(f) => vec![f],
            None => Format::ALL.to_vec(),
        };

        let files = match self.mode {
            SearchMode::Merge => load_all(&dirs, &self.stem, &formats)?,
            SearchMode::FirstMatch => load_first_match(&dirs, &self.stem, &formats)?,
        };

        if files.is_empty() {
            tracing::info!(
                stem = %self.stem,
                "no config file found, continuing with env/flags/defaults"
            );
        }
        Ok(files)
    }

    /// Read and parse the layer, keeping track of the files used.
    pub fn read(&self, schema: &Schema) -> Result<FileLayer, LayerfigError> {
        let mut layer = FileLayer::default();
        for file in self.load()? {
            tracing::info!(path = %file.path.display(), format = %file.format, "using config file");
            let map = parse_file(schema, &file, self.strict)?;
            layer.map.extend(map);
            layer.paths.push(file.path);
        }
        Ok(layer)
    }
}

impl Source for FileSource {
    fn origin(&self) -> Origin {
        Origin::File
    }

    fn collect(&self, schema: &Schema) -> Result<RawMap, LayerfigError> {
        self.read(schema).map(|layer| layer.map)
    }
}

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Resolve all search paths, skipping the ones that cannot be resolved.
pub fn expand_search_paths(search_paths: &[SearchPath], app_name: &str) -> Vec<PathBuf> {
    search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
        .collect()
}

fn load_explicit(path: &Path, format: Option<Format>) -> Result<LoadedFile, LayerfigError> {
    let format = match format.or_else(|| Format::from_path(path)) {
        Some(f) => f,
        None => {
            let given = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "<none>".into());
            return Err(LayerfigError::UnsupportedFormat { given });
        }
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(LoadedFile {
            path: path.to_path_buf(),
            format,
            content,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LayerfigError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(LayerfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Read the first `{stem}.{ext}` present in `dir`, trying `formats` in order.
fn read_in_dir(
    dir: &Path,
    stem: &str,
    formats: &[Format],
) -> Result<Option<LoadedFile>, LayerfigError> {
    for &format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                return Ok(Some(LoadedFile {
                    path,
                    format,
                    content,
                }));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(LayerfigError::IoError { path, source: e }),
        }
    }
    Ok(None)
}

/// Load all config files found across directories (for Merge mode).
fn load_all(
    dirs: &[PathBuf],
    stem: &str,
    formats: &[Format],
) -> Result<Vec<LoadedFile>, LayerfigError> {
    let mut results = Vec::new();
    for dir in dirs {
        if let Some(file) = read_in_dir(dir, stem, formats)? {
            results.push(file);
        }
    }
    Ok(results)
}

/// Load only the highest-priority config file found (for FirstMatch mode).
///
/// Searches from the end of the directory list (highest priority) backward.
fn load_first_match(
    dirs: &[PathBuf],
    stem: &str,
    formats: &[Format],
) -> Result<Vec<LoadedFile>, LayerfigError> {
    for dir in dirs.iter().rev() {
        if let Some(file) = read_in_dir(dir, stem, formats)? {
            return Ok(vec![file]);
        }
    }
    Ok(vec![])
}

/// Parse a loaded file into the file layer's raw mapping.
pub fn parse_file(
    schema: &Schema,
    file: &LoadedFile,
    strict: bool,
) -> Result<RawMap, LayerfigError> {
    let tree = parse_document(&file.content, &file.path, file.format)?;

    let mut leaves = Vec::new();
    collect_leaves(schema, &tree, "", &mut leaves);

    let mut map = RawMap::new();
    let mut unknown = Vec::new();
    for (path, value) in leaves {
        match schema.by_file_key(&path) {
            Some(entry) => {
                if matches!(value, Json::Array(_) | Json::Object(_)) {
                    return Err(LayerfigError::TypeMismatch {
                        key: entry.key().to_string(),
                        raw: value.to_string(),
                        expected: entry.value_type(),
                    });
                }
                map.insert(entry.key().to_string(), raw_from_json(value));
            }
            None if strict => {
                let line = find_key_line(&file.content, &path, file.format);
                unknown.push(LayerfigError::UnknownKey {
                    key: path,
                    path: file.path.clone(),
                    line,
                });
            }
            None => tracing::debug!(key = %path, path = %file.path.display(), "ignoring unknown key"),
        }
    }

    if !unknown.is_empty() {
        return Err(LayerfigError::UnknownKeys(unknown));
    }
    Ok(map)
}

/// Parse `content` as `format` into a JSON tree whose root is an object.
pub fn parse_document(content: &str, path: &Path, format: Format) -> Result<Json, LayerfigError> {
    let parse_error = |location: Option<Location>, message: String| LayerfigError::ParseError {
        path: path.to_path_buf(),
        format,
        location,
        message,
    };

    let tree = match format {
        Format::Toml => toml::from_str::<Json>(content).map_err(|e| {
            let location = e.span().map(|span| location_of(content, span.start));
            parse_error(location, e.message().to_string())
        })?,
        Format::Json => serde_json::from_str::<Json>(content).map_err(|e| {
            let location = (e.line() > 0).then(|| Location {
                line: e.line(),
                column: e.column(),
            });
            parse_error(location, e.to_string())
        })?,
        Format::Yaml | Format::Yml => serde_yaml::from_str::<Json>(content).map_err(|e| {
            let location = e.location().map(|l| Location {
                line: l.line(),
                column: l.column(),
            });
            parse_error(location, e.to_string())
        })?,
    };

    match tree {
        Json::Object(_) => Ok(tree),
        // An empty YAML document.
        Json::Null => Ok(Json::Object(Default::default())),
        other => Err(parse_error(
            None,
            format!("expected a table at the top level, found {}", json_kind(&other)),
        )),
    }
}

/// Walk the tree collecting `(dotted path, leaf)` pairs. Objects are recursed
/// into, except when their path is itself a schema key or when they are empty
/// and name no schema section: those are kept as a leaf. Nulls are skipped.
fn collect_leaves<'a>(
    schema: &Schema,
    node: &'a Json,
    prefix: &str,
    out: &mut Vec<(String, &'a Json)>,
) {
    let Json::Object(map) = node else {
        return;
    };
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Json::Null => {}
            Json::Object(children) if schema.by_file_key(&path).is_none() => {
                if children.is_empty() && !schema.is_section(&path) {
                    out.push((path, value));
                } else {
                    collect_leaves(schema, value, &path, out);
                }
            }
            _ => out.push((path, value)),
        }
    }
}

/// Scalars map to their raw counterpart. Floats become text, which coercion
/// rejects for non-string entries.
fn raw_from_json(value: &Json) -> RawValue {
    match value {
        Json::String(s) => RawValue::Str(s.clone()),
        Json::Bool(b) => RawValue::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => RawValue::Str(n.to_string()),
        },
        other => RawValue::Str(other.to_string()),
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "a table",
    }
}

fn location_of(content: &str, offset: usize) -> Location {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    Location { line, column }
}

/// Find the 1-indexed line on which a dotted key is defined.
///
/// TOML is scanned section-aware: for `"database.typo"` only a `typo = ...`
/// under a `[database]` header matches. JSON and YAML fall back to the first
/// line that assigns the leaf name (`"typo":` or `typo:`). Best effort;
/// returns `None` if nothing matches.
fn find_key_line(content: &str, dotted_key: &str, format: Format) -> Option<usize> {
    match format {
        Format::Toml => find_toml_key_line(content, dotted_key),
        Format::Json | Format::Yaml | Format::Yml => {
            let leaf = dotted_key.rsplit('.').next().unwrap_or(dotted_key);
            content.lines().position(|line| {
                let trimmed = line.trim_start().trim_start_matches("- ");
                let rest = trimmed
                    .strip_prefix('"')
                    .and_then(|t| t.strip_prefix(leaf))
                    .and_then(|t| t.strip_prefix('"'))
                    .or_else(|| trimmed.strip_prefix(leaf));
                rest.is_some_and(|r| r.trim_start().starts_with(':'))
            })
            .map(|i| i + 1)
        }
    }
}

fn find_toml_key_line(content: &str, dotted_key: &str) -> Option<usize> {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let (leaf, expected_section) = segments.split_last()?;

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            if current_section == segments {
                return Some(i + 1);
            }
            continue;
        }

        let in_right_section = expected_section.len() == current_section.len()
            && expected_section
                .iter()
                .zip(&current_section)
                .all(|(a, b)| *a == b);

        if in_right_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return Some(i + 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::test_schema;
    use crate::value::ValueType;
    use std::fs;
    use tempfile::TempDir;

    fn loaded(format: Format, content: &str) -> LoadedFile {
        LoadedFile {
            path: PathBuf::from(format!("/test/config.{format}")),
            format,
            content: content.into(),
        }
    }

    fn parse(format: Format, content: &str) -> Result<RawMap, LayerfigError> {
        parse_file(&test_schema(), &loaded(format, content), true)
    }

    // --- parsing ---

    #[test]
    fn toml_sections_map_to_dotted_keys() {
        let map = parse(
            Format::Toml,
            "host = \"0.0.0.0\"\nport = 9090\n[database]\npool_size = 20\n",
        )
        .unwrap();
        assert_eq!(map["host"], RawValue::Str("0.0.0.0".into()));
        assert_eq!(map["port"], RawValue::Int(9090));
        assert_eq!(map["database.pool_size"], RawValue::Int(20));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn json_nested_objects() {
        let map = parse(
            Format::Json,
            r#"{"debug": true, "database": {"url": "pg://x"}}"#,
        )
        .unwrap();
        assert_eq!(map["debug"], RawValue::Bool(true));
        assert_eq!(map["database.url"], RawValue::Str("pg://x".into()));
    }

    #[test]
    fn yaml_nested_mappings() {
        let map = parse(Format::Yml, "port: 7000\ndatabase:\n  pool_size: 3\n").unwrap();
        assert_eq!(map["port"], RawValue::Int(7000));
        assert_eq!(map["database.pool_size"], RawValue::Int(3));
    }

    #[test]
    fn empty_documents_are_empty_layers() {
        assert!(parse(Format::Toml, "").unwrap().is_empty());
        assert!(parse(Format::Yaml, "").unwrap().is_empty());
        assert!(parse(Format::Json, "{}").unwrap().is_empty());
    }

    #[test]
    fn float_leaf_becomes_text_and_fails_int_coercion() {
        use crate::merge::Layers;
        use crate::resolve::Resolver;

        let map = parse(Format::Json, r#"{"port": 80.5}"#).unwrap();
        assert_eq!(map["port"], RawValue::Str("80.5".into()));

        let layers = Layers {
            file: map,
            ..Layers::default()
        };
        let err = Resolver::new(test_schema()).resolve(&layers).unwrap_err();
        assert!(matches!(err, LayerfigError::TypeMismatch { ref key, .. } if key == "port"));
    }

    #[test]
    fn array_for_string_key_is_type_mismatch() {
        let err = parse(Format::Toml, "host = [\"a\", \"b\"]\n").unwrap_err();
        match err {
            LayerfigError::TypeMismatch { key, raw, expected } => {
                assert_eq!(key, "host");
                assert_eq!(raw, "[\"a\",\"b\"]");
                assert_eq!(expected, ValueType::String);
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn table_for_string_key_is_type_mismatch() {
        let err = parse(Format::Toml, "[database.url]\nx = 1\n").unwrap_err();
        assert!(
            matches!(err, LayerfigError::TypeMismatch { ref key, .. } if key == "database.url")
        );
    }

    #[test]
    fn datetime_for_string_key_is_type_mismatch() {
        let err = parse(Format::Toml, "host = 1979-05-27T07:32:00Z\n").unwrap_err();
        assert!(matches!(err, LayerfigError::TypeMismatch { ref key, .. } if key == "host"));
    }

    #[test]
    fn table_at_int_leaf_is_type_mismatch() {
        let err = parse(Format::Toml, "[port]\nx = 1\n").unwrap_err();
        assert!(matches!(
            err,
            LayerfigError::TypeMismatch {
                expected: ValueType::Int32,
                ..
            }
        ));
    }

    #[test]
    fn null_is_no_opinion() {
        let map = parse(Format::Yaml, "host: ~\nport: 1\n").unwrap();
        assert!(!map.contains_key("host"));
        assert_eq!(map["port"], RawValue::Int(1));
    }

    #[test]
    fn custom_file_key_is_honored() {
        use crate::schema::{Schema, SchemaEntry};
        let schema = Schema::builder()
            .register(SchemaEntry::new("web.port", 8080).file_key("http.listen_port"))
            .unwrap()
            .build();
        let file = loaded(Format::Toml, "[http]\nlisten_port = 1\n");
        let map = parse_file(&schema, &file, true).unwrap();
        assert_eq!(map["web.port"], RawValue::Int(1));
    }

    // --- parse errors ---

    #[test]
    fn malformed_toml_reports_line() {
        let err = parse(Format::Toml, "host = \"x\"\nport = = 3\n").unwrap_err();
        match err {
            LayerfigError::ParseError {
                format, location, ..
            } => {
                assert_eq!(format, Format::Toml);
                assert_eq!(location.unwrap().line, 2);
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_reports_line() {
        let err = parse(Format::Json, "{\n  \"port\": ,\n}").unwrap_err();
        match err {
            LayerfigError::ParseError { location, .. } => {
                assert_eq!(location.unwrap().line, 2);
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse(Format::Yaml, "port: [1, 2\n").unwrap_err();
        assert!(matches!(err, LayerfigError::ParseError { .. }));
    }

    #[test]
    fn scalar_root_is_parse_error() {
        let err = parse(Format::Json, "42").unwrap_err();
        match err {
            LayerfigError::ParseError { message, .. } => assert!(message.contains("a number")),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    // --- strict mode ---

    #[test]
    fn strict_rejects_unknown_keys_with_lines() {
        let err = parse(Format::Toml, "host = \"x\"\ntypo_key = 42\n").unwrap_err();
        match err {
            LayerfigError::UnknownKeys(keys) => {
                assert_eq!(keys.len(), 1);
                match &keys[0] {
                    LayerfigError::UnknownKey { key, line, .. } => {
                        assert_eq!(key, "typo_key");
                        assert_eq!(*line, Some(2));
                    }
                    other => panic!("Expected UnknownKey, got: {other:?}"),
                }
            }
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn strict_reports_every_unknown_key() {
        let err = parse(Format::Toml, "typo1 = 1\ntypo2 = 2\n").unwrap_err();
        match err {
            LayerfigError::UnknownKeys(keys) => assert_eq!(keys.len(), 2),
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn strict_nested_unknown_key_in_yaml() {
        let err = parse(Format::Yaml, "database:\n  url: x\n  typo: y\n").unwrap_err();
        match err {
            LayerfigError::UnknownKeys(keys) => match &keys[0] {
                LayerfigError::UnknownKey { key, line, .. } => {
                    assert_eq!(key, "database.typo");
                    assert_eq!(*line, Some(3));
                }
                other => panic!("Expected UnknownKey, got: {other:?}"),
            },
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn strict_rejects_unknown_empty_section() {
        let err = parse(Format::Toml, "host = \"x\"\n[extra]\n").unwrap_err();
        match err {
            LayerfigError::UnknownKeys(keys) => match &keys[0] {
                LayerfigError::UnknownKey { key, line, .. } => {
                    assert_eq!(key, "extra");
                    assert_eq!(*line, Some(2));
                }
                other => panic!("Expected UnknownKey, got: {other:?}"),
            },
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn empty_known_section_is_accepted() {
        let map = parse(Format::Toml, "[database]\n").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn lenient_ignores_unknown_keys() {
        let map = parse_file(
            &test_schema(),
            &loaded(Format::Toml, "typo = 1\nport = 3000\n"),
            false,
        )
        .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["port"], RawValue::Int(3000));
    }

    #[test]
    fn toml_line_finder_respects_sections() {
        let content = "host = \"x\"\nport = 8080\n[database]\ntypo = \"bad\"\n";
        assert_eq!(find_key_line(content, "database.typo", Format::Toml), Some(4));
        let content = "typo = 99\n[database]\npool_size = 5\n";
        assert_eq!(find_key_line(content, "typo", Format::Toml), Some(1));
        assert_eq!(find_key_line(content, "missing", Format::Toml), None);
    }

    #[test]
    fn json_line_finder() {
        let content = "{\n  \"host\": \"x\",\n  \"typo\": 1\n}";
        assert_eq!(find_key_line(content, "typo", Format::Json), Some(3));
    }

    // --- discovery ---

    #[test]
    fn explicit_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        let err = FileSource::explicit(&path).load().unwrap_err();
        assert!(matches!(err, LayerfigError::FileNotFound { path: p } if p == path));
    }

    #[test]
    fn explicit_without_extension_needs_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings");
        fs::write(&path, "port = 1\n").unwrap();

        let err = FileSource::explicit(&path).load().unwrap_err();
        assert!(matches!(err, LayerfigError::UnsupportedFormat { .. }));

        let files = FileSource::explicit(&path)
            .format(Some(Format::Toml))
            .load()
            .unwrap();
        assert_eq!(files[0].format, Format::Toml);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.conf");
        fs::write(&path, "{\"port\": 5}").unwrap();
        let layer = FileSource::explicit(&path)
            .format(Some(Format::Json))
            .read(&test_schema())
            .unwrap();
        assert_eq!(layer.map["port"], RawValue::Int(5));
        assert_eq!(layer.paths, vec![path]);
    }

    #[test]
    fn search_finds_any_supported_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "port: 1\n").unwrap();

        let source = FileSource::search(vec![SearchPath::Path(dir.path().into())], "config", "t");
        let files = source.load().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].format, Format::Yml);
    }

    #[test]
    fn search_prefers_toml_within_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();

        let source = FileSource::search(vec![SearchPath::Path(dir.path().into())], "config", "t");
        assert_eq!(source.load().unwrap()[0].format, Format::Toml);
    }

    #[test]
    fn search_with_forced_format_skips_others() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();

        let files = FileSource::search(vec![SearchPath::Path(dir.path().into())], "config", "t")
            .format(Some(Format::Json))
            .load()
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn search_nothing_found_is_empty() {
        let dir = TempDir::new().unwrap();
        let layer = FileSource::search(vec![SearchPath::Path(dir.path().into())], "config", "t")
            .read(&test_schema())
            .unwrap();
        assert!(layer.map.is_empty());
        assert!(layer.paths.is_empty());
    }

    #[test]
    fn first_match_uses_highest_priority() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("config.toml"), "port = 1\nhost = \"low\"\n").unwrap();
        fs::write(high.path().join("config.toml"), "port = 2\n").unwrap();

        let layer = FileSource::search(
            vec![
                SearchPath::Path(low.path().into()),
                SearchPath::Path(high.path().into()),
            ],
            "config",
            "t",
        )
        .read(&test_schema())
        .unwrap();
        assert_eq!(layer.map["port"], RawValue::Int(2));
        assert!(!layer.map.contains_key("host"));
        assert_eq!(layer.paths.len(), 1);
    }

    #[test]
    fn first_match_falls_back_to_lower_priority() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("config.toml"), "host = \"fallback\"\n").unwrap();

        let files = FileSource::search(
            vec![
                SearchPath::Path(low.path().into()),
                SearchPath::Path(high.path().into()),
            ],
            "config",
            "t",
        )
        .load()
        .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].content.contains("fallback"));
    }

    #[test]
    fn merge_layers_all_files() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("config.toml"), "port = 1\nhost = \"low\"\n").unwrap();
        fs::write(high.path().join("config.json"), "{\"port\": 2}").unwrap();

        let layer = FileSource::search(
            vec![
                SearchPath::Path(low.path().into()),
                SearchPath::Path(high.path().into()),
            ],
            "config",
            "t",
        )
        .mode(SearchMode::Merge)
        .read(&test_schema())
        .unwrap();
        assert_eq!(layer.map["port"], RawValue::Int(2));
        assert_eq!(layer.map["host"], RawValue::Str("low".into()));
        assert_eq!(layer.paths.len(), 2);
    }

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/configs");
        assert_eq!(resolve_search_path(&SearchPath::Path(p.clone()), "t"), Some(p));
    }

    #[test]
    fn location_of_offsets() {
        let content = "a\nbc\n";
        assert_eq!(location_of(content, 0), Location { line: 1, column: 1 });
        assert_eq!(location_of(content, 3), Location { line: 2, column: 2 });
    }
}
