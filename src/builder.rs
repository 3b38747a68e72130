use std::path::PathBuf;
use std::sync::Arc;

use crate::env::EnvSource;
use crate::error::LayerfigError;
use crate::file::FileSource;
use crate::flags::FlagSource;
use crate::merge::Layers;
use crate::ops::{self, ConfigResult};
use crate::persist;
use crate::resolve::Resolver;
use crate::schema::Schema;
use crate::snapshot::Snapshot;
use crate::source::{DefaultsSource, Source};
use crate::types::{ConfigAction, Format, SearchMode, SearchPath};
use crate::validate::Validator;

/// Entry point for building a layerfig configuration.
pub struct Layerfig;

impl Layerfig {
    pub fn builder(schema: Arc<Schema>) -> LayerfigBuilder {
        LayerfigBuilder::new(schema)
    }
}

/// Builder that wires the source adapters for one invocation.
///
/// Controls where each layer comes from:
///
/// - **File**: [`config_file()`](Self::config_file) for an explicit path, or
///   [`search_paths()`](Self::search_paths) + [`file_stem()`](Self::file_stem)
///   for discovery, with [`search_mode()`](Self::search_mode) picking one file
///   or layering all of them.
/// - **Environment**: [`env_prefix()`](Self::env_prefix) or [`no_env()`](Self::no_env).
/// - **Flags**: [`flags()`](Self::flags).
#[derive(Debug, Clone)]
pub struct LayerfigBuilder {
    schema: Arc<Schema>,
    app_name: Option<String>,
    file_stem: Option<String>,
    config_file: Option<PathBuf>,
    file_format: Option<Format>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    env_prefix: Option<String>,
    env_enabled: bool,
    env_vars: Option<Vec<(String, String)>>,
    strict: bool,
    flags: FlagSource,
}

impl LayerfigBuilder {
    fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            app_name: None,
            file_stem: None,
            config_file: None,
            file_format: None,
            search_paths: None,
            search_mode: SearchMode::default(),
            env_prefix: None,
            env_enabled: true,
            env_vars: None,
            strict: true,
            flags: FlagSource::new(),
        }
    }

    /// Set the application name. This derives sensible defaults:
    /// - `search_paths` → `[Home(".{app_name}"), Cwd]`
    /// - `env_prefix` → `"{APP_NAME}"` (uppercased)
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the base file name probed during discovery (default: `"config"`).
    pub fn file_stem(mut self, stem: &str) -> Self {
        self.file_stem = Some(stem.to_string());
        self
    }

    /// Read exactly this file instead of searching. `None` keeps searching,
    /// which suits an optional `--config` argument.
    pub fn config_file<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.config_file = path.map(Into::into);
        self
    }

    /// Force the config file format instead of inferring it from the extension.
    pub fn file_format(mut self, format: Format) -> Self {
        self.file_format = Some(format);
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority. See [`SearchPath`] for the available variants.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    pub fn add_search_path(mut self, path: SearchPath) -> Result<Self, LayerfigError> {
        let mut paths = self.effective_search_paths()?;
        paths.push(path);
        self.search_paths = Some(paths);
        Ok(self)
    }

    /// Set the search mode (default: [`SearchMode::FirstMatch`]).
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Override the environment variable prefix (default: uppercased `app_name`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Read these variables instead of the process environment.
    pub fn env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env_vars = Some(vars.into_iter().collect());
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the flag layer.
    pub fn flags(mut self, flags: FlagSource) -> Self {
        self.flags = flags;
        self
    }

    fn effective_app_name(&self) -> Result<&str, LayerfigError> {
        self.app_name
            .as_deref()
            .ok_or(LayerfigError::AppNameRequired)
    }

    fn effective_file_stem(&self) -> &str {
        self.file_stem.as_deref().unwrap_or("config")
    }

    fn effective_search_paths(&self) -> Result<Vec<SearchPath>, LayerfigError> {
        if let Some(paths) = &self.search_paths {
            return Ok(paths.clone());
        }
        let app = self.effective_app_name()?;
        Ok(vec![SearchPath::Home(format!(".{app}")), SearchPath::Cwd])
    }

    /// Resolve the effective env prefix (None if env disabled).
    fn effective_env_prefix(&self) -> Result<Option<String>, LayerfigError> {
        if !self.env_enabled {
            return Ok(None);
        }
        if let Some(prefix) = &self.env_prefix {
            return Ok(Some(prefix.clone()));
        }
        let app = self.effective_app_name()?;
        Ok(Some(app.to_uppercase()))
    }

    fn file_source(&self) -> Result<FileSource, LayerfigError> {
        let source = match &self.config_file {
            Some(path) => FileSource::explicit(path),
            None => FileSource::search(
                self.effective_search_paths()?,
                self.effective_file_stem(),
                self.app_name.as_deref().unwrap_or_default(),
            )
            .mode(self.search_mode),
        };
        Ok(source.format(self.file_format).strict(self.strict))
    }

    fn env_source(&self) -> Result<Option<EnvSource>, LayerfigError> {
        let Some(prefix) = self.effective_env_prefix()? else {
            return Ok(None);
        };
        Ok(Some(match &self.env_vars {
            Some(vars) => EnvSource::with_vars(&prefix, vars.iter().cloned()),
            None => EnvSource::new(&prefix),
        }))
    }

    /// Collect all four layers.
    pub fn gather(&self) -> Result<Layers, LayerfigError> {
        let file = self.file_source()?.read(&self.schema)?;
        let env = self.env_source()?;
        Resolver::new(Arc::clone(&self.schema)).gather(
            file,
            env.as_ref().map(|e| e as &dyn Source),
            &self.flags,
        )
    }

    /// Load and resolve the configuration through all layers.
    pub fn load(&self) -> Result<Snapshot, LayerfigError> {
        let layers = self.gather()?;
        Resolver::new(Arc::clone(&self.schema)).resolve(&layers)
    }

    /// [`load`](Self::load), then run `validator`. Every failed check is
    /// reported in one [`LayerfigError::ValidationFailure`].
    pub fn load_validated(&self, validator: &Validator) -> Result<Snapshot, LayerfigError> {
        let snapshot = self.load()?;
        validator.validate(&snapshot).into_result()?;
        Ok(snapshot)
    }

    /// A snapshot of the schema defaults alone. No files, env or flags are read.
    pub fn defaults(&self) -> Result<Snapshot, LayerfigError> {
        let layers = Layers {
            defaults: DefaultsSource.collect(&self.schema)?,
            ..Default::default()
        };
        Resolver::new(Arc::clone(&self.schema)).resolve(&layers)
    }

    /// Handle a `ConfigAction` (init / list / get).
    pub fn handle(&self, action: &ConfigAction) -> Result<ConfigResult, LayerfigError> {
        match action {
            ConfigAction::Init { output, format } => {
                let (path, format) =
                    persist::init_target(output.as_deref(), self.effective_file_stem(), *format)?;
                persist::write(&self.defaults()?, &path, format)
            }
            ConfigAction::List => Ok(ops::list_values(&self.load()?)),
            ConfigAction::Get { key } => ops::get_value(&self.load()?, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{TestConfig, test_schema};
    use confique::Config;
    use crate::types::Origin;
    use std::fs;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn in_dir(dir: &TempDir) -> LayerfigBuilder {
        Layerfig::builder(test_schema())
            .app_name("test")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .env_vars(Vec::new())
    }

    #[test]
    fn app_name_sets_defaults() {
        let builder = Layerfig::builder(test_schema()).app_name("myapp");
        assert_eq!(builder.effective_file_stem(), "config");
        assert_eq!(
            builder.effective_env_prefix().unwrap(),
            Some("MYAPP".to_string())
        );
        assert_eq!(
            builder.effective_search_paths().unwrap(),
            vec![SearchPath::Home(".myapp".into()), SearchPath::Cwd]
        );
    }

    #[test]
    fn override_env_prefix() {
        let builder = Layerfig::builder(test_schema())
            .app_name("myapp")
            .env_prefix("CUSTOM");
        assert_eq!(
            builder.effective_env_prefix().unwrap(),
            Some("CUSTOM".to_string())
        );
    }

    #[test]
    fn no_env_disables_prefix() {
        let builder = Layerfig::builder(test_schema()).app_name("myapp").no_env();
        assert_eq!(builder.effective_env_prefix().unwrap(), None);
    }

    #[test]
    fn add_search_path_appends_to_defaults() {
        let builder = Layerfig::builder(test_schema())
            .app_name("myapp")
            .add_search_path(SearchPath::Path("/etc/myapp".into()))
            .unwrap();
        assert_eq!(
            builder.effective_search_paths().unwrap(),
            vec![
                SearchPath::Home(".myapp".into()),
                SearchPath::Cwd,
                SearchPath::Path("/etc/myapp".into()),
            ]
        );
    }

    #[test]
    fn missing_app_name_errors() {
        let result = Layerfig::builder(test_schema()).load();
        assert!(matches!(result, Err(LayerfigError::AppNameRequired)));
    }

    #[test]
    fn app_name_not_needed_when_everything_is_explicit() {
        let dir = TempDir::new().unwrap();
        let snap = Layerfig::builder(test_schema())
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(snap.get_i32("port"), Some(8080));
    }

    #[test]
    fn load_defaults_only() {
        let dir = TempDir::new().unwrap();
        let snap = in_dir(&dir).load().unwrap();
        let config: TestConfig = snap.extract().unwrap();
        assert_eq!(config, TestConfig::builder().load().unwrap());
        assert!(snap.files().is_empty());
    }

    #[test]
    fn load_with_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "port = 3000\n").unwrap();

        let snap = in_dir(&dir).load().unwrap();
        assert_eq!(snap.get_i32("port"), Some(3000));
        assert_eq!(snap.get_str("host"), Some("localhost"));
        assert_eq!(snap.files(), &[dir.path().join("config.toml")]);
    }

    #[test]
    fn custom_file_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.json"), "{\"port\": 4}").unwrap();

        let snap = in_dir(&dir).file_stem("site").load().unwrap();
        assert_eq!(snap.get_i32("port"), Some(4));
    }

    #[test]
    fn full_precedence_chain() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "port = 9090\nhost = \"file\"\ndebug = true\n",
        )
        .unwrap();

        let snap = in_dir(&dir)
            .env_vars(vars(&[("TEST_PORT", "7070"), ("TEST_HOST", "env")]))
            .flags(FlagSource::new().set("host", Some("flag")))
            .load()
            .unwrap();

        assert_eq!(snap.get_i32("port"), Some(7070));
        assert_eq!(snap.origin("port"), Some(Origin::Env));
        assert_eq!(snap.get_str("host"), Some("flag"));
        assert_eq!(snap.get_bool("debug"), Some(true));
        assert_eq!(snap.origin("debug"), Some(Origin::File));
        assert_eq!(snap.origin("database.url"), Some(Origin::Default));
    }

    #[test]
    fn explicit_config_file_skips_search() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "port = 1\n").unwrap();
        let explicit = other.path().join("custom.yaml");
        fs::write(&explicit, "port: 2\n").unwrap();

        let snap = in_dir(&dir).config_file(Some(&explicit)).load().unwrap();
        assert_eq!(snap.get_i32("port"), Some(2));
        assert_eq!(snap.files(), &[explicit]);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = in_dir(&dir).config_file(Some(&missing)).load().unwrap_err();
        assert!(matches!(err, LayerfigError::FileNotFound { .. }));
    }

    #[test]
    fn strict_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "typo = 1\n").unwrap();

        let err = in_dir(&dir).load().unwrap_err();
        assert!(matches!(err, LayerfigError::UnknownKeys(_)));
    }

    #[test]
    fn lenient_allows_unknown_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "typo = 1\nport = 2\n").unwrap();

        let snap = in_dir(&dir).strict(false).load().unwrap();
        assert_eq!(snap.get_i32("port"), Some(2));
    }

    #[test]
    fn merge_mode_combines_files() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("config.toml"), "host = \"low\"\nport = 1\n").unwrap();
        fs::write(high.path().join("config.toml"), "port = 2\n").unwrap();

        let snap = Layerfig::builder(test_schema())
            .no_env()
            .search_paths(vec![
                SearchPath::Path(low.path().to_path_buf()),
                SearchPath::Path(high.path().to_path_buf()),
            ])
            .search_mode(SearchMode::Merge)
            .load()
            .unwrap();
        assert_eq!(snap.get_str("host"), Some("low"));
        assert_eq!(snap.get_i32("port"), Some(2));
        assert_eq!(snap.files().len(), 2);
    }

    #[test]
    fn type_mismatch_from_env() {
        let dir = TempDir::new().unwrap();
        let err = in_dir(&dir)
            .env_vars(vars(&[("TEST_PORT", "abc")]))
            .load()
            .unwrap_err();
        assert!(matches!(err, LayerfigError::TypeMismatch { .. }));
    }

    #[test]
    fn load_validated_reports_all_failures() {
        let dir = TempDir::new().unwrap();
        let validator = Validator::new()
            .in_range("port", 1024, 65535)
            .one_of("host", &["localhost"]);

        let err = in_dir(&dir)
            .env_vars(vars(&[("TEST_PORT", "80"), ("TEST_HOST", "x")]))
            .load_validated(&validator)
            .unwrap_err();
        match err {
            LayerfigError::ValidationFailure(report) => assert_eq!(report.failures().len(), 2),
            other => panic!("Expected ValidationFailure, got {other:?}"),
        }

        assert!(in_dir(&dir).load_validated(&validator).is_ok());
    }

    #[test]
    fn defaults_ignore_every_layer() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "port = 1\n").unwrap();
        let snap = in_dir(&dir)
            .env_vars(vars(&[("TEST_HOST", "env")]))
            .defaults()
            .unwrap();
        assert_eq!(snap.get_i32("port"), Some(8080));
        assert_eq!(snap.get_str("host"), Some("localhost"));
    }

    #[test]
    fn handle_init_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let action = ConfigAction::Init {
            output: Some(target.clone()),
            format: Format::Json,
        };

        let result = in_dir(&dir)
            .env_vars(vars(&[("TEST_PORT", "1")]))
            .handle(&action)
            .unwrap();
        let written = dir.path().join("out.json");
        match result {
            ConfigResult::Written { path, format, snapshot } => {
                assert_eq!(path, written);
                assert_eq!(format, Format::Json);
                assert_eq!(snapshot.get_i32("port"), Some(8080));
            }
            other => panic!("Expected Written, got {other:?}"),
        }
        let content = fs::read_to_string(&written).unwrap();
        assert!(content.contains("\"port\": 8080"));
    }

    #[test]
    fn handle_init_refuses_second_write() {
        let dir = TempDir::new().unwrap();
        let action = ConfigAction::Init {
            output: Some(dir.path().join("config.toml")),
            format: Format::Toml,
        };
        let builder = in_dir(&dir);
        builder.handle(&action).unwrap();
        let err = builder.handle(&action).unwrap_err();
        assert!(matches!(err, LayerfigError::AlreadyExists { .. }));
    }

    #[test]
    fn handle_get() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "port = 3000\n").unwrap();

        let result = in_dir(&dir)
            .handle(&ConfigAction::Get { key: "port".into() })
            .unwrap();
        match result {
            ConfigResult::KeyValue { value, origin, .. } => {
                assert_eq!(value.as_i32(), Some(3000));
                assert_eq!(origin, Origin::File);
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn handle_list() {
        let dir = TempDir::new().unwrap();
        let result = in_dir(&dir).handle(&ConfigAction::List).unwrap();
        match result {
            ConfigResult::Listing { entries } => assert_eq!(entries.len(), 5),
            other => panic!("Expected Listing, got {other:?}"),
        }
    }
}
