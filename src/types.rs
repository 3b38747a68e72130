use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::LayerfigError;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".mysite")`.
    Home(String),
    /// Current working directory.
    Cwd,
    /// An explicit absolute path.
    Path(PathBuf),
}

/// What to do when more than one search path holds a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Layer every file found; higher-priority files override lower ones key by key.
    Merge,
    /// Use only the highest-priority file found.
    #[default]
    FirstMatch,
}

/// On-disk config format. `Yaml` and `Yml` share a syntax and differ only in
/// the file extension they produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Toml,
    Json,
    Yaml,
    Yml,
}

impl Format {
    /// All supported formats, in discovery order.
    pub const ALL: [Format; 4] = [Format::Toml, Format::Json, Format::Yaml, Format::Yml];

    pub fn name(self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Yml => "yml",
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        self.name()
    }

    /// Comma-separated list of accepted format names, for error messages.
    pub fn allowed() -> String {
        Format::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Infer the format from a path's extension, if it has a recognized one.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for Format {
    type Err = LayerfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LayerfigError::UnsupportedFormat { given: s.into() })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which layer supplied a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    Default,
    File,
    Env,
    Flag,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Default => "default",
            Origin::File => "file",
            Origin::Env => "env",
            Origin::Flag => "flag",
        })
    }
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Write the defaults to a new config file.
    Init {
        output: Option<PathBuf>,
        format: Format,
    },
    List,
    Get {
        key: String,
    },
}
