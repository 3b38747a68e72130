//! Layered configuration for command-line applications: declare your keys
//! once, and resolve them from defaults, a config file, environment variables
//! and command-line flags into one typed snapshot.
//!
//! ```
//! use std::sync::Arc;
//! use layerfig::{FlagSource, Layerfig, Schema, SchemaEntry};
//!
//! let schema = Arc::new(
//!     Schema::builder()
//!         .register(SchemaEntry::new("log_level", "info"))?
//!         .register(SchemaEntry::new("web.port", 8080))?
//!         .build(),
//! );
//!
//! let config = Layerfig::builder(schema)
//!     .search_paths(vec![])
//!     .no_env()
//!     .flags(FlagSource::new().set("web-port", Some(9000)))
//!     .load()?;
//!
//! assert_eq!(config.get_i32("web.port"), Some(9000));
//! assert_eq!(config.get_str("log_level"), Some("info"));
//! # Ok::<(), layerfig::LayerfigError>(())
//! ```
//!
//! # Design: the schema as source of truth
//!
//! A [`Schema`] lists every key with its default, and the default fixes the
//! key's type (string, int32 or bool). Each entry also carries the name it
//! goes by in every source, derived from the dotted key unless overridden:
//!
//! | Key | File | Env (prefix `MYSITE`) | Flag |
//! |-----|------|-----------------------|------|
//! | `log_level` | `log_level` | `MYSITE_LOG_LEVEL` | `--log-level` |
//! | `web.port` | `[web] port` | `MYSITE_WEB_PORT` | `--web-port` |
//!
//! Schemas can be written by hand with [`SchemaEntry`], or derived from a
//! confique config struct with [`SchemaBuilder::from_config`]: `///` doc
//! comments become help text and TOML comments, `#[config(nested)]` structs
//! become sections. Once [`build()`](SchemaBuilder::build) is called the
//! schema is sealed and can be shared behind an `Arc`.
//!
//! # Layer precedence
//!
//! ```text
//! Defaults              SchemaEntry default
//!        ↑ overridden by
//! Config file           explicit path, or found by searching
//!        ↑ overridden by
//! Environment vars      PREFIX_KEY
//!        ↑ overridden by
//! Flags                 only flags the user actually typed
//! ```
//!
//! Every layer except defaults is **sparse**: it only holds the keys it has
//! an opinion about, and everything else falls through. The winning raw
//! value for each key is then coerced into the key's type; a value that
//! cannot be coerced fails the whole resolution with
//! [`TypeMismatch`](LayerfigError::TypeMismatch). The resulting [`Snapshot`]
//! is complete and immutable, and remembers which layer won each key.
//!
//! # Config files
//!
//! TOML, JSON and YAML (`.yaml` or `.yml`) are supported. The format comes
//! from the extension unless [`file_format()`](LayerfigBuilder::file_format)
//! forces one.
//!
//! Without an explicit [`config_file()`](LayerfigBuilder::config_file), the
//! builder searches [`SearchPath`]s in **priority-ascending** order (last =
//! highest) for `config.{toml,json,yaml,yml}`. The default list is
//! `[Home(".{app}"), Cwd]`. [`SearchMode::FirstMatch`] (default) reads only
//! the highest-priority file; [`SearchMode::Merge`] layers all of them.
//! Finding nothing is fine: the file layer is simply empty.
//!
//! Strict mode is **on by default**. When a config file contains a key that
//! doesn't match any schema entry, loading fails with the file path, key
//! name, and line number:
//!
//! ```text
//! Unknown key 'web.prot' in /home/user/.mysite/config.toml (line 5)
//! ```
//!
//! # Validation
//!
//! Type checks happen during resolution. Everything else (allowed values,
//! ranges, cross-field rules) goes through a [`Validator`], whose checks all
//! run so that one error lists every problem.
//!
//! # Persistence
//!
//! [`persist::write`] renders a snapshot as TOML (with doc comments), JSON or
//! YAML and writes it to a new file. It never overwrites an existing file.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) generates one
//! clap `Arg` per schema entry and reads back only the values that came from
//! the command line, plus derive types for `init` and `config list|get`
//! subcommands. Without clap, build a [`FlagSource`] and [`ConfigAction`]s
//! by hand:
//!
//! ```toml
//! layerfig = { version = "...", default-features = false }
//! ```
//!
//! # Error handling
//!
//! All fallible operations return [`LayerfigError`]. Errors are designed to
//! be user-facing. See the [`error`] module for the full set.

pub mod error;
pub mod file;
pub mod persist;
pub mod types;
pub mod value;

mod builder;
#[cfg(feature = "clap")]
pub mod cli;
mod env;
mod flags;
mod merge;
mod ops;
mod resolve;
mod schema;
mod snapshot;
mod source;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Layerfig, LayerfigBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand, InitArgs, flag_args, flags_from_matches};
pub use env::EnvSource;
pub use error::{LayerfigError, Location};
pub use file::{FileLayer, FileSource};
pub use flags::FlagSource;
pub use merge::Layers;
pub use ops::{ConfigResult, ListEntry, get_value, list_values};
pub use resolve::Resolver;
pub use schema::{Schema, SchemaBuilder, SchemaEntry};
pub use snapshot::{Resolved, Snapshot};
pub use source::{DefaultsSource, RawMap, Source};
pub use types::{ConfigAction, Format, Origin, SearchMode, SearchPath};
pub use validate::{ValidationReport, Validator, Violation};
pub use value::{RawValue, Value, ValueType};
