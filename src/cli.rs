//! Clap adapter for layerfig.
//!
//! This module is the **optional integration layer** between layerfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! Two halves:
//!
//! - [`flag_args`] generates one `--flag` per schema entry, and
//!   [`flags_from_matches`] turns the parsed matches back into a
//!   [`FlagSource`]. Generated args carry no clap defaults, and only values
//!   whose source is the command line are kept, so an omitted flag never
//!   masks the file or environment layers.
//! - [`ConfigArgs`] and [`InitArgs`] are clap derive types for the `config`
//!   and `init` subcommands. Their `into_action()` methods convert parsed
//!   arguments into a [`ConfigAction`](crate::ConfigAction); from there all
//!   logic flows through the clap-free
//!   [`LayerfigBuilder::handle()`](crate::LayerfigBuilder::handle) API.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Args, Subcommand};

use crate::error::LayerfigError;
use crate::flags::FlagSource;
use crate::schema::Schema;
use crate::types::{ConfigAction, Format};
use crate::value::{RawValue, ValueType};

/// One optional `--flag` per schema entry, in registration order.
///
/// The first doc line becomes the help text. Boolean flags may be given
/// bare (`--debug`) or with a value (`--debug false`).
pub fn flag_args(schema: &Schema) -> Vec<Arg> {
    schema
        .entries()
        .map(|entry| {
            let mut arg = Arg::new(entry.flag().to_string())
                .long(entry.flag().to_string())
                .action(ArgAction::Set)
                .required(false);
            if let Some(short) = entry.short_flag() {
                arg = arg.short(short);
            }
            if let Some(help) = entry.doc_lines().first() {
                arg = arg.help(help.clone());
            }
            match entry.value_type() {
                ValueType::String => arg.value_parser(clap::value_parser!(String)),
                ValueType::Int32 => arg
                    .value_parser(clap::value_parser!(i32))
                    .allow_negative_numbers(true),
                ValueType::Bool => arg
                    .value_parser(BoolishValueParser::new())
                    .num_args(0..=1)
                    .default_missing_value("true"),
            }
        })
        .collect()
}

/// Collect the flags the user actually typed.
pub fn flags_from_matches(matches: &ArgMatches, schema: &Schema) -> FlagSource {
    schema.entries().fold(FlagSource::new(), |flags, entry| {
        let id = entry.flag();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            return flags;
        }
        let raw = match entry.value_type() {
            ValueType::String => matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .map(|s| RawValue::from(s.as_str())),
            ValueType::Int32 => matches
                .try_get_one::<i32>(id)
                .ok()
                .flatten()
                .map(|i| RawValue::from(*i)),
            ValueType::Bool => matches
                .try_get_one::<bool>(id)
                .ok()
                .flatten()
                .map(|b| RawValue::from(*b)),
        };
        flags.set(id, raw)
    })
}

/// Clap-derived args for the `config` subcommand group.
///
/// Embed this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every resolved value and where it came from.
    List,
    /// Show the resolved value, source and documentation for a config key.
    Get {
        /// Dotted key path (e.g. "web.port").
        key: String,
    },
}

impl ConfigArgs {
    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    ///
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
        }
    }
}

/// Clap-derived args for an `init` subcommand.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Config file format: toml, json, yaml or yml.
    #[arg(short = 't', long = "config-type", value_name = "TYPE", default_value = "toml")]
    pub config_type: String,
}

impl InitArgs {
    /// Validate the format and pair it with the target path.
    pub fn into_action(self, output: Option<PathBuf>) -> Result<ConfigAction, LayerfigError> {
        let format: Format = self.config_type.parse()?;
        Ok(ConfigAction::Init { output, format })
    }
}
