//! # mysite
//!
//! A sample site CLI whose configuration is resolved by layerfig from
//! defaults, a config file, `MYSITE_*` environment variables and flags.
//!
//! ```sh
//! mysite serve                          # defaults
//! mysite init -t yaml                   # write config.yaml with the defaults
//! MYSITE_WEB_PORT=9000 mysite serve     # env overrides the file
//! mysite serve --web-port 9001          # flags override everything
//! mysite config get web.port            # value, source and docs
//! ```

mod site;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches, value_parser};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use layerfig::{
    ConfigArgs, ConfigResult, InitArgs, Layerfig, LayerfigBuilder, LayerfigError, Schema,
    flag_args, flags_from_matches,
};

use site::SiteConfig;

fn cli(schema: &Schema) -> Command {
    Command::new(site::APP_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("A sample site with layered configuration")
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: config.{toml,json,yaml,yml} in $HOME/.mysite or the current directory)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose logging (sets log level to DEBUG)"),
        )
        .subcommand(
            Command::new("serve")
                .visible_alias("s")
                .about("Starts the web server")
                .args(flag_args(schema)),
        )
        .subcommand(InitArgs::augment_args(
            Command::new("init")
                .visible_alias("i")
                .about("Creates a config file with the default values"),
        ))
        .subcommand(ConfigArgs::augment_args(
            Command::new("config").about("Shows resolved configuration values"),
        ))
}

fn init_tracing(verbose: bool) {
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn builder(schema: &Arc<Schema>, matches: &ArgMatches) -> LayerfigBuilder {
    Layerfig::builder(Arc::clone(schema))
        .app_name(site::APP_NAME)
        .config_file(matches.get_one::<PathBuf>("config").cloned())
}

fn load_dotenv() -> Result<(), LayerfigError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded .env");
            Ok(())
        }
        Err(e) if e.not_found() => {
            tracing::info!("No .env file found (that's okay)");
            Ok(())
        }
        Err(e) => Err(LayerfigError::InvalidValue {
            key: ".env".into(),
            reason: e.to_string(),
        }),
    }
}

fn serve(schema: &Arc<Schema>, matches: &ArgMatches) -> Result<(), LayerfigError> {
    load_dotenv()?;

    let snapshot = builder(schema, matches)
        .flags(flags_from_matches(matches, schema))
        .load_validated(&site::serve_checks())?;

    if let Some(path) = snapshot.config_file() {
        println!("Using config file: {}", path.display());
    }

    let config: SiteConfig = snapshot.extract()?;
    println!("Log Level: '{}'", config.log_level);
    println!("Admin Email: '{}'", config.admin_email);
    println!("API Address: '{}'", config.api.address);
    println!("API Port: '{}'", config.api.port);
    println!("Web Address: '{}'", config.web.address);
    println!("Web Port: '{}'", config.web.port);
    Ok(())
}

fn init(schema: &Arc<Schema>, matches: &ArgMatches) -> Result<(), LayerfigError> {
    let output = matches.get_one::<PathBuf>("config").cloned();
    let action = InitArgs::from_arg_matches(matches)?.into_action(output)?;

    let result = builder(schema, matches).handle(&action)?;
    println!("{result}");

    if let ConfigResult::Written { snapshot, .. } = &result {
        let config: SiteConfig = snapshot.extract()?;
        let json =
            serde_json::to_string_pretty(&config).map_err(|e| LayerfigError::InvalidValue {
                key: "<final config>".into(),
                reason: e.to_string(),
            })?;
        println!("Final Config:");
        println!("{json}");
    }
    Ok(())
}

fn config(schema: &Arc<Schema>, matches: &ArgMatches) -> Result<(), LayerfigError> {
    load_dotenv()?;

    let action = ConfigArgs::from_arg_matches(matches)?.into_action();
    let result = builder(schema, matches).handle(&action)?;
    println!("{result}");
    Ok(())
}

fn run(schema: &Arc<Schema>, matches: &ArgMatches) -> Result<(), LayerfigError> {
    match matches.subcommand() {
        Some(("serve", sub)) => serve(schema, sub),
        Some(("init", sub)) => init(schema, sub),
        Some(("config", sub)) => config(schema, sub),
        _ => Ok(()),
    }
}

fn main() -> ExitCode {
    let schema = match site::schema() {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let matches = match cli(&schema).try_get_matches() {
        Ok(matches) => matches,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let err = LayerfigError::from(e);
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    let verbose = matches
        .subcommand()
        .is_some_and(|(_, sub)| sub.get_flag("verbose"));
    init_tracing(verbose);

    match run(&schema, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
