//! Configuration for the `mysite` application.
//!
//! [`SiteConfig`] is the schema: every field becomes a key, with its
//! `#[config(default)]` as the default and its first doc line as the flag's
//! help text.
//!
//! | Key | Env var | Flag |
//! |-----|---------|------|
//! | `log_level` | `MYSITE_LOG_LEVEL` | `-l`, `--log-level` |
//! | `admin_email` | `MYSITE_ADMIN_EMAIL` | `-a`, `--admin-email` |
//! | `web.address` | `MYSITE_WEB_ADDRESS` | `--web-address` |
//! | `web.port` | `MYSITE_WEB_PORT` | `--web-port` |
//! | `api.address` | `MYSITE_API_ADDRESS` | `--api-address` |
//! | `api.port` | `MYSITE_API_PORT` | `--api-port` |

use std::sync::Arc;

use confique::Config;
use serde::{Deserialize, Serialize};

use layerfig::{LayerfigError, Schema, SchemaBuilder, Validator};

pub const APP_NAME: &str = "mysite";

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct SiteConfig {
    /// Log level: info, warn, error, debug.
    #[config(default = "info")]
    pub log_level: String,

    /// Site admin email.
    #[config(default = "webmaster@mysite.com")]
    pub admin_email: String,

    /// Public web server.
    #[config(nested)]
    pub web: WebConfig,

    /// Remote API server.
    #[config(nested)]
    pub api: ApiConfig,
}

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct WebConfig {
    /// Web server address.
    #[config(default = "0.0.0.0")]
    pub address: String,

    /// Web server port: [1024, 65535].
    #[config(default = 8080)]
    pub port: i32,
}

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct ApiConfig {
    /// API server address.
    #[config(default = "127.0.0.1")]
    pub address: String,

    /// API server port: [1, 65535].
    #[config(default = 80)]
    pub port: i32,
}

pub fn schema() -> Result<Arc<Schema>, LayerfigError> {
    let schema = SchemaBuilder::from_config::<SiteConfig>()?
        .short("log_level", 'l')?
        .short("admin_email", 'a')?
        .build();
    Ok(Arc::new(schema))
}

/// Checks run before `serve` uses the configuration.
pub fn serve_checks() -> Validator {
    Validator::new()
        .one_of("log_level", &["info", "warn", "error", "debug"])
        // Not running as root, so no privileged ports.
        .in_range("web.port", 1024, 65535)
        .in_range("api.port", 1, 65535)
}
