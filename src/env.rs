use std::collections::HashMap;

use crate::error::LayerfigError;
use crate::schema::{Schema, SchemaEntry};
use crate::source::{RawMap, Source};
use crate::types::Origin;
use crate::value::RawValue;

/// Reads `{PREFIX}_{ENV_SUFFIX}` variables for each schema entry.
///
/// With prefix `MYSITE`, `web.address` is read from `MYSITE_WEB_ADDRESS`.
/// Values stay raw strings; the merge engine coerces them. Empty variables
/// are treated as unset.
///
/// Variables are captured at construction so tests can pass synthetic data
/// instead of `std::env::vars()`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn new(prefix: &str) -> Self {
        Self::with_vars(prefix, process_vars())
    }

    pub fn with_vars(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            prefix: prefix.to_string(),
            vars: vars.into_iter().collect(),
        }
    }

    /// The variable name that feeds `entry`.
    pub fn var_name(&self, entry: &SchemaEntry) -> String {
        if self.prefix.is_empty() {
            entry.env_name_suffix().to_string()
        } else {
            format!("{}_{}", self.prefix, entry.env_name_suffix())
        }
    }
}

impl Source for EnvSource {
    fn origin(&self) -> Origin {
        Origin::Env
    }

    fn collect(&self, schema: &Schema) -> Result<RawMap, LayerfigError> {
        let mut map = RawMap::new();
        for entry in schema.entries() {
            let name = self.var_name(entry);
            if let Some(value) = self.vars.get(&name).filter(|v| !v.is_empty()) {
                tracing::debug!(var = %name, key = entry.key(), "env override");
                map.insert(entry.key().to_string(), RawValue::Str(value.clone()));
            }
        }
        Ok(map)
    }
}

fn process_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(name, value)| {
        let name = name.into_string().ok()?;
        match value.into_string() {
            Ok(value) => Some((name, value)),
            Err(_) => {
                tracing::debug!(var = %name, "skipping non-unicode env value");
                None
            }
        }
    })
}
