//! The command-line flag layer.
//!
//! A [`FlagSource`] holds only the flags that were actually supplied on the
//! command line, keyed by long flag name. The clap integration in
//! [`cli`](crate::cli) builds one from parsed matches; programmatic callers can
//! build one directly:
//!
//! ```
//! use layerfig::FlagSource;
//!
//! let flags = FlagSource::new()
//!     .set("web-port", Some(9000))
//!     .set("log-level", None::<&str>); // not supplied, ignored
//! assert_eq!(flags.len(), 1);
//! ```

use crate::error::LayerfigError;
use crate::schema::Schema;
use crate::source::{RawMap, Source};
use crate::types::Origin;
use crate::value::RawValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSource {
    values: Vec<(String, RawValue)>,
}

impl FlagSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a supplied flag. `None` means the flag was not given and is
    /// ignored. If the same flag is set twice, the last value wins.
    pub fn set(mut self, flag: &str, value: Option<impl Into<RawValue>>) -> Self {
        if let Some(v) = value {
            self.values.push((flag.to_string(), v.into()));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Source for FlagSource {
    fn origin(&self) -> Origin {
        Origin::Flag
    }

    /// Map flag names back to schema keys. A flag that matches no entry fails
    /// with [`LayerfigError::KeyNotFound`].
    fn collect(&self, schema: &Schema) -> Result<RawMap, LayerfigError> {
        let mut map = RawMap::new();
        for (flag, value) in &self.values {
            let entry = schema
                .by_flag(flag)
                .ok_or_else(|| LayerfigError::KeyNotFound(format!("--{flag}")))?;
            tracing::debug!(flag = %flag, key = entry.key(), "flag override");
            map.insert(entry.key().to_string(), value.clone());
        }
        Ok(map)
    }
}
