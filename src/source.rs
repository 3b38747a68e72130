//! The source adapter seam and the defaults adapter.

use std::collections::BTreeMap;

use crate::error::LayerfigError;
use crate::schema::Schema;
use crate::types::Origin;
use crate::value::RawValue;

/// A sparse `key → raw value` mapping produced by one source. Keys are schema
/// keys (not file keys or flag names). A missing key means the source has no
/// opinion.
pub type RawMap = BTreeMap<String, RawValue>;

/// A provider of raw configuration data from one origin.
pub trait Source {
    /// The layer this source feeds.
    fn origin(&self) -> Origin;

    /// Produce this source's partial mapping for `schema`.
    fn collect(&self, schema: &Schema) -> Result<RawMap, LayerfigError>;
}

/// Maps every schema key to its declared default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsSource;

impl Source for DefaultsSource {
    fn origin(&self) -> Origin {
        Origin::Default
    }

    fn collect(&self, schema: &Schema) -> Result<RawMap, LayerfigError> {
        Ok(schema
            .entries()
            .map(|e| (e.key().to_string(), RawValue::from(e.default_value())))
            .collect())
    }
}
