//! Core resolution pipeline: walk the schema and pick each key's value from
//! the highest layer that defines it.
//!
//! Operates on pre-collected layers ([`Layers`]) with no I/O, making the full
//! pipeline testable with synthetic inputs. For each entry, in registration
//! order:
//!
//! 1. Take the raw value from flags, else env, else file, else defaults
//! 2. Coerce it into the entry's declared type
//! 3. Record the value and the layer it came from
//!
//! Any coercion failure aborts resolution; no partial snapshot is returned.
//! Keys in the layers that are not in the schema are ignored.

use std::sync::Arc;

use crate::error::LayerfigError;
use crate::merge::Layers;
use crate::schema::Schema;
use crate::snapshot::{Resolved, Snapshot};
use crate::source::{DefaultsSource, Source};
use crate::types::Origin;
use crate::value::{RawValue, coerce};

/// Merges [`Layers`] into a [`Snapshot`] for one schema.
#[derive(Debug, Clone)]
pub struct Resolver {
    schema: Arc<Schema>,
}

impl Resolver {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Collect every source into its layer. The file layer and file list are
    /// passed in already read.
    pub fn gather(
        &self,
        file: crate::file::FileLayer,
        env: Option<&dyn Source>,
        flags: &dyn Source,
    ) -> Result<Layers, LayerfigError> {
        let schema = &self.schema;
        let layers = Layers {
            defaults: DefaultsSource.collect(schema)?,
            file: file.map,
            env: env.map(|s| s.collect(schema)).transpose()?.unwrap_or_default(),
            flags: flags.collect(schema)?,
            files: file.paths,
        };
        tracing::debug!(
            file = layers.file.len(),
            env = layers.env.len(),
            flags = layers.flags.len(),
            "layers collected"
        );
        Ok(layers)
    }

    /// Resolve `layers` into a complete snapshot.
    pub fn resolve(&self, layers: &Layers) -> Result<Snapshot, LayerfigError> {
        let mut values = Vec::with_capacity(self.schema.len());

        for entry in self.schema.entries() {
            let fallback;
            let (raw, origin) = match layers.winning(entry.key()) {
                Some(found) => found,
                None => {
                    fallback = RawValue::from(entry.default_value());
                    (&fallback, Origin::Default)
                }
            };
            let value = coerce(entry.key(), raw, entry.value_type())?;
            values.push(Resolved { value, origin });
        }

        Ok(Snapshot::new(
            Arc::clone(&self.schema),
            values,
            layers.files.clone(),
        ))
    }
}
