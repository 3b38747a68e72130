use std::path::PathBuf;

use crate::source::RawMap;
use crate::types::Origin;
use crate::value::RawValue;

/// The four raw mappings for one resolution, plus the config files that fed
/// the file layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layers {
    pub defaults: RawMap,
    pub file: RawMap,
    pub env: RawMap,
    pub flags: RawMap,
    pub files: Vec<PathBuf>,
}

impl Layers {
    /// Layers from lowest to highest precedence.
    pub fn in_precedence(&self) -> [(Origin, &RawMap); 4] {
        [
            (Origin::Default, &self.defaults),
            (Origin::File, &self.file),
            (Origin::Env, &self.env),
            (Origin::Flag, &self.flags),
        ]
    }

    /// The value for `key` from the highest layer that defines it.
    pub fn winning(&self, key: &str) -> Option<(&RawValue, Origin)> {
        self.in_precedence()
            .into_iter()
            .rev()
            .find_map(|(origin, map)| map.get(key).map(|v| (v, origin)))
    }
}
