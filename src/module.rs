//! Module identities and fixed per-module flag tables.
//!
//! The site has exactly seven explorable modules. Keying per-module state by a
//! closed enum means every module always has exactly one entry and a typo in a
//! module name is a compile error rather than a silently created map key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::ParseIdError;

/// One of the seven thematic modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleId {
    /// Leadership systems map.
    Systems,
    /// Project case studies.
    Projects,
    /// Field operations simulator.
    FieldOps,
    /// Experiments workbench.
    Lab,
    /// Signal tone panel.
    Signal,
    /// Loyalty cards.
    Loyalty,
    /// Origin constellation.
    Origin,
}

impl ModuleId {
    /// Every module, in display order.
    pub const ALL: [Self; 7] = [
        Self::Systems,
        Self::Projects,
        Self::FieldOps,
        Self::Lab,
        Self::Signal,
        Self::Loyalty,
        Self::Origin,
    ];

    /// Stable string id used in persisted records and by the UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Systems => "systems",
            Self::Projects => "projects",
            Self::FieldOps => "field-ops",
            Self::Lab => "lab",
            Self::Signal => "signal",
            Self::Loyalty => "loyalty",
            Self::Origin => "origin",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| value.eq_ignore_ascii_case(m.as_str()))
            .ok_or_else(|| ParseIdError {
                value: value.to_string(),
            })
    }
}

/// One boolean per module.
///
/// Serialized as a JSON object with all seven module keys. Deserialization
/// tolerates missing keys (false) and ignores keys that name no module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleFlags([bool; 7]);

impl ModuleFlags {
    /// All flags false.
    #[must_use]
    pub const fn new() -> Self {
        Self([false; 7])
    }

    /// Flag for `module`.
    #[must_use]
    pub const fn get(&self, module: ModuleId) -> bool {
        self.0[module.index()]
    }

    /// Set the flag for `module`. Returns true if it was previously false.
    pub fn raise(&mut self, module: ModuleId) -> bool {
        let slot = &mut self.0[module.index()];
        let was_clear = !*slot;
        *slot = true;
        was_clear
    }

    /// Number of modules whose flag is set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.iter().filter(|f| **f).count()
    }

    /// Iterate `(module, flag)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, bool)> + '_ {
        ModuleId::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

impl Serialize for ModuleFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ModuleId::ALL.len()))?;
        for (module, flag) in self.iter() {
            map.serialize_entry(module.as_str(), &flag)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModuleFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        let mut flags = Self::new();
        for (key, value) in raw {
            if let (Ok(module), true) = (key.parse::<ModuleId>(), value) {
                flags.raise(module);
            }
        }
        Ok(flags)
    }
}
