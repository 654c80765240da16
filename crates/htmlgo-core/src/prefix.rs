//! Prefix configuration carried by every forward conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ConfigError;

/// Namespace tokens prepended to generated identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixConfig {
    /// Package for plain markup elements (`h.Div(...)`).
    pub package_prefix: SmolStr,
    /// Package for the primary component library (`v.VBtn(...)`).
    pub component_prefix_primary: SmolStr,
    /// Package for the extended component library (`vx.VXDialog(...)`).
    pub component_prefix_extended: SmolStr,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            package_prefix: SmolStr::new_static("h"),
            component_prefix_primary: SmolStr::new_static("v"),
            component_prefix_extended: SmolStr::new_static("vx"),
        }
    }
}

impl PrefixConfig {
    pub fn get(&self, field: PrefixField) -> &SmolStr {
        match field {
            PrefixField::Package => &self.package_prefix,
            PrefixField::ComponentPrimary => &self.component_prefix_primary,
            PrefixField::ComponentExtended => &self.component_prefix_extended,
        }
    }

    fn slot_mut(&mut self, field: PrefixField) -> &mut SmolStr {
        match field {
            PrefixField::Package => &mut self.package_prefix,
            PrefixField::ComponentPrimary => &mut self.component_prefix_primary,
            PrefixField::ComponentExtended => &mut self.component_prefix_extended,
        }
    }
}

/// One of the three independently editable prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixField {
    Package,
    ComponentPrimary,
    ComponentExtended,
}

impl PrefixField {
    pub const ALL: [PrefixField; 3] = [
        Self::Package,
        Self::ComponentPrimary,
        Self::ComponentExtended,
    ];

    /// Field name on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Package => "packagePrefix",
            Self::ComponentPrimary => "vuetifyPrefix",
            Self::ComponentExtended => "vuetifyXPrefix",
        }
    }
}

impl fmt::Display for PrefixField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for PrefixField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "package" | "packagePrefix" => Ok(Self::Package),
            "vuetify" | "vuetifyPrefix" => Ok(Self::ComponentPrimary),
            "vuetify-x" | "vuetifyx" | "vuetifyXPrefix" => Ok(Self::ComponentExtended),
            other => Err(ConfigError::InvalidPrefixField {
                field: other.to_string(),
            }),
        }
    }
}

/// Holds the current prefixes. Only explicit user edits go through `set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixStore {
    config: PrefixConfig,
}

impl PrefixStore {
    pub fn new(config: PrefixConfig) -> Self {
        Self { config }
    }

    pub fn get(&self) -> &PrefixConfig {
        &self.config
    }

    /// Update one field. Returns whether the stored value changed.
    ///
    /// Empty values are accepted; they produce requests the service will
    /// likely reject, but that is its call to make.
    pub fn set(&mut self, field: PrefixField, value: impl Into<SmolStr>) -> bool {
        let value = value.into();
        if value.trim().is_empty() {
            tracing::warn!(%field, "prefix set to an empty value");
        }
        let slot = self.config.slot_mut(field);
        if *slot == value {
            return false;
        }
        tracing::debug!(%field, old = %slot, new = %value, "prefix updated");
        *slot = value;
        true
    }
}
