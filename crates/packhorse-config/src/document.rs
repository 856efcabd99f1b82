use packhorse_core::PackageSource;
use serde::{Deserialize, Serialize};

/// Schema marker the loader requires at the top of the document. Anything
/// else is treated the same as an unreadable file.
pub const CONFIG_SCHEMA: &str = "packhorse/sources/1";

pub const DEFAULT_SOURCE_NAME: &str = "packhorse-community";
pub const DEFAULT_SOURCE_LOCATION: &str = "https://packages.packhorse.dev/api/v1";

/// On-disk source-registry document. Whole-document read-modify-write only;
/// there are no partial or append updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub schema: String,
    #[serde(default, skip_serializing_if = "ProviderSettings::is_empty")]
    pub settings: ProviderSettings,
    #[serde(default, rename = "source", skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceEntry>,
}

/// Provider-wide settings carried alongside the source list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_insecure_sources: Option<bool>,
}

impl ProviderSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One source record. `name` and `location` are required for the record to
/// be usable, but hand-edited files may omit them; such records are skipped
/// at resolution time rather than rejected at parse time. The trust flags
/// follow the presence-as-true convention: they are only serialized when
/// true, and an absent key reads back as false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub trusted: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub validated: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SourceEntry {
    /// True for the hard-coded default record. Built-in records are shown
    /// when nothing else resolves but must never be written back to disk.
    pub fn is_builtin(&self) -> bool {
        self.name.as_deref() == Some(DEFAULT_SOURCE_NAME)
            && self.location.as_deref() == Some(DEFAULT_SOURCE_LOCATION)
    }
}

impl ConfigDocument {
    /// The hard-coded fallback substituted whenever the on-disk document is
    /// missing, unreadable, or carries the wrong schema marker. Loading must
    /// always produce some valid document.
    pub fn default_document() -> Self {
        Self {
            schema: CONFIG_SCHEMA.to_string(),
            settings: ProviderSettings::default(),
            sources: vec![SourceEntry {
                name: Some(DEFAULT_SOURCE_NAME.to_string()),
                location: Some(DEFAULT_SOURCE_LOCATION.to_string()),
                trusted: false,
                validated: true,
            }],
        }
    }
}

/// The built-in source shown when no user sources resolve. Never persisted.
pub fn default_source() -> PackageSource {
    PackageSource {
        name: DEFAULT_SOURCE_NAME.to_string(),
        location: DEFAULT_SOURCE_LOCATION.to_string(),
        trusted: false,
        is_registered: false,
        is_validated: true,
    }
}
