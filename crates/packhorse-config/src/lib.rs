mod document;
mod registry;
mod settings;
mod store;

pub use document::{
    default_source, ConfigDocument, ProviderSettings, SourceEntry, CONFIG_SCHEMA,
    DEFAULT_SOURCE_LOCATION, DEFAULT_SOURCE_NAME,
};
pub use registry::{AddOutcome, PathProbeValidator, SourceRegistry, SourceValidator};
pub use settings::Settings;
pub use store::ConfigStore;

#[cfg(test)]
mod tests;
