use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use log::{debug, info};
use packhorse_core::{source_key, PackageSource};

use crate::document::{default_source, SourceEntry};
use crate::store::ConfigStore;

/// Reachability check used to guard `add`. The CLI probes over HTTP; tests
/// stub it.
pub trait SourceValidator {
    fn validate(&self, location: &str) -> bool;
}

/// Validator that only accepts locations that exist on the local filesystem.
pub struct PathProbeValidator;

impl SourceValidator for PathProbeValidator {
    fn validate(&self, location: &str) -> bool {
        Path::new(location).exists()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The location failed validation and validation was not skipped. The
    /// source is simply not added; this is not an error.
    Skipped,
}

/// Typed view over the config document: add, remove, and resolve sources.
pub struct SourceRegistry {
    store: ConfigStore,
}

impl SourceRegistry {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    /// Resolve all usable sources, keyed by the case-insensitive name key.
    /// Records missing a name or location are skipped. Callers always see at
    /// least one candidate: when nothing valid resolves, the built-in
    /// default source is returned instead of an empty map.
    pub fn list(&self) -> BTreeMap<String, PackageSource> {
        let document = self.store.load();
        let mut sources = BTreeMap::new();
        for entry in &document.sources {
            let (Some(name), Some(location)) = (&entry.name, &entry.location) else {
                debug!("skipping source record with missing name or location");
                continue;
            };
            if name.trim().is_empty() || location.trim().is_empty() {
                continue;
            }

            let is_builtin = entry.is_builtin();
            sources.insert(
                source_key(name),
                PackageSource {
                    name: name.clone(),
                    location: location.clone(),
                    trusted: entry.trusted,
                    is_registered: !is_builtin,
                    is_validated: entry.validated,
                },
            );
        }

        if sources.is_empty() {
            let fallback = default_source();
            sources.insert(source_key(&fallback.name), fallback);
        }
        sources
    }

    /// Append a source record. Proceeds when validation is skipped or the
    /// location is reachable (an existing local path always counts);
    /// otherwise the add is silently skipped. Duplicate names are not
    /// deduplicated here; `list` resolves them last-wins.
    pub fn add(
        &self,
        name: &str,
        location: &str,
        trusted: bool,
        validated: bool,
        skip_validate: bool,
        validator: &dyn SourceValidator,
    ) -> Result<AddOutcome> {
        let reachable =
            skip_validate || Path::new(location).exists() || validator.validate(location);
        if !reachable {
            info!("source '{name}' failed validation for '{location}'; not adding");
            return Ok(AddOutcome::Skipped);
        }

        let mut document = self.store.load();
        // The synthesized built-in record must not leak into the file.
        document.sources.retain(|entry| !entry.is_builtin());
        document.sources.push(SourceEntry {
            name: Some(name.to_string()),
            location: Some(location.to_string()),
            trusted,
            validated,
        });
        self.store.save(&document)?;
        info!("added package source '{name}' at '{location}'");
        Ok(AddOutcome::Added)
    }

    /// Remove a source by its case-insensitive name. Returns false (no
    /// error) when nothing matched.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let key = source_key(name);
        let mut document = self.store.load();
        let before = document.sources.len();
        document.sources.retain(|entry| {
            entry
                .name
                .as_deref()
                .map(|existing| source_key(existing) != key)
                .unwrap_or(true)
        });

        if document.sources.len() == before {
            debug!("source '{name}' not found; nothing to remove");
            return Ok(false);
        }

        document.sources.retain(|entry| !entry.is_builtin());
        self.store.save(&document)?;
        info!("removed package source '{name}'");
        Ok(true)
    }
}
