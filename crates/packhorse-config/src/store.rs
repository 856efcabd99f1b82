use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::document::{ConfigDocument, CONFIG_SCHEMA};
use crate::settings::Settings;

/// Loads and saves the source-registry document. Loading never fails: any
/// read or parse problem is recovered by substituting the built-in default
/// document, so a corrupt or hand-mangled file can never abort a request.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_settings(settings: &Settings) -> Self {
        Self::new(settings.config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ConfigDocument {
        if !self.path.exists() {
            debug!(
                "source registry not found at {}; using default document",
                self.path.display()
            );
            return ConfigDocument::default_document();
        }

        match self.try_load() {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "recovering from unreadable source registry {}: {err:#}",
                    self.path.display()
                );
                ConfigDocument::default_document()
            }
        }
    }

    fn try_load(&self) -> Result<ConfigDocument> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let document: ConfigDocument = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        if document.schema != CONFIG_SCHEMA {
            anyhow::bail!(
                "unexpected schema marker '{}' (expected '{}')",
                document.schema,
                CONFIG_SCHEMA
            );
        }
        Ok(document)
    }

    /// Whole-document atomic replace: serialize to a temp sibling, then
    /// rename over the target.
    pub fn save(&self, document: &ConfigDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = toml::to_string(document)
            .with_context(|| format!("failed to serialize {}", self.path.display()))?;
        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to replace {} with {}",
                self.path.display(),
                tmp_path.display()
            )
        })
    }
}
