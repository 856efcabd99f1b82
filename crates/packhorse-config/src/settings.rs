use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

pub const ROOT_ENV_VAR: &str = "PACKHORSE_ROOT";

/// Immutable per-process configuration, computed once at startup and passed
/// into every component. Derives the install tree (library dir, executables
/// dir, config file) from a single root value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    install_root: PathBuf,
    host_is_64bit: bool,
    elevated: bool,
}

impl Settings {
    /// Resolve the install root from `PACKHORSE_ROOT`, falling back to the
    /// well-known per-platform location. The resolved value is written back
    /// to the environment so later lookups in the same session are stable.
    pub fn from_env() -> Result<Self> {
        let install_root = match env::var(ROOT_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => {
                let default_root = default_install_root()?;
                env::set_var(ROOT_ENV_VAR, &default_root);
                default_root
            }
        };
        Ok(Self::with_root(install_root))
    }

    pub fn with_root(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            host_is_64bit: packhorse_core::host_is_64bit(),
            elevated: probe_elevation(),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.install_root.join("lib")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.install_root.join("bin")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.install_root.join("tmp")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.install_root.join("config")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("sources.toml")
    }

    pub fn package_dir(&self, package_name: &str) -> PathBuf {
        self.lib_dir().join(package_name)
    }

    pub fn staging_dir(&self, package_name: &str) -> PathBuf {
        self.tmp_dir().join(package_name)
    }

    pub fn host_is_64bit(&self) -> bool {
        self.host_is_64bit
    }

    pub fn elevated(&self) -> bool {
        self.elevated
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.lib_dir(),
            self.bin_dir(),
            self.tmp_dir(),
            self.config_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

fn default_install_root() -> Result<PathBuf> {
    if cfg!(windows) {
        let program_data = env::var("ProgramData")
            .context("ProgramData is not set; cannot resolve Windows install root")?;
        return Ok(PathBuf::from(program_data).join("packhorse"));
    }

    let home = env::var("HOME").context("HOME is not set; cannot resolve install root")?;
    Ok(PathBuf::from(home).join(".packhorse"))
}

/// One-shot privilege probe. Shelling out keeps this free of platform FFI;
/// a failed probe reads as not elevated.
fn probe_elevation() -> bool {
    if cfg!(windows) {
        return Command::new("net")
            .arg("session")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false);
    }

    Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|uid| uid.trim() == "0")
        .unwrap_or(false)
}
