use std::path::{Path, PathBuf};

use anyhow::Result;

/// Download service. Implementations fetch `url` to `dest`; the orchestrator
/// verifies the destination exists afterwards and treats absence as a fatal
/// download failure.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Archive-unpack service. Returns the paths it extracted under `dest`.
pub trait Unpacker {
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>>;
}

/// Native-installer service (msi/msu payloads). A clean run that reports
/// `false` is treated as failure.
pub trait NativeInstaller {
    fn install(&self, payload: &Path, silent_args: &[String]) -> Result<bool>;
    fn uninstall(&self, payload: &Path, silent_args: &[String]) -> Result<bool>;
}
