use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use packhorse_config::Settings;
use walkdir::WalkDir;

/// Before/after file listing of one directory tree. Archive installs have no
/// manifest of their own, so the diff of this snapshot is the only record of
/// what an extraction added.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    root: PathBuf,
    files_before: BTreeSet<PathBuf>,
}

impl DirectorySnapshot {
    /// Record the files currently under `root`. A root that does not exist
    /// yet captures the empty set.
    pub fn capture(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let files_before = list_files(&root);
        debug!(
            "captured {} files under {}",
            files_before.len(),
            root.display()
        );
        Self { root, files_before }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-scan the tree and return the paths added since capture, in lexical
    /// order.
    pub fn diff(&self) -> Vec<PathBuf> {
        list_files(&self.root)
            .into_iter()
            .filter(|path| !self.files_before.contains(path))
            .collect()
    }
}

fn list_files(root: &Path) -> BTreeSet<PathBuf> {
    if !root.exists() {
        return BTreeSet::new();
    }

    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Where the uninstall content log for a package's archive payload lives:
/// under the package's install dir, named after the archive file itself.
pub fn content_log_path(settings: &Settings, package_name: &str, payload_file_name: &str) -> PathBuf {
    settings
        .package_dir(package_name)
        .join(format!("{payload_file_name}.files.txt"))
}

/// One absolute path per line. Parents are created as needed.
pub fn write_content_log(added: &[PathBuf], log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut payload = String::new();
    for path in added {
        payload.push_str(&path.to_string_lossy());
        payload.push('\n');
    }
    fs::write(log_path, payload.as_bytes())
        .with_context(|| format!("failed to write content log: {}", log_path.display()))
}

/// A missing or unreadable log means "nothing tracked", not an error.
pub fn read_content_log(log_path: &Path) -> Vec<PathBuf> {
    let raw = match fs::read_to_string(log_path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(
                "content log {} is unreadable; nothing to clean up: {err}",
                log_path.display()
            );
            return Vec::new();
        }
    };

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
