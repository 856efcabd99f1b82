use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use packhorse_config::Settings;
use walkdir::WalkDir;

use crate::fs_utils::remove_file_if_exists;

/// Sibling marker suppressing shim generation for one executable.
const IGNORE_MARKER: &str = "ignore";
/// Sibling marker selecting the detached GUI launcher.
const GUI_MARKER: &str = "gui";

/// Fixed launcher location for a shim name: the executables directory under
/// the install root, `.cmd` on Windows.
pub fn shim_path(settings: &Settings, shim_name: &str) -> PathBuf {
    let mut file_name = shim_name.to_string();
    if cfg!(windows) {
        file_name.push_str(".cmd");
    }
    settings.bin_dir().join(file_name)
}

/// Generate launcher scripts for every executable under `package_root`,
/// honoring `.ignore` and `.gui` sibling markers. Returns the shim names
/// generated.
pub fn generate_shims(
    settings: &Settings,
    package_root: &Path,
    override_name: Option<&str>,
) -> Result<Vec<String>> {
    fs::create_dir_all(settings.bin_dir())
        .with_context(|| format!("failed to create {}", settings.bin_dir().display()))?;

    let mut generated = Vec::new();
    for target in executable_targets(package_root) {
        if marker_exists(&target, IGNORE_MARKER) {
            debug!("ignore marker present; skipping {}", target.display());
            continue;
        }

        let Some(name) = shim_name_for(&target, override_name) else {
            continue;
        };
        let destination = shim_path(settings, &name);
        let reference = target_reference(settings, &target);
        let gui = marker_exists(&target, GUI_MARKER);
        let body = if gui {
            render_gui_shim(&reference)
        } else {
            render_console_shim(&reference)
        };

        fs::write(&destination, body.as_bytes())
            .with_context(|| format!("failed to write shim: {}", destination.display()))?;
        mark_executable(&destination)?;
        info!(
            "generated {} shim '{}' -> {}",
            if gui { "gui" } else { "console" },
            name,
            target.display()
        );
        generated.push(name);
    }

    Ok(generated)
}

/// Mirror of `generate_shims`: delete the launcher for every executable
/// under `package_root`. Deleting a shim that never existed is fine.
pub fn remove_shims(
    settings: &Settings,
    package_root: &Path,
    override_name: Option<&str>,
) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for target in executable_targets(package_root) {
        if marker_exists(&target, IGNORE_MARKER) {
            continue;
        }
        let Some(name) = shim_name_for(&target, override_name) else {
            continue;
        };

        let destination = shim_path(settings, &name);
        remove_file_if_exists(&destination)
            .with_context(|| format!("failed to remove shim: {}", destination.display()))?;
        removed.push(name);
    }

    Ok(removed)
}

/// Delete shims by their recorded names, independent of the package tree.
/// Used on uninstall, where the tree's executables may already be gone.
pub fn remove_shims_by_name(settings: &Settings, names: &[String]) -> Result<()> {
    for name in names {
        let destination = shim_path(settings, name);
        remove_file_if_exists(&destination)
            .with_context(|| format!("failed to remove shim: {}", destination.display()))?;
    }
    Ok(())
}

fn executable_targets(package_root: &Path) -> Vec<PathBuf> {
    if !package_root.exists() {
        return Vec::new();
    }

    WalkDir::new(package_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_executable_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("exe") | Some("bat") | Some("cmd")
    )
}

fn marker_exists(target: &Path, marker: &str) -> bool {
    let Some(file_name) = target.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    target.with_file_name(format!("{file_name}.{marker}")).exists()
}

fn shim_name_for(target: &Path, override_name: Option<&str>) -> Option<String> {
    if let Some(name) = override_name {
        return Some(name.to_string());
    }
    target
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
}

/// Reference the target relative to the shim's own directory so the install
/// tree stays relocatable. Targets outside the install root fall back to an
/// absolute reference.
fn target_reference(settings: &Settings, target: &Path) -> String {
    match target.strip_prefix(settings.install_root()) {
        Ok(relative) => {
            let mut reference = PathBuf::from("..");
            reference.push(relative);
            reference.to_string_lossy().to_string()
        }
        Err(_) => target.to_string_lossy().to_string(),
    }
}

#[cfg(unix)]
fn render_console_shim(reference: &str) -> String {
    format!(
        "#!/bin/sh\nhere=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\nexec \"$here/{reference}\" \"$@\"\n"
    )
}

#[cfg(unix)]
fn render_gui_shim(reference: &str) -> String {
    format!(
        "#!/bin/sh\nhere=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\nnohup \"$here/{reference}\" \"$@\" >/dev/null 2>&1 &\n"
    )
}

#[cfg(not(unix))]
fn render_console_shim(reference: &str) -> String {
    let reference = reference.replace('/', "\\");
    format!("@echo off\r\n\"%~dp0{reference}\" %*\r\nexit /b %errorlevel%\r\n")
}

#[cfg(not(unix))]
fn render_gui_shim(reference: &str) -> String {
    let reference = reference.replace('/', "\\");
    format!("@echo off\r\nstart \"\" \"%~dp0{reference}\" %*\r\n")
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .with_context(|| format!("failed to stat shim: {}", path.display()))?
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("failed to chmod shim: {}", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
