use std::fs;
use std::io;
use std::path::Path;

pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Best-effort removal of a directory that is expected to be empty by now.
/// A directory that still has entries is left alone.
pub fn remove_dir_if_empty(path: &Path) {
    let _ = fs::remove_dir(path);
}
