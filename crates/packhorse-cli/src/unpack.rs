use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use packhorse_core::PayloadKind;
use packhorse_engine::{DirectorySnapshot, Unpacker};

/// Archive extraction via the platform's own tools. No archive formats are
/// reimplemented here; a host without a matching tool reports the tool's
/// failure.
pub struct ShellUnpacker;

impl Unpacker for ShellUnpacker {
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        let kind = PayloadKind::classify(archive)
            .ok_or_else(|| anyhow!("unrecognized archive: {}", archive.display()))?;

        let snapshot = DirectorySnapshot::capture(dest);
        match kind {
            PayloadKind::TarGz => extract_tar(archive, dest)?,
            PayloadKind::Zip => extract_zip(archive, dest)?,
            PayloadKind::SevenZip => extract_7z(archive, dest)?,
            other => {
                return Err(anyhow!(
                    "'{}' payloads are not extracted in place",
                    other.as_str()
                ));
            }
        }
        Ok(snapshot.diff())
    }
}

fn extract_tar(archive_path: &Path, dst: &Path) -> Result<()> {
    run_command(
        Command::new("tar")
            .arg("-xf")
            .arg(archive_path)
            .arg("-C")
            .arg(dst),
        "failed to extract tar archive",
    )
}

fn extract_zip(archive_path: &Path, dst: &Path) -> Result<()> {
    if cfg!(windows) {
        let mut command = Command::new("powershell");
        command.arg("-NoProfile").arg("-Command").arg(format!(
            "Expand-Archive -LiteralPath '{}' -DestinationPath '{}' -Force",
            escape_ps_single_quote(archive_path),
            escape_ps_single_quote(dst)
        ));
        if run_command(
            &mut command,
            "failed to extract zip archive with powershell",
        )
        .is_ok()
        {
            return Ok(());
        }
    }

    let mut unzip_command = Command::new("unzip");
    unzip_command.arg("-q").arg(archive_path).arg("-d").arg(dst);
    if run_command(
        &mut unzip_command,
        "failed to extract zip archive with unzip",
    )
    .is_ok()
    {
        return Ok(());
    }

    run_command(
        Command::new("tar")
            .arg("-xf")
            .arg(archive_path)
            .arg("-C")
            .arg(dst),
        "failed to extract zip archive with tar fallback",
    )
}

fn extract_7z(archive_path: &Path, dst: &Path) -> Result<()> {
    run_command(
        Command::new("7z")
            .arg("x")
            .arg(archive_path)
            .arg(format!("-o{}", dst.display()))
            .arg("-y"),
        "failed to extract 7z archive",
    )
}

fn run_command(command: &mut Command, context_message: &str) -> Result<()> {
    let output = command
        .output()
        .with_context(|| format!("{context_message}: command failed to start"))?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    Err(anyhow!(
        "{context_message}: status={} stdout='{}' stderr='{}'",
        output.status,
        stdout.trim(),
        stderr.trim()
    ))
}

fn escape_ps_single_quote(path: &Path) -> String {
    path.as_os_str().to_string_lossy().replace('\'', "''")
}
