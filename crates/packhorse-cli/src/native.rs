use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use log::info;
use packhorse_engine::NativeInstaller;

/// Windows install engine delegation. msi/msu payloads are handed to
/// msiexec; a clean run with a rejected status reports `false` rather than
/// an error so the caller can distinguish the two.
pub struct MsiExecInstaller;

impl NativeInstaller for MsiExecInstaller {
    fn install(&self, payload: &Path, silent_args: &[String]) -> Result<bool> {
        run_msiexec("/i", payload, silent_args)
    }

    fn uninstall(&self, payload: &Path, silent_args: &[String]) -> Result<bool> {
        run_msiexec("/x", payload, silent_args)
    }
}

fn run_msiexec(verb: &str, payload: &Path, silent_args: &[String]) -> Result<bool> {
    if !cfg!(windows) {
        return Err(anyhow!(
            "native installer payloads are supported only on Windows hosts: {}",
            payload.display()
        ));
    }

    let mut command = Command::new("msiexec");
    command.arg(verb).arg(payload);
    if silent_args.is_empty() {
        command.arg("/qn").arg("/norestart");
    } else {
        command.args(silent_args);
    }

    info!("running msiexec {verb} {}", payload.display());
    let status = command
        .status()
        .with_context(|| format!("failed to start msiexec for {}", payload.display()))?;
    Ok(status.success())
}
