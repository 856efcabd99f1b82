use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use log::debug;

/// The data an installer script legitimately needs. Nothing else from the
/// orchestrator's state is visible to the script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptContext {
    pub package_name: String,
    pub package_dir: PathBuf,
    pub args: Vec<String>,
}

/// Runs installer scripts in-process-equivalent fashion when the runner
/// decides not to spawn an elevated child. Execution is synchronous and not
/// cancellable mid-run.
pub trait ScriptSandbox {
    fn run_script(&self, script: &Path, ctx: &ScriptContext) -> Result<i32>;
}

/// Default sandbox: hand the script to the platform shell with the package
/// dir as working directory and the context exported through arguments.
pub struct ShellSandbox;

impl ScriptSandbox for ShellSandbox {
    fn run_script(&self, script: &Path, ctx: &ScriptContext) -> Result<i32> {
        debug!(
            "running script {} for package '{}'",
            script.display(),
            ctx.package_name
        );

        let mut command = if cfg!(windows) {
            let mut command = Command::new("powershell");
            command.arg("-NoProfile").arg("-File").arg(script);
            command
        } else {
            let mut command = Command::new("sh");
            command.arg(script);
            command
        };
        command.args(&ctx.args);
        if ctx.package_dir.as_os_str().is_empty() {
            // No package dir yet; inherit the caller's working directory.
        } else if ctx.package_dir.exists() {
            command.current_dir(&ctx.package_dir);
        }

        let status = command
            .status()
            .with_context(|| format!("failed to start script {}", script.display()))?;
        Ok(status.code().unwrap_or(-1))
    }
}
