use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::{debug, info, warn};
use packhorse_config::Settings;

use crate::error::EngineError;
use crate::sandbox::{ScriptContext, ScriptSandbox};

/// Cooperative cancellation signal, checked between completion polls. It can
/// only terminate a running child process; in-process script execution and
/// file extraction run to completion regardless.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Requested console window treatment. Applied when spawning on Windows;
/// inert on platforms without console windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStyle {
    Normal,
    Hidden,
    Minimized,
}

#[derive(Debug, Clone)]
pub struct ProcessInvocation {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub elevated: bool,
    pub window: WindowStyle,
    pub valid_exit_codes: BTreeSet<i32>,
    pub script_context: Option<ScriptContext>,
}

impl ProcessInvocation {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
            elevated: false,
            window: WindowStyle::Normal,
            valid_exit_codes: BTreeSet::from([0]),
            script_context: None,
        }
    }

    fn executable_name(&self) -> String {
        self.executable
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.executable.display().to_string())
    }
}

/// Terminal states of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded { code: i32 },
    Failed { code: i32 },
    Killed,
}

/// Launches external processes with exit-code validation and cooperative
/// cancellation. Completion is polled on a bounded interval rather than
/// awaited, so a cancellation request is observed between polls.
pub struct ProcessRunner {
    poll_interval: Duration,
    process_elevated: bool,
    sandbox: Option<Box<dyn ScriptSandbox>>,
}

impl ProcessRunner {
    pub fn new(process_elevated: bool) -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            process_elevated,
            sandbox: None,
        }
    }

    pub fn for_settings(settings: &Settings) -> Self {
        Self::new(settings.elevated())
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_sandbox(mut self, sandbox: Box<dyn ScriptSandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn run(
        &self,
        invocation: &ProcessInvocation,
        cancel: &CancelFlag,
    ) -> Result<RunOutcome, EngineError> {
        let executable = invocation.executable_name();

        if invocation.elevated && !self.process_elevated {
            // Known limitation: no escalation is attempted here.
            return Err(EngineError::ElevationRequired { executable });
        }

        // An elevated interpreter script runs through the sandbox instead of
        // a second elevated child; there is no second prompt to answer and
        // nothing to kill on cancellation.
        if invocation.elevated && is_interpreter_script(&invocation.executable) {
            if let Some(sandbox) = &self.sandbox {
                let ctx = invocation.script_context.clone().unwrap_or_else(|| {
                    ScriptContext {
                        package_name: String::new(),
                        package_dir: PathBuf::new(),
                        args: invocation.args.clone(),
                    }
                });
                let code = sandbox.run_script(&invocation.executable, &ctx)?;
                return Ok(self.classify_exit(invocation, &executable, code));
            }
        }

        info!("launching {executable}");
        let mut command = Command::new(&invocation.executable);
        command.args(&invocation.args);
        if let Some(working_dir) = &invocation.working_dir {
            command.current_dir(working_dir);
        }
        apply_window_style(&mut command, invocation.window);

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start {executable}"))?;

        loop {
            let status = child
                .try_wait()
                .with_context(|| format!("failed to poll {executable}"))?;
            if let Some(status) = status {
                let code = status.code().unwrap_or(-1);
                return Ok(self.classify_exit(invocation, &executable, code));
            }

            if cancel.is_requested() {
                warn!("cancellation requested; killing {executable}");
                let _ = child.kill();
                let _ = child.wait();
                return Ok(RunOutcome::Killed);
            }

            thread::sleep(self.poll_interval);
        }
    }

    fn classify_exit(
        &self,
        invocation: &ProcessInvocation,
        executable: &str,
        code: i32,
    ) -> RunOutcome {
        if invocation.valid_exit_codes.contains(&code) {
            debug!("{executable} exited with accepted code {code}");
            RunOutcome::Succeeded { code }
        } else {
            warn!("{executable} exited with unacceptable code {code}");
            RunOutcome::Failed { code }
        }
    }
}

fn is_interpreter_script(executable: &std::path::Path) -> bool {
    matches!(
        executable
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("sh") | Some("ps1")
    )
}

#[cfg(windows)]
fn apply_window_style(command: &mut Command, window: WindowStyle) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    if matches!(window, WindowStyle::Hidden | WindowStyle::Minimized) {
        command.creation_flags(CREATE_NO_WINDOW);
    }
}

#[cfg(not(windows))]
fn apply_window_style(_command: &mut Command, _window: WindowStyle) {}
