use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use log::{debug, error, info, warn};
use packhorse_config::Settings;
use packhorse_core::{InstallRequest, PayloadKind};

use crate::collaborators::{Fetcher, NativeInstaller, Unpacker};
use crate::error::EngineError;
use crate::fs_utils::{remove_dir_if_empty, remove_file_if_exists};
use crate::receipts::{
    current_unix_timestamp, read_receipt, remove_receipt, write_receipt, InstallKind,
    InstallReceipt,
};
use crate::runner::{CancelFlag, ProcessInvocation, ProcessRunner, RunOutcome, WindowStyle};
use crate::sandbox::ScriptContext;
use crate::shims::{generate_shims, remove_shims, remove_shims_by_name};
use crate::snapshot::{content_log_path, read_content_log, write_content_log, DirectorySnapshot};

/// What one successful install did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub package_name: String,
    pub kind: InstallKind,
    pub payload_path: PathBuf,
    pub installed_files: Vec<PathBuf>,
    pub content_log: Option<PathBuf>,
    pub shims: Vec<String>,
}

/// Sequences one package install or removal: staging, fetch, payload
/// dispatch, shim generation, receipt bookkeeping. Collaborators are
/// injected at construction; each call is one serial sequence for one
/// package request.
pub struct Installer<'a> {
    settings: &'a Settings,
    runner: ProcessRunner,
    fetcher: &'a dyn Fetcher,
    unpacker: &'a dyn Unpacker,
    native: &'a dyn NativeInstaller,
}

impl<'a> Installer<'a> {
    pub fn new(
        settings: &'a Settings,
        fetcher: &'a dyn Fetcher,
        unpacker: &'a dyn Unpacker,
        native: &'a dyn NativeInstaller,
    ) -> Self {
        Self {
            settings,
            runner: ProcessRunner::for_settings(settings),
            fetcher,
            unpacker,
            native,
        }
    }

    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn install(
        &self,
        request: &InstallRequest,
        cancel: &CancelFlag,
    ) -> Result<InstallReport, EngineError> {
        let package = &request.package_name;
        info!("installing '{package}'");

        let staging = self.settings.staging_dir(package);
        self.stage(&staging)
            .map_err(|err| self.fail(package, "staging", err))?;

        let payload = self
            .fetch_payload(request, &staging)
            .map_err(|err| self.fail(package, "fetching", err))?;

        let mut report = self
            .install_payload(request, &payload, cancel)
            .map_err(|err| self.fail(package, "installing", err))?;

        // Shim generation is best-effort: a failure here does not roll back
        // the install.
        match generate_shims(
            self.settings,
            &self.settings.package_dir(package),
            request.shim_name_override.as_deref(),
        ) {
            Ok(shims) => report.shims = shims,
            Err(err) => warn!("shim generation for '{package}' failed: {err:#}"),
        }

        let receipt = InstallReceipt {
            name: package.clone(),
            kind: report.kind,
            payload_file: report.payload_path.clone(),
            silent_args: request.silent_args.clone(),
            valid_exit_codes: request.valid_exit_codes.clone(),
            shims: report.shims.clone(),
            content_log: report.content_log.clone(),
            installed_at_unix: current_unix_timestamp()
                .map_err(|err| self.fail(package, "recording", err.into()))?,
        };
        write_receipt(self.settings, &receipt)
            .map_err(|err| self.fail(package, "recording", err.into()))?;

        info!("installed '{package}'");
        Ok(report)
    }

    /// Reverse an install. Tolerant by design: a missing receipt, missing
    /// content log, or already-deleted files never fail the uninstall.
    pub fn uninstall(&self, package_name: &str, cancel: &CancelFlag) -> Result<(), EngineError> {
        info!("uninstalling '{package_name}'");
        let package_dir = self.settings.package_dir(package_name);

        let receipt = match read_receipt(self.settings, package_name) {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!("unreadable receipt for '{package_name}'; falling back to content logs: {err:#}");
                None
            }
        };

        match receipt {
            Some(receipt) => {
                match receipt.kind {
                    InstallKind::Archive => {
                        if let Some(content_log) = &receipt.content_log {
                            delete_logged_files(content_log);
                        }
                    }
                    InstallKind::Native => {
                        let clean = self
                            .native
                            .uninstall(&receipt.payload_file, &receipt.silent_args)
                            .map_err(EngineError::Other)?;
                        if !clean {
                            return Err(EngineError::Other(anyhow!(
                                "native uninstaller reported failure for '{package_name}'"
                            )));
                        }
                    }
                    InstallKind::SelfExtracting => {
                        self.rerun_uninstaller(package_name, &receipt, cancel)?;
                    }
                }
                if let Err(err) = remove_shims_by_name(self.settings, &receipt.shims) {
                    warn!("shim removal for '{package_name}' failed: {err:#}");
                }
                if let Err(err) = remove_receipt(self.settings, package_name) {
                    warn!("receipt removal for '{package_name}' failed: {err:#}");
                }
            }
            None => {
                // No receipt: the content logs are the only record there is.
                if let Err(err) = remove_shims(self.settings, &package_dir, None) {
                    warn!("shim removal for '{package_name}' failed: {err:#}");
                }
                consume_content_logs(&package_dir);
            }
        }

        remove_dir_if_empty(&package_dir);
        info!("uninstalled '{package_name}'");
        Ok(())
    }

    fn stage(&self, staging: &Path) -> Result<(), EngineError> {
        if staging.exists() {
            fs::remove_dir_all(staging)
                .with_context(|| format!("failed to clear staging dir: {}", staging.display()))?;
        }
        fs::create_dir_all(staging)
            .with_context(|| format!("failed to create staging dir: {}", staging.display()))?;
        Ok(())
    }

    fn fetch_payload(
        &self,
        request: &InstallRequest,
        staging: &Path,
    ) -> Result<PathBuf, EngineError> {
        let url = request
            .select_url(self.settings.host_is_64bit())
            .ok_or_else(|| {
                anyhow!("no download URL supplied for '{}'", request.package_name)
            })?;

        // A location that is already a file on disk is used as-is.
        let local = Path::new(url);
        if local.is_file() {
            debug!("payload already on disk: {}", local.display());
            return Ok(local.to_path_buf());
        }

        let file_name = payload_file_name(url)?;
        let dest = staging.join(file_name);
        info!("fetching {url}");
        if let Err(err) = self.fetcher.fetch(url, &dest) {
            error!("fetch of {url} failed: {err:#}");
            return Err(EngineError::DownloadFailed {
                url: url.to_string(),
                dest,
            });
        }
        if !dest.is_file() {
            return Err(EngineError::DownloadFailed {
                url: url.to_string(),
                dest,
            });
        }

        Ok(dest)
    }

    fn install_payload(
        &self,
        request: &InstallRequest,
        payload: &Path,
        cancel: &CancelFlag,
    ) -> Result<InstallReport, EngineError> {
        let package = &request.package_name;
        let kind = PayloadKind::classify(payload).ok_or_else(|| {
            EngineError::UnsupportedPackageType {
                path: payload.to_path_buf(),
            }
        })?;

        if kind.is_native_installer() {
            debug!("delegating {} to the native install engine", payload.display());
            let clean = self
                .native
                .install(payload, &request.silent_args)
                .map_err(EngineError::Other)?;
            if !clean {
                return Err(EngineError::Other(anyhow!(
                    "native installer reported failure for {}",
                    payload.display()
                )));
            }
            return Ok(InstallReport {
                package_name: package.clone(),
                kind: InstallKind::Native,
                payload_path: payload.to_path_buf(),
                installed_files: Vec::new(),
                content_log: None,
                shims: Vec::new(),
            });
        }

        if kind == PayloadKind::SelfExtracting {
            return self.run_self_extractor(request, payload, cancel);
        }

        // Archive payload: wrap the extraction in a snapshot so the content
        // log can drive uninstall later.
        let package_dir = self.settings.package_dir(package);
        fs::create_dir_all(&package_dir)
            .with_context(|| format!("failed to create {}", package_dir.display()))?;
        let snapshot = DirectorySnapshot::capture(&package_dir);
        self.unpacker
            .unpack(payload, &package_dir)
            .map_err(|cause| EngineError::ExtractionFailed {
                archive: payload.to_path_buf(),
                cause,
            })?;
        let added = snapshot.diff();

        let payload_file_name = payload
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| package.clone());
        let log_path = content_log_path(self.settings, package, &payload_file_name);
        write_content_log(&added, &log_path)?;
        info!("recorded {} extracted files for '{package}'", added.len());

        Ok(InstallReport {
            package_name: package.clone(),
            kind: InstallKind::Archive,
            payload_path: payload.to_path_buf(),
            installed_files: added,
            content_log: Some(log_path),
            shims: Vec::new(),
        })
    }

    fn run_self_extractor(
        &self,
        request: &InstallRequest,
        payload: &Path,
        cancel: &CancelFlag,
    ) -> Result<InstallReport, EngineError> {
        let package = &request.package_name;
        let mut invocation = ProcessInvocation::new(payload);
        invocation.args = request.silent_args.clone();
        invocation.elevated = true;
        invocation.window = WindowStyle::Hidden;
        invocation.valid_exit_codes = request.valid_exit_codes.clone();
        invocation.script_context = Some(ScriptContext {
            package_name: package.clone(),
            package_dir: self.settings.package_dir(package),
            args: request.silent_args.clone(),
        });

        let executable = payload_display_name(payload);
        match self.runner.run(&invocation, cancel)? {
            RunOutcome::Succeeded { code } => {
                debug!("{executable} finished with code {code}");
                Ok(InstallReport {
                    package_name: package.clone(),
                    kind: InstallKind::SelfExtracting,
                    payload_path: payload.to_path_buf(),
                    installed_files: Vec::new(),
                    content_log: None,
                    shims: Vec::new(),
                })
            }
            RunOutcome::Failed { code } => Err(EngineError::ProcessFailed { executable, code }),
            RunOutcome::Killed => Err(EngineError::ProcessKilled { executable }),
        }
    }

    fn rerun_uninstaller(
        &self,
        package_name: &str,
        receipt: &InstallReceipt,
        cancel: &CancelFlag,
    ) -> Result<(), EngineError> {
        if !receipt.payload_file.is_file() {
            warn!(
                "uninstaller payload for '{package_name}' is gone; nothing to run: {}",
                receipt.payload_file.display()
            );
            return Ok(());
        }

        let mut invocation = ProcessInvocation::new(&receipt.payload_file);
        invocation.args = receipt.silent_args.clone();
        invocation.elevated = true;
        invocation.window = WindowStyle::Hidden;
        invocation.valid_exit_codes = receipt.valid_exit_codes.clone();

        let executable = payload_display_name(&receipt.payload_file);
        match self.runner.run(&invocation, cancel)? {
            RunOutcome::Succeeded { .. } => Ok(()),
            RunOutcome::Failed { code } => Err(EngineError::ProcessFailed { executable, code }),
            RunOutcome::Killed => Err(EngineError::ProcessKilled { executable }),
        }
    }

    /// Record the failure with full context, then hand the caller the
    /// generic installation-failure condition. Cancellation passes through
    /// unwrapped; it is not a failure. Partial temporary state is left in
    /// place for diagnostics.
    fn fail(&self, package: &str, step: &'static str, err: EngineError) -> EngineError {
        if let EngineError::ProcessKilled { .. } = err {
            warn!("install of '{package}' cancelled during {step}");
            return err;
        }

        error!("install of '{package}' failed during {step}: {err:#}");
        EngineError::InstallFailed {
            package: package.to_string(),
            step,
            cause: anyhow::Error::new(err),
        }
    }
}

fn payload_display_name(payload: &Path) -> String {
    payload
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| payload.display().to_string())
}

/// Last path segment of a URL, without query or fragment.
fn payload_file_name(url: &str) -> Result<String, EngineError> {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = trimmed.rsplit('/').next().unwrap_or("");
    if file_name.is_empty() {
        return Err(EngineError::Other(anyhow!(
            "cannot derive a payload file name from '{url}'"
        )));
    }
    Ok(file_name.to_string())
}

/// Delete every file the content log recorded, tolerating entries that are
/// already gone, then consume the log itself.
fn delete_logged_files(content_log: &Path) {
    let tracked = read_content_log(content_log);
    if tracked.is_empty() {
        debug!("content log {} tracks nothing", content_log.display());
    }
    for path in tracked {
        if let Err(err) = remove_file_if_exists(&path) {
            warn!("failed to delete {}: {err}", path.display());
        }
    }
    if let Err(err) = remove_file_if_exists(content_log) {
        warn!(
            "failed to consume content log {}: {err}",
            content_log.display()
        );
    }
}

/// Receipt-less cleanup: every content log under the package dir is replayed
/// and consumed.
fn consume_content_logs(package_dir: &Path) {
    let Ok(entries) = fs::read_dir(package_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".files.txt"));
        if is_log {
            delete_logged_files(&path);
        }
    }
}
