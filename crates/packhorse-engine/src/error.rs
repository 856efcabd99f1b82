use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for install and uninstall requests.
///
/// Config corruption and source-not-found never surface here: both are
/// recovered or no-op'd where they happen. Cancellation is its own variant,
/// not a generic failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("download failed: no payload at {dest} after fetching {url}")]
    DownloadFailed { url: String, dest: PathBuf },

    #[error("unsupported package type: {path}")]
    UnsupportedPackageType { path: PathBuf },

    /// Elevation was required but the current process does not hold it. No
    /// escalation is attempted; callers must re-run elevated.
    #[error("'{executable}' requires elevation the current process does not hold")]
    ElevationRequired { executable: String },

    #[error("'{executable}' exited with unacceptable code {code}")]
    ProcessFailed { executable: String, code: i32 },

    #[error("'{executable}' was killed after cancellation was requested")]
    ProcessKilled { executable: String },

    #[error("failed to extract {archive}: {cause}")]
    ExtractionFailed { archive: PathBuf, cause: anyhow::Error },

    /// The generic installation-failure condition callers see after the
    /// underlying cause has been recorded on the diagnostic channel.
    #[error("installation of '{package}' failed during {step}: {cause}")]
    InstallFailed {
        package: String,
        step: &'static str,
        cause: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
