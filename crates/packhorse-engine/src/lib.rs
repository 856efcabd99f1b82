mod collaborators;
mod error;
mod fs_utils;
mod installer;
mod receipts;
mod runner;
mod sandbox;
mod shims;
mod snapshot;

pub use collaborators::{Fetcher, NativeInstaller, Unpacker};
pub use error::EngineError;
pub use installer::{InstallReport, Installer};
pub use receipts::{
    current_unix_timestamp, read_receipt, receipt_path, remove_receipt, write_receipt,
    InstallKind, InstallReceipt,
};
pub use runner::{CancelFlag, ProcessInvocation, ProcessRunner, RunOutcome, WindowStyle};
pub use sandbox::{ScriptContext, ScriptSandbox, ShellSandbox};
pub use shims::{generate_shims, remove_shims, remove_shims_by_name, shim_path};
pub use snapshot::{
    content_log_path, read_content_log, write_content_log, DirectorySnapshot,
};
