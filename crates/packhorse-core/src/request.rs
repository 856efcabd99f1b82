use std::collections::BTreeSet;

/// Everything the orchestrator needs to install one package: where the
/// payload lives (per architecture), how to run its installer silently, and
/// which exit codes count as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub package_name: String,
    pub url: Option<String>,
    pub url64: Option<String>,
    pub force_x86: bool,
    pub silent_args: Vec<String>,
    pub valid_exit_codes: BTreeSet<i32>,
    pub shim_name_override: Option<String>,
}

impl InstallRequest {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            url: None,
            url64: None,
            force_x86: false,
            silent_args: Vec::new(),
            valid_exit_codes: BTreeSet::from([0]),
            shim_name_override: None,
        }
    }

    /// Prefer the 64-bit payload on a 64-bit host unless the request forces
    /// 32-bit; fall back to the plain URL either way.
    pub fn select_url(&self, host_is_64bit: bool) -> Option<&str> {
        if host_is_64bit && !self.force_x86 {
            if let Some(url64) = self.url64.as_deref() {
                if !url64.is_empty() {
                    return Some(url64);
                }
            }
        }
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

pub fn host_is_64bit() -> bool {
    cfg!(target_pointer_width = "64")
}
