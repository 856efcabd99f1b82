use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use packhorse_config::Settings;

/// How a package got installed, which decides how it comes back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    Archive,
    Native,
    SelfExtracting,
}

impl InstallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Native => "native",
            Self::SelfExtracting => "self-extracting",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "archive" => Ok(Self::Archive),
            "native" => Ok(Self::Native),
            "self-extracting" => Ok(Self::SelfExtracting),
            _ => Err(anyhow!("invalid install kind: {value}")),
        }
    }
}

/// Per-package record of what an install did: the payload it ran, the
/// arguments needed to reverse it silently, the shims it exposed, and the
/// content log for archive installs. Written on success, consumed on
/// uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    pub name: String,
    pub kind: InstallKind,
    pub payload_file: PathBuf,
    pub silent_args: Vec<String>,
    pub valid_exit_codes: BTreeSet<i32>,
    pub shims: Vec<String>,
    pub content_log: Option<PathBuf>,
    pub installed_at_unix: u64,
}

pub fn receipt_path(settings: &Settings, package_name: &str) -> PathBuf {
    settings.package_dir(package_name).join(".packhorse.receipt")
}

pub fn write_receipt(settings: &Settings, receipt: &InstallReceipt) -> Result<PathBuf> {
    let mut payload = String::new();
    payload.push_str(&format!("name={}\n", receipt.name));
    payload.push_str(&format!("kind={}\n", receipt.kind.as_str()));
    payload.push_str(&format!(
        "payload_file={}\n",
        receipt.payload_file.display()
    ));
    for arg in &receipt.silent_args {
        payload.push_str(&format!("silent_arg={arg}\n"));
    }
    for code in &receipt.valid_exit_codes {
        payload.push_str(&format!("valid_exit_code={code}\n"));
    }
    for shim in &receipt.shims {
        payload.push_str(&format!("shim={shim}\n"));
    }
    if let Some(content_log) = &receipt.content_log {
        payload.push_str(&format!("content_log={}\n", content_log.display()));
    }
    payload.push_str(&format!(
        "installed_at_unix={}\n",
        receipt.installed_at_unix
    ));

    let path = receipt_path(settings, &receipt.name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, payload.as_bytes())
        .with_context(|| format!("failed to write install receipt: {}", path.display()))?;
    Ok(path)
}

pub fn read_receipt(settings: &Settings, package_name: &str) -> Result<Option<InstallReceipt>> {
    let path = receipt_path(settings, package_name);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read install receipt: {}", path.display()));
        }
    };

    let receipt = parse_receipt(&raw)
        .with_context(|| format!("failed to parse install receipt: {}", path.display()))?;
    Ok(Some(receipt))
}

pub fn remove_receipt(settings: &Settings, package_name: &str) -> Result<()> {
    let path = receipt_path(settings, package_name);
    crate::fs_utils::remove_file_if_exists(&path)
        .with_context(|| format!("failed to remove install receipt: {}", path.display()))
}

fn parse_receipt(raw: &str) -> Result<InstallReceipt> {
    let mut name = None;
    let mut kind = None;
    let mut payload_file = None;
    let mut silent_args = Vec::new();
    let mut valid_exit_codes = BTreeSet::new();
    let mut shims = Vec::new();
    let mut content_log = None;
    let mut installed_at_unix = None;

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "name" => name = Some(value.to_string()),
            "kind" => kind = Some(InstallKind::parse(value)?),
            "payload_file" => payload_file = Some(PathBuf::from(value)),
            "silent_arg" => silent_args.push(value.to_string()),
            "valid_exit_code" => {
                valid_exit_codes
                    .insert(value.parse().context("valid_exit_code must be i32")?);
            }
            "shim" => shims.push(value.to_string()),
            "content_log" => content_log = Some(PathBuf::from(value)),
            "installed_at_unix" => {
                installed_at_unix = Some(value.parse().context("installed_at_unix must be u64")?)
            }
            _ => {}
        }
    }

    if valid_exit_codes.is_empty() {
        valid_exit_codes.insert(0);
    }

    Ok(InstallReceipt {
        name: name.context("missing name")?,
        kind: kind.context("missing kind")?,
        payload_file: payload_file.context("missing payload_file")?,
        silent_args,
        valid_exit_codes,
        shims,
        content_log,
        installed_at_unix: installed_at_unix.context("missing installed_at_unix")?,
    })
}

pub fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
