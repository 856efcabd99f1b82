use std::path::PathBuf;

use anyhow::Result;
use packhorse_config::{AddOutcome, ConfigStore, Settings, SourceRegistry};
use packhorse_core::InstallRequest;
use packhorse_engine::{CancelFlag, Installer, ProcessRunner, ShellSandbox};

use crate::fetch::{HttpFetcher, HttpSourceValidator};
use crate::native::MsiExecInstaller;
use crate::render;
use crate::unpack::ShellUnpacker;

pub fn settings_for(root: Option<PathBuf>) -> Result<Settings> {
    match root {
        Some(root) => Ok(Settings::with_root(root)),
        None => Settings::from_env(),
    }
}

pub fn run_install_command(settings: &Settings, request: &InstallRequest) -> Result<()> {
    settings.ensure_base_dirs()?;

    let fetcher = HttpFetcher::new()?;
    let unpacker = ShellUnpacker;
    let native = MsiExecInstaller;
    let runner = ProcessRunner::for_settings(settings).with_sandbox(Box::new(ShellSandbox));
    let installer =
        Installer::new(settings, &fetcher, &unpacker, &native).with_runner(runner);

    let report = installer.install(request, &CancelFlag::new())?;
    render::print_status(
        "ok",
        &format!(
            "installed '{}' ({})",
            report.package_name,
            report.kind.as_str()
        ),
    );
    for shim in &report.shims {
        render::print_status("shim", shim);
    }
    Ok(())
}

pub fn run_uninstall_command(settings: &Settings, package_name: &str) -> Result<()> {
    let fetcher = HttpFetcher::new()?;
    let unpacker = ShellUnpacker;
    let native = MsiExecInstaller;
    let runner = ProcessRunner::for_settings(settings).with_sandbox(Box::new(ShellSandbox));
    let installer =
        Installer::new(settings, &fetcher, &unpacker, &native).with_runner(runner);

    installer.uninstall(package_name, &CancelFlag::new())?;
    render::print_status("ok", &format!("uninstalled '{package_name}'"));
    Ok(())
}

pub fn run_source_add_command(
    settings: &Settings,
    name: &str,
    location: &str,
    trusted: bool,
    validated: bool,
    skip_validate: bool,
) -> Result<()> {
    settings.ensure_base_dirs()?;
    let registry = SourceRegistry::new(ConfigStore::for_settings(settings));
    let validator = HttpSourceValidator::new()?;

    match registry.add(name, location, trusted, validated, skip_validate, &validator)? {
        AddOutcome::Added => {
            render::print_status("ok", &format!("added source '{name}' at '{location}'"));
        }
        AddOutcome::Skipped => {
            render::print_status(
                "skip",
                &format!("source '{name}' is unreachable at '{location}'; not added"),
            );
        }
    }
    Ok(())
}

pub fn run_source_remove_command(settings: &Settings, name: &str) -> Result<()> {
    let registry = SourceRegistry::new(ConfigStore::for_settings(settings));
    if registry.remove(name)? {
        render::print_status("ok", &format!("removed source '{name}'"));
    } else {
        render::print_status("skip", &format!("no source named '{name}'"));
    }
    Ok(())
}

pub fn run_source_list_command(settings: &Settings) {
    let registry = SourceRegistry::new(ConfigStore::for_settings(settings));
    for source in registry.list().values() {
        let mut flags = Vec::new();
        if source.trusted {
            flags.push("trusted");
        }
        if source.is_validated {
            flags.push("validated");
        }
        if !source.is_registered {
            flags.push("built-in");
        }
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!("{} {}{suffix}", source.name, source.location);
    }
}
