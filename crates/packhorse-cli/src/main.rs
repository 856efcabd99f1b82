use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use packhorse_config::Settings;
use packhorse_core::InstallRequest;

mod commands;
mod fetch;
mod native;
mod render;
mod unpack;

#[derive(Parser, Debug)]
#[command(name = "packhorse")]
#[command(about = "Package provider engine for archives and native installers", long_about = None)]
struct Cli {
    /// Install root override. Defaults to PACKHORSE_ROOT or the per-platform
    /// location.
    #[arg(long)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and install a package payload.
    Install {
        name: String,
        /// Payload location; an existing local file is used as-is.
        #[arg(long)]
        url: Option<String>,
        /// Payload location preferred on 64-bit hosts.
        #[arg(long)]
        url64: Option<String>,
        /// Use the 32-bit payload even on a 64-bit host.
        #[arg(long)]
        force_x86: bool,
        /// Arguments handed to native and self-extracting installers.
        #[arg(long = "silent-arg")]
        silent_args: Vec<String>,
        /// Installer exit codes to accept besides 0.
        #[arg(long = "valid-exit-code")]
        valid_exit_codes: Vec<i32>,
        /// Name the generated launcher this instead of the executable stem.
        #[arg(long)]
        shim_name: Option<String>,
    },
    /// Reverse an install using its recorded receipt.
    Uninstall { name: String },
    /// Manage configured package sources.
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },
    /// Print the resolved install layout.
    Doctor,
    Version,
}

#[derive(Subcommand, Debug)]
enum SourceCommands {
    Add {
        name: String,
        location: String,
        #[arg(long)]
        trusted: bool,
        #[arg(long)]
        validated: bool,
        /// Add the source without probing its location first.
        #[arg(long)]
        skip_validate: bool,
    },
    Remove { name: String },
    List,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let settings = commands::settings_for(cli.root)?;

    match cli.command {
        Commands::Install {
            name,
            url,
            url64,
            force_x86,
            silent_args,
            valid_exit_codes,
            shim_name,
        } => {
            let mut request = InstallRequest::new(name);
            request.url = url;
            request.url64 = url64;
            request.force_x86 = force_x86;
            request.silent_args = silent_args;
            if !valid_exit_codes.is_empty() {
                request.valid_exit_codes = valid_exit_codes.into_iter().collect();
            }
            request.shim_name_override = shim_name;
            commands::run_install_command(&settings, &request)?;
        }
        Commands::Uninstall { name } => {
            commands::run_uninstall_command(&settings, &name)?;
        }
        Commands::Source { command } => match command {
            SourceCommands::Add {
                name,
                location,
                trusted,
                validated,
                skip_validate,
            } => {
                commands::run_source_add_command(
                    &settings,
                    &name,
                    &location,
                    trusted,
                    validated,
                    skip_validate,
                )?;
            }
            SourceCommands::Remove { name } => {
                commands::run_source_remove_command(&settings, &name)?;
            }
            SourceCommands::List => {
                commands::run_source_list_command(&settings);
            }
        },
        Commands::Doctor => {
            run_doctor(&settings);
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn run_doctor(settings: &Settings) {
    render::print_status(
        "step",
        &format!("root: {}", settings.install_root().display()),
    );
    render::print_status("step", &format!("lib: {}", settings.lib_dir().display()));
    render::print_status("step", &format!("bin: {}", settings.bin_dir().display()));
    render::print_status(
        "step",
        &format!("config: {}", settings.config_path().display()),
    );
    render::print_status(
        "step",
        &format!("elevated: {}", settings.elevated()),
    );
}

#[cfg(test)]
mod tests;
