use std::path::{Path, PathBuf};

use clap::Parser;
use packhorse_engine::{NativeInstaller, Unpacker};

use super::{Cli, Commands, SourceCommands};
use crate::native::MsiExecInstaller;
use crate::render::{render_status_line, OutputStyle};
use crate::unpack::ShellUnpacker;

#[test]
fn install_arguments_parse_into_a_request_shape() {
    let cli = Cli::try_parse_from([
        "packhorse",
        "install",
        "ripgrep",
        "--url",
        "https://example.test/ripgrep.zip",
        "--url64",
        "https://example.test/ripgrep-x64.zip",
        "--silent-arg",
        "/S",
        "--valid-exit-code",
        "0",
        "--valid-exit-code",
        "3010",
        "--shim-name",
        "rg",
    ])
    .expect("must parse");

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
            assert_eq!(name, "ripgrep");
            assert_eq!(url.as_deref(), Some("https://example.test/ripgrep.zip"));
            assert_eq!(
                url64.as_deref(),
                Some("https://example.test/ripgrep-x64.zip")
            );
            assert!(!force_x86);
            assert_eq!(silent_args, vec!["/S".to_string()]);
            assert_eq!(valid_exit_codes, vec![0, 3010]);
            assert_eq!(shim_name.as_deref(), Some("rg"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn root_override_is_a_global_flag() {
    let cli = Cli::try_parse_from(["packhorse", "--root", "/opt/ph", "doctor"])
        .expect("must parse");
    assert_eq!(cli.root, Some(PathBuf::from("/opt/ph")));
}

#[test]
fn source_add_parses_validation_flags() {
    let cli = Cli::try_parse_from([
        "packhorse",
        "source",
        "add",
        "internal",
        "https://packages.internal/api/v1",
        "--trusted",
        "--skip-validate",
    ])
    .expect("must parse");

    match cli.command {
        Commands::Source {
            command:
                SourceCommands::Add {
                    name,
                    location,
                    trusted,
                    validated,
                    skip_validate,
                },
        } => {
            assert_eq!(name, "internal");
            assert_eq!(location, "https://packages.internal/api/v1");
            assert!(trusted);
            assert!(!validated);
            assert!(skip_validate);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn install_without_a_package_name_is_rejected() {
    assert!(Cli::try_parse_from(["packhorse", "install"]).is_err());
}

#[test]
fn plain_status_lines_carry_status_and_message() {
    let line = render_status_line(OutputStyle::Plain, "ok", "installed 'demo'");
    assert!(line.contains("ok"));
    assert!(line.ends_with("installed 'demo'"));
}

#[test]
fn rich_status_lines_keep_the_message_readable() {
    let line = render_status_line(OutputStyle::Rich, "skip", "nothing to do");
    assert!(line.contains("skip"));
    assert!(line.contains("nothing to do"));
}

#[test]
fn unpacker_rejects_payloads_that_are_not_archives() {
    let err = ShellUnpacker
        .unpack(Path::new("setup.msi"), Path::new("/nowhere"))
        .expect_err("msi is not extracted in place");
    assert!(err.to_string().contains("not extracted in place"));
}

#[test]
fn unpacker_rejects_unrecognized_extensions() {
    let err = ShellUnpacker
        .unpack(Path::new("payload.xyz"), Path::new("/nowhere"))
        .expect_err("unknown payload kind");
    assert!(err.to_string().contains("unrecognized archive"));
}

#[cfg(not(windows))]
#[test]
fn msiexec_delegation_is_windows_only() {
    let err = MsiExecInstaller
        .install(Path::new("setup.msi"), &[])
        .expect_err("must refuse off windows");
    assert!(err.to_string().contains("Windows hosts"));
}
