use std::path::Path;

use crate::{source_key, InstallRequest, PayloadKind};

#[test]
fn classify_by_extension() {
    assert_eq!(
        PayloadKind::classify(Path::new("/tmp/tool-1.2.msi")),
        Some(PayloadKind::Msi)
    );
    assert_eq!(
        PayloadKind::classify(Path::new("patch.MSU")),
        Some(PayloadKind::Msu)
    );
    assert_eq!(
        PayloadKind::classify(Path::new("setup.exe")),
        Some(PayloadKind::SelfExtracting)
    );
    assert_eq!(
        PayloadKind::classify(Path::new("bundle.zip")),
        Some(PayloadKind::Zip)
    );
    assert_eq!(
        PayloadKind::classify(Path::new("bundle.7z")),
        Some(PayloadKind::SevenZip)
    );
}

#[test]
fn classify_tarball_variants() {
    assert_eq!(
        PayloadKind::classify(Path::new("tool.tar.gz")),
        Some(PayloadKind::TarGz)
    );
    assert_eq!(
        PayloadKind::classify(Path::new("tool.tgz")),
        Some(PayloadKind::TarGz)
    );
}

#[test]
fn classify_rejects_unknown_payloads() {
    assert_eq!(PayloadKind::classify(Path::new("notes.txt")), None);
    assert_eq!(PayloadKind::classify(Path::new("no-extension")), None);
}

#[test]
fn payload_class_predicates() {
    assert!(PayloadKind::Zip.is_archive());
    assert!(PayloadKind::TarGz.is_archive());
    assert!(!PayloadKind::Msi.is_archive());
    assert!(PayloadKind::Msi.is_native_installer());
    assert!(PayloadKind::Msu.is_native_installer());
    assert!(!PayloadKind::SelfExtracting.is_native_installer());
}

#[test]
fn select_url_prefers_64bit_on_64bit_host() {
    let mut request = InstallRequest::new("demo");
    request.url = Some("https://example.test/demo-x86.zip".to_string());
    request.url64 = Some("https://example.test/demo-x64.zip".to_string());

    assert_eq!(
        request.select_url(true),
        Some("https://example.test/demo-x64.zip")
    );
}

#[test]
fn select_url_honors_force_x86() {
    let mut request = InstallRequest::new("demo");
    request.url = Some("https://example.test/demo-x86.zip".to_string());
    request.url64 = Some("https://example.test/demo-x64.zip".to_string());
    request.force_x86 = true;

    assert_eq!(
        request.select_url(true),
        Some("https://example.test/demo-x86.zip")
    );
}

#[test]
fn select_url_falls_back_to_plain_url() {
    let mut request = InstallRequest::new("demo");
    request.url = Some("https://example.test/demo.zip".to_string());

    assert_eq!(
        request.select_url(true),
        Some("https://example.test/demo.zip")
    );
    assert_eq!(
        request.select_url(false),
        Some("https://example.test/demo.zip")
    );
}

#[test]
fn select_url_with_no_urls_is_none() {
    let request = InstallRequest::new("demo");
    assert_eq!(request.select_url(true), None);
}

#[test]
fn select_url_skips_empty_url64() {
    let mut request = InstallRequest::new("demo");
    request.url = Some("https://example.test/demo.zip".to_string());
    request.url64 = Some(String::new());

    assert_eq!(
        request.select_url(true),
        Some("https://example.test/demo.zip")
    );
}

#[test]
fn default_valid_exit_codes_accept_zero_only() {
    let request = InstallRequest::new("demo");
    assert!(request.valid_exit_codes.contains(&0));
    assert_eq!(request.valid_exit_codes.len(), 1);
}

#[test]
fn source_keys_compare_case_insensitively() {
    assert_eq!(source_key("Community"), "community");
    assert_eq!(source_key("  MixedCase  "), "mixedcase");
    assert_eq!(source_key("already-lower"), "already-lower");
}
