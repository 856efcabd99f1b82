use std::fs;
use std::path::PathBuf;

use crate::{
    default_source, AddOutcome, ConfigDocument, ConfigStore, Settings, SourceRegistry,
    SourceValidator, CONFIG_SCHEMA, DEFAULT_SOURCE_NAME,
};

struct AlwaysReachable;

impl SourceValidator for AlwaysReachable {
    fn validate(&self, _location: &str) -> bool {
        true
    }
}

struct NeverReachable;

impl SourceValidator for NeverReachable {
    fn validate(&self, _location: &str) -> bool {
        false
    }
}

fn test_root(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "packhorse-config-tests-{label}-{}-{}",
        std::process::id(),
        nanos
    ));
    path
}

fn test_store(label: &str) -> (ConfigStore, PathBuf) {
    let root = test_root(label);
    (ConfigStore::new(root.join("sources.toml")), root)
}

fn assert_default_document(document: &ConfigDocument) {
    assert_eq!(document.schema, CONFIG_SCHEMA);
    assert_eq!(document.sources.len(), 1);
    let entry = &document.sources[0];
    assert_eq!(entry.name.as_deref(), Some(DEFAULT_SOURCE_NAME));
    assert!(entry.validated);
    assert!(!entry.trusted);
}

#[test]
fn load_missing_file_yields_default_document() {
    let (store, root) = test_store("missing");
    assert_default_document(&store.load());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn load_garbage_yields_default_document() {
    let (store, root) = test_store("garbage");
    fs::create_dir_all(store.path().parent().expect("parent")).expect("must create dir");
    fs::write(store.path(), "<<<not toml at all>>>").expect("must write garbage");

    assert_default_document(&store.load());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn load_wrong_schema_marker_yields_default_document() {
    let (store, root) = test_store("schema");
    fs::create_dir_all(store.path().parent().expect("parent")).expect("must create dir");
    fs::write(
        store.path(),
        "schema = \"somebody-else/1\"\n\n[[source]]\nname = \"x\"\nlocation = \"https://x\"\n",
    )
    .expect("must write file");

    assert_default_document(&store.load());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn save_then_load_round_trips() {
    let (store, root) = test_store("roundtrip");
    let mut document = ConfigDocument::default_document();
    document.sources.clear();
    document.sources.push(crate::SourceEntry {
        name: Some("internal".to_string()),
        location: Some("https://pkgs.internal.test/feed".to_string()),
        trusted: true,
        validated: false,
    });

    store.save(&document).expect("must save");
    let loaded = store.load();
    assert_eq!(loaded, document);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn save_creates_missing_parent_directories() {
    let root = test_root("parents");
    let store = ConfigStore::new(root.join("deep").join("nested").join("sources.toml"));
    store
        .save(&ConfigDocument::default_document())
        .expect("must save through missing parents");
    assert!(store.path().exists());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn presence_as_true_flags_are_omitted_when_false() {
    let (store, root) = test_store("flags");
    let mut document = ConfigDocument::default_document();
    document.sources.clear();
    document.sources.push(crate::SourceEntry {
        name: Some("plain".to_string()),
        location: Some("https://plain.test".to_string()),
        trusted: false,
        validated: false,
    });
    store.save(&document).expect("must save");

    let raw = fs::read_to_string(store.path()).expect("must read");
    assert!(!raw.contains("trusted"));
    assert!(!raw.contains("validated"));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn list_is_never_empty() {
    let (store, root) = test_store("never-empty");
    let registry = SourceRegistry::new(store);
    let sources = registry.list();
    assert_eq!(sources.len(), 1);
    let source = sources.values().next().expect("one source");
    assert_eq!(*source, default_source());
    assert!(!source.is_registered);
    assert!(source.is_validated);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn list_skips_records_missing_identity_or_location() {
    let (store, root) = test_store("skip-partial");
    fs::create_dir_all(store.path().parent().expect("parent")).expect("must create dir");
    fs::write(
        store.path(),
        format!(
            "schema = \"{CONFIG_SCHEMA}\"\n\n\
             [[source]]\nname = \"no-location\"\n\n\
             [[source]]\nlocation = \"https://no-name.test\"\n\n\
             [[source]]\nname = \"good\"\nlocation = \"https://good.test\"\ntrusted = true\n"
        ),
    )
    .expect("must write file");

    let registry = SourceRegistry::new(store);
    let sources = registry.list();
    assert_eq!(sources.len(), 1);
    let good = sources.get("good").expect("good source resolves");
    assert_eq!(good.location, "https://good.test");
    assert!(good.trusted);
    assert!(good.is_registered);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn list_resolves_duplicate_names_last_wins() {
    let (store, root) = test_store("duplicates");
    fs::create_dir_all(store.path().parent().expect("parent")).expect("must create dir");
    fs::write(
        store.path(),
        format!(
            "schema = \"{CONFIG_SCHEMA}\"\n\n\
             [[source]]\nname = \"feed\"\nlocation = \"https://old.test\"\n\n\
             [[source]]\nname = \"FEED\"\nlocation = \"https://new.test\"\n"
        ),
    )
    .expect("must write file");

    let registry = SourceRegistry::new(store);
    let sources = registry.list();
    assert_eq!(sources.len(), 1);
    assert_eq!(
        sources.get("feed").expect("resolved").location,
        "https://new.test"
    );
    let _ = fs::remove_dir_all(root);
}

#[test]
fn add_then_remove_round_trips_registry_state() {
    let (store, root) = test_store("add-remove");
    let registry = SourceRegistry::new(store);
    let before = registry.list();

    let outcome = registry
        .add("team", "https://team.test/feed", true, false, true, &NeverReachable)
        .expect("must add");
    assert_eq!(outcome, AddOutcome::Added);
    assert!(registry.list().contains_key("team"));

    assert!(registry.remove("Team").expect("must remove"));
    assert_eq!(registry.list(), before);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn add_without_validation_or_reachability_is_skipped() {
    let (store, root) = test_store("skipped");
    let registry = SourceRegistry::new(store);

    let outcome = registry
        .add(
            "unreachable",
            "https://unreachable.test",
            false,
            false,
            false,
            &NeverReachable,
        )
        .expect("skip is not an error");
    assert_eq!(outcome, AddOutcome::Skipped);
    assert!(!registry.list().contains_key("unreachable"));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn add_with_reachable_location_succeeds() {
    let (store, root) = test_store("reachable");
    let registry = SourceRegistry::new(store);

    let outcome = registry
        .add(
            "reachable",
            "https://reachable.test",
            false,
            true,
            false,
            &AlwaysReachable,
        )
        .expect("must add");
    assert_eq!(outcome, AddOutcome::Added);
    let listed = registry.list();
    let source = listed.get("reachable").expect("resolves");
    assert!(source.is_validated);
    assert!(!source.trusted);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn add_with_existing_local_path_counts_as_reachable() {
    let root = test_root("local-path");
    fs::create_dir_all(&root).expect("must create root");
    let store = ConfigStore::new(root.join("sources.toml"));
    let registry = SourceRegistry::new(store);

    let location = root.to_string_lossy().to_string();
    let outcome = registry
        .add("local", &location, false, false, false, &NeverReachable)
        .expect("must add");
    assert_eq!(outcome, AddOutcome::Added);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn remove_missing_source_is_a_no_op() {
    let (store, root) = test_store("remove-missing");
    let registry = SourceRegistry::new(store);
    assert!(!registry.remove("ghost").expect("no-op, not an error"));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn builtin_default_source_is_never_persisted() {
    let (store, root) = test_store("builtin");
    let registry = SourceRegistry::new(ConfigStore::new(store.path().to_path_buf()));

    registry
        .add("mine", "https://mine.test", false, false, true, &NeverReachable)
        .expect("must add");

    let raw = fs::read_to_string(store.path()).expect("must read saved file");
    assert!(!raw.contains(DEFAULT_SOURCE_NAME));
    assert!(raw.contains("mine"));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn settings_derive_paths_from_one_root() {
    let root = test_root("settings");
    let settings = Settings::with_root(&root);
    assert_eq!(settings.install_root(), root.as_path());
    assert_eq!(settings.lib_dir(), root.join("lib"));
    assert_eq!(settings.bin_dir(), root.join("bin"));
    assert_eq!(settings.tmp_dir(), root.join("tmp"));
    assert_eq!(settings.config_path(), root.join("config").join("sources.toml"));
    assert_eq!(settings.package_dir("demo"), root.join("lib").join("demo"));
    assert_eq!(settings.staging_dir("demo"), root.join("tmp").join("demo"));
}

#[test]
fn settings_ensure_base_dirs_creates_tree() {
    let root = test_root("base-dirs");
    let settings = Settings::with_root(&root);
    settings.ensure_base_dirs().expect("must create dirs");
    assert!(settings.lib_dir().is_dir());
    assert!(settings.bin_dir().is_dir());
    assert!(settings.tmp_dir().is_dir());
    assert!(settings.config_dir().is_dir());
    let _ = fs::remove_dir_all(root);
}
