use crate::utils::{log_record_init, rand_guild_id, take_logs, FlakySettings, SETTINGS_KEY};
use server_features::{ErrorKind, FileSettings, InMemorySettings, OverrideStore, SettingsStore};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

mod utils;

#[test]
fn round_trip() {
    let settings = Arc::new(InMemorySettings::new());
    let guilds = (0..5).map(|_| rand_guild_id()).collect::<Vec<String>>();
    let features = ["COMMUNITY", "HUB", "NEWS"];

    let store = OverrideStore::initialize(Box::new(Arc::clone(&settings))).unwrap();
    for (i, guild) in guilds.iter().enumerate() {
        for feature in &features[..i % features.len() + 1] {
            store.toggle(guild, feature).unwrap();
        }
    }
    let before = guilds
        .iter()
        .flat_map(|g| features.iter().map(|f| store.has(g, f)))
        .collect::<Vec<bool>>();
    let snapshot = store.snapshot();
    drop(store);

    let restored = OverrideStore::initialize(Box::new(Arc::clone(&settings))).unwrap();
    let after = guilds
        .iter()
        .flat_map(|g| features.iter().map(|f| restored.has(g, f)))
        .collect::<Vec<bool>>();

    assert_eq!(before, after);
    assert_eq!(snapshot, restored.snapshot());
}

#[test]
fn every_mutation_is_written() {
    let settings = Arc::new(FlakySettings::new());
    let store = OverrideStore::initialize(Box::new(Arc::clone(&settings))).unwrap();
    assert_eq!(settings.writes(), 0);

    store.toggle("123", "COMMUNITY").unwrap();
    assert_eq!(settings.stored().unwrap(), r#"{"123":["COMMUNITY"]}"#);

    store.toggle("123", "HUB").unwrap();
    assert_eq!(settings.stored().unwrap(), r#"{"123":["COMMUNITY","HUB"]}"#);

    store.clear("456").unwrap();
    store.clear("123").unwrap();
    assert_eq!(settings.stored().unwrap(), "{}");

    store.clear_all().unwrap();
    assert_eq!(settings.writes(), 5);
}

#[test]
fn custom_key() {
    let settings = Arc::new(InMemorySettings::new());
    let store = OverrideStore::builder()
        .settings(Box::new(Arc::clone(&settings)))
        .settings_key("guild_overrides")
        .build()
        .unwrap();
    store.toggle("123", "HUB").unwrap();

    assert!(settings.read(SETTINGS_KEY).is_none());
    assert_eq!(settings.read("guild_overrides").unwrap(), r#"{"123":["HUB"]}"#);
}

#[test]
fn loads_persisted_blob() {
    let settings =
        FlakySettings::with_value(r#"{"123":["HUB","COMMUNITY"],"456":[],"789":["NEWS"]}"#);
    let store = OverrideStore::initialize(Box::new(settings)).unwrap();

    assert!(store.has("123", "HUB"));
    assert!(store.has("123", "COMMUNITY"));
    assert!(store.has("789", "NEWS"));
    assert!(!store.has_overrides("456"));
    assert_eq!(store.snapshot().len(), 2);
}

#[test]
fn malformed_blob_starts_empty() {
    log_record_init();

    for blob in ["not json", r#"["123"]"#, r#"{"123":"HUB"}"#, r#"{"123":[true]}"#] {
        let settings = Arc::new(FlakySettings::with_value(blob));
        let store = OverrideStore::initialize(Box::new(Arc::clone(&settings))).unwrap();

        assert!(store.snapshot().is_empty());
        let logs = take_logs();
        assert!(
            logs.starts_with(
                "WARNING [1000] Ignoring malformed feature overrides stored under 'ServerFeatures'."
            ),
            "{logs}"
        );

        // The malformed blob is replaced on the next write.
        store.toggle("123", "HUB").unwrap();
        assert_eq!(settings.stored().unwrap(), r#"{"123":["HUB"]}"#);
    }
}

#[test]
fn blank_blob_is_not_malformed() {
    log_record_init();

    for blob in ["", "  \n"] {
        let store = OverrideStore::initialize(Box::new(FlakySettings::with_value(blob))).unwrap();
        assert!(store.snapshot().is_empty());
    }
    assert!(take_logs().is_empty());
}

#[test]
fn write_failure_propagates() {
    log_record_init();

    let settings = Arc::new(FlakySettings::new());
    let store = OverrideStore::initialize(Box::new(Arc::clone(&settings))).unwrap();
    store.toggle("123", "COMMUNITY").unwrap();
    settings.fail(true);

    let err = store.toggle("123", "HUB").unwrap_err();
    assert_eq!(err.kind, ErrorKind::PersistenceFailure);
    assert!(!store.has("123", "HUB"));
    assert_eq!(settings.stored().unwrap(), r#"{"123":["COMMUNITY"]}"#);

    let logs = take_logs();
    assert_eq!(
        logs,
        "ERROR [2000] Failed to persist feature overrides under 'ServerFeatures'. (settings are read-only)\n"
    );

    assert_eq!(store.clear("123").unwrap_err().kind, ErrorKind::PersistenceFailure);
    assert_eq!(store.clear_all().unwrap_err().kind, ErrorKind::PersistenceFailure);
    assert!(store.has("123", "COMMUNITY"));
}

#[test]
fn file_settings_survive_restart() {
    let dir = temp_dir("restart");

    {
        let settings = FileSettings::new(&dir).unwrap();
        let store = OverrideStore::initialize(Box::new(settings)).unwrap();
        store.toggle("123", "COMMUNITY").unwrap();
        store.toggle("456", "HUB").unwrap();
    }

    let store = OverrideStore::initialize(Box::new(FileSettings::new(&dir).unwrap())).unwrap();
    assert!(store.has("123", "COMMUNITY"));
    assert!(store.has("456", "HUB"));
    assert!(!store.has("456", "COMMUNITY"));

    store.shutdown().unwrap();
    let store = OverrideStore::initialize(Box::new(FileSettings::new(&dir).unwrap())).unwrap();
    assert!(store.snapshot().is_empty());

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn unreadable_settings_file_is_logged() {
    log_record_init();

    let dir = temp_dir("unreadable");
    let settings = FileSettings::new(&dir).unwrap();
    fs::write(settings.path(SETTINGS_KEY), [0xff, 0xfe, 0xfd]).unwrap();

    let store = OverrideStore::initialize(Box::new(settings)).unwrap();
    assert!(store.snapshot().is_empty());
    let logs = take_logs();
    assert!(logs.starts_with("WARNING [1000] Cannot read settings file '"), "{logs}");
    assert_eq!(logs.lines().count(), 1, "{logs}");

    // A missing file is simply absent.
    let settings = FileSettings::new(&dir).unwrap();
    assert!(settings.read("OtherKey").is_none());
    assert!(take_logs().is_empty());

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn settings_key_cannot_leave_settings_dir() {
    let dir = temp_dir("escape");

    for key in ["../escaped", "nested/key", "nested\\key"] {
        let err = OverrideStore::builder()
            .settings(Box::new(FileSettings::new(&dir).unwrap()))
            .settings_key(key)
            .build()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSettingsKey);
    }
    assert!(!dir.parent().unwrap().join("escaped.json").exists());

    fs::remove_dir_all(dir).unwrap();
}

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    std::env::temp_dir().join(format!("server-features-{name}-{nanos}"))
}
