use std::collections::HashMap;
use std::fs;

use originshift_core::{
    run_migration, run_migration_with_preferences, KeyValueStore, LevelDbStore, MigrationConfig,
    MigrationOutcome, Origin, ReferenceDatabase, SkipReason, StorageLayout, PREF_PORT,
    PREF_PREVIOUS_HOSTNAME, PREF_PREVIOUS_PORT, PREF_PREVIOUS_SCHEME,
};

fn seed_local_storage(layout: &StorageLayout, records: &[(&[u8], &[u8])]) {
    let path = layout.local_storage_dir();
    fs::create_dir_all(&path).unwrap();
    let mut store = LevelDbStore::create(&path).unwrap();
    for (key, value) in records {
        store.put(key, value).unwrap();
    }
    store.close().unwrap();
}

fn read(layout: &StorageLayout, key: &[u8]) -> Option<Vec<u8>> {
    let mut store = LevelDbStore::open(layout.local_storage_dir()).unwrap();
    let value = store.get(key).unwrap();
    store.close().unwrap();
    value
}

fn port_change() -> MigrationConfig {
    MigrationConfig::new(
        Origin::new("http", "localhost", "8080"),
        Origin::new("http", "localhost", "9090"),
    )
}

#[test]
fn test_local_storage_port_change_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(dir.path());
    seed_local_storage(
        &layout,
        &[
            (&b"VERSION"[..], &b"1"[..]),
            (&b"META:http://localhost:8080"[..], &b"\x08\x80\x01"[..]),
            (&b"_http://localhost:8080\x00\x01count"[..], &b"3"[..]),
            (&b"_http://example.com\x00\x01x"[..], &b"y"[..]),
        ],
    );

    let report = run_migration(dir.path(), &port_change());
    assert_eq!(report.local_storage.migrated_count(), Some(2));

    assert_eq!(
        read(&layout, b"_http://localhost:9090\x00\x01count"),
        Some(b"3".to_vec())
    );
    assert_eq!(
        read(&layout, b"META:http://localhost:9090"),
        Some(b"\x08\x80\x01".to_vec())
    );
    assert_eq!(
        read(&layout, b"_http://localhost:8080\x00\x01count"),
        Some(b"3".to_vec())
    );
    assert_eq!(read(&layout, b"_http://example.com\x00\x01x"), Some(b"y".to_vec()));

    let again = run_migration(dir.path(), &port_change());
    assert!(matches!(
        again.local_storage,
        MigrationOutcome::Skipped(SkipReason::AlreadyMigrated)
    ));
}

#[test]
fn test_legacy_file_origin_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(dir.path());
    seed_local_storage(
        &layout,
        &[
            (&b"META:file://"[..], &b""[..]),
            (&b"_file://\x00\x01session"[..], &b"token"[..]),
        ],
    );

    fs::create_dir_all(layout.websql_dir("file__0")).unwrap();
    fs::write(layout.websql_dir("file__0").join("1"), b"sqlite").unwrap();
    let mut db = ReferenceDatabase::create(layout.reference_db()).unwrap();
    db.insert_database("file__0", "app", "App data", 5 * 1024 * 1024)
        .unwrap();
    db.close().unwrap();

    let prefs: HashMap<String, String> = [(PREF_PORT.to_string(), "8080".to_string())]
        .into_iter()
        .collect();
    let report = run_migration_with_preferences(dir.path(), &prefs);

    assert_eq!(report.local_storage.migrated_count(), Some(2));
    assert_eq!(
        report.websql.as_ref().and_then(|o| o.migrated_count()),
        Some(1)
    );
    assert!(!report.has_failures());

    assert_eq!(
        read(&layout, b"_http://localhost:8080\x00\x01session"),
        Some(b"token".to_vec())
    );
    assert!(layout.websql_dir("http_localhost_8080").join("1").exists());

    let mut db = ReferenceDatabase::open(layout.reference_db()).unwrap();
    assert_eq!(db.origins().unwrap(), vec!["http_localhost_8080".to_string()]);
    db.close().unwrap();

    let again = run_migration_with_preferences(dir.path(), &prefs);
    assert!(again.local_storage.is_skipped());
    assert!(again.websql.as_ref().is_some_and(|o| o.is_skipped()));
}

#[test]
fn test_websql_failure_does_not_block_local_storage() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(dir.path());
    seed_local_storage(&layout, &[(&b"_http://localhost:8080\x00\x01k"[..], &b"v"[..])]);

    // A reference database that is not SQLite.
    fs::create_dir_all(layout.websql_dir("http_localhost_8080")).unwrap();
    fs::write(layout.reference_db(), b"definitely not sqlite").unwrap();

    let report = run_migration(dir.path(), &port_change());
    assert_eq!(report.local_storage.migrated_count(), Some(1));
    assert!(report.websql.as_ref().is_some_and(|o| o.is_failure()));
    assert!(report.has_failures());
}

#[test]
fn test_configured_previous_origin_from_preferences() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(dir.path());
    seed_local_storage(&layout, &[(&b"_http://localhost:8080\x00\x01k"[..], &b"v"[..])]);

    let prefs: HashMap<String, String> = [
        (PREF_PREVIOUS_SCHEME, "http"),
        (PREF_PREVIOUS_HOSTNAME, "localhost"),
        (PREF_PREVIOUS_PORT, "8080"),
        (PREF_PORT, "9090"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let report = run_migration_with_preferences(dir.path(), &prefs);
    assert_eq!(report.local_storage.migrated_count(), Some(1));
    assert_eq!(
        read(&layout, b"_http://localhost:9090\x00\x01k"),
        Some(b"v".to_vec())
    );
}
