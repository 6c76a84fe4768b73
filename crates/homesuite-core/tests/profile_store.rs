//! End-to-end tests of profile storage on a real directory tree.

use std::fs;

use chrono::{TimeZone, Utc};
use homesuite_core::codec::{decode_from_slice, decode_list_from_slice};
use homesuite_core::store::{INDEX_FILE, METADATA_FILE, RECORDS_FILE};
use homesuite_core::{
    InventoryItem, ProfileId, ProfileMetadata, ProfileStore, Session, StoreError, Transaction,
};
use tempfile::TempDir;

#[test]
fn new_profile_has_metadata_and_empty_list() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    let profile = store.create_profile::<Transaction>("Alice").unwrap();

    let profile_dir = dir.path().join(profile.id.to_string());
    assert!(profile_dir.is_dir());

    let meta: ProfileMetadata =
        decode_from_slice(&fs::read(profile_dir.join(METADATA_FILE)).unwrap()).unwrap();
    assert_eq!(meta.name, "Alice");
    assert!(meta.created_at.timestamp_millis() > 0);

    let raw = fs::read(profile_dir.join(RECORDS_FILE)).unwrap();
    assert_eq!(raw, 0i32.to_le_bytes());
    assert!(decode_list_from_slice::<Transaction>(&raw).unwrap().is_empty());

    let index = store.list().unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].id, profile.id);
    assert!(dir.path().join(INDEX_FILE).is_file());
}

#[test]
fn created_profile_matches_reloaded_profile() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    let created = store.create_profile::<Transaction>("Alice").unwrap();
    let loaded = store.load_profile::<Transaction>(created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn transactions_reload_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::<Transaction>::new(ProfileStore::open(dir.path()).unwrap());
    let id = session.create_profile("Household").unwrap().id;

    let day = |d| Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap();
    session
        .add(Transaction::expense("Rent", "950".parse().unwrap(), day(1)))
        .unwrap();
    session
        .add(Transaction::expense("Groceries", "64.20".parse().unwrap(), day(2)))
        .unwrap();
    session
        .add(Transaction::income("Salary", "3100".parse().unwrap(), day(3)))
        .unwrap();

    let store = ProfileStore::open(dir.path()).unwrap();
    let profile = store.load_profile::<Transaction>(id).unwrap();
    let kinds: Vec<bool> = profile.records.iter().map(|t| t.is_income).collect();
    assert_eq!(kinds, vec![false, false, true]);
    let titles: Vec<&str> = profile.records.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Rent", "Groceries", "Salary"]);
}

#[test]
fn rapid_creation_yields_unique_ids() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    let mut ids: Vec<ProfileId> = (0..25)
        .map(|i| store.create_profile::<InventoryItem>(&format!("p{i}")).unwrap().id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 25);
    assert_eq!(store.list().unwrap().len(), 25);
}

#[test]
fn reopened_store_never_reuses_ids() {
    let dir = TempDir::new().unwrap();
    let first = ProfileStore::open(dir.path())
        .unwrap()
        .create_profile::<InventoryItem>("one")
        .unwrap()
        .id;
    let second = ProfileStore::open(dir.path())
        .unwrap()
        .create_profile::<InventoryItem>("two")
        .unwrap()
        .id;
    assert!(second > first);
}

#[test]
fn blank_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.create_profile::<Transaction>("   "),
        Err(StoreError::InvalidName(_))
    ));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn load_distinguishes_missing_from_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();

    let err = store.load_profile::<Transaction>(ProfileId(12345)).unwrap_err();
    assert!(err.is_not_found());

    let profile = store.create_profile::<Transaction>("Bob").unwrap();
    let records = store.profile_dir(profile.id).join(RECORDS_FILE);
    fs::write(&records, [5u8, 0, 0, 0, 1]).unwrap();
    assert!(matches!(
        store.load_profile::<Transaction>(profile.id),
        Err(StoreError::Format { .. })
    ));

    fs::remove_file(&records).unwrap();
    assert!(store
        .load_profile::<Transaction>(profile.id)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn load_all_skips_broken_profiles() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    let good = store.create_profile::<Transaction>("Good").unwrap();
    let missing = store.create_profile::<Transaction>("Missing").unwrap();
    let corrupt = store.create_profile::<Transaction>("Corrupt").unwrap();

    fs::remove_dir_all(store.profile_dir(missing.id)).unwrap();
    fs::write(
        store.profile_dir(corrupt.id).join(METADATA_FILE),
        [0xffu8, 0xff, 0xff, 0x7f],
    )
    .unwrap();

    let report = store.load_all::<Transaction>().unwrap();
    assert_eq!(report.profiles.len(), 1);
    assert_eq!(report.profiles[0].id, good.id);
    assert_eq!(report.skipped.len(), 2);

    let missing_skip = report.skipped.iter().find(|s| s.id == missing.id).unwrap();
    assert!(missing_skip.error.is_not_found());
    let corrupt_skip = report.skipped.iter().find(|s| s.id == corrupt.id).unwrap();
    assert!(matches!(corrupt_skip.error, StoreError::Format { .. }));
}

#[test]
fn delete_rewrites_index() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    let keep = store.create_profile::<Transaction>("Keep").unwrap();
    let gone = store.create_profile::<Transaction>("Drop").unwrap();

    store.delete_profile(gone.id).unwrap();
    assert!(!store.profile_dir(gone.id).exists());
    let ids: Vec<_> = store.list().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![keep.id]);

    assert!(store.delete_profile(gone.id).unwrap_err().is_not_found());
}

#[test]
fn inventory_round_trip_through_store() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::<InventoryItem>::new(ProfileStore::open(dir.path()).unwrap());
    let id = session.create_profile("Workshop").unwrap().id;

    let bought = Utc.with_ymd_and_hms(2022, 8, 15, 0, 0, 0).unwrap();
    let mut saw = InventoryItem::new("Table saw", bought);
    saw.warranty_expires = Some(Utc.with_ymd_and_hms(2025, 8, 15, 0, 0, 0).unwrap());
    let saw_id = session.add(saw).unwrap();
    session.add(InventoryItem::new("Clamp", bought)).unwrap();
    session
        .update(saw_id, |item| item.log_maintenance("blade replaced"))
        .unwrap();

    let mut reopened = Session::<InventoryItem>::new(ProfileStore::open(dir.path()).unwrap());
    let profile = reopened.select(id).unwrap();
    assert_eq!(profile.records.len(), 2);
    assert_eq!(profile.records[0].maintenance_history, vec!["blade replaced"]);
    assert!(profile.records[0].warranty_expires.is_some());
    assert_eq!(profile.records[1].warranty_expires, None);
}
