//! Integration tests for the package admin surface
//!
//! Tests cover:
//! - Assignment lifecycle and gesture validation
//! - Reconciliation on package CRUD
//! - Rekey on id-changing updates and purge on feature deletes
//! - Persistence round trip carrying catalogs and map together
//! - Tolerant decoding of damaged saved state

use permat_common::db::{ensure_schema, load_state_blob, save_state_blob};
use permat_common::entities::Package;
use permat_common::Error;
use permat_pf::admin::{PackageAdminState, STATE_BLOB_KEY};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}

#[test]
fn assignment_moves_through_lifecycle_states() {
    let mut state = PackageAdminState::new_seeded();
    assert!(state.mapping().features_of("1").is_none());

    state.assign(1, 2).unwrap();
    assert!(state.mapping().features_of("1").unwrap().contains("2"));

    // Withdrawing the only feature keeps the package entry
    state.unassign(1, 2);
    assert!(state.mapping().contains_package("1"));
    assert!(state.mapping().features_of("1").unwrap().is_empty());
}

#[test]
fn assign_rejects_unknown_entities() {
    let mut state = PackageAdminState::new_seeded();
    assert!(matches!(state.assign(99, 1), Err(Error::NotFound(_))));
    assert!(matches!(state.assign(1, 99), Err(Error::NotFound(_))));
    assert!(state.mapping().is_empty());
}

#[test]
fn package_create_and_delete_reconcile_the_map() {
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();

    let id = state.create_package("Trial", None, Some(0.0), Some(14));
    assert!(state.mapping().contains_package(&id.to_string()));
    assert!(state.mapping().features_of(&id.to_string()).unwrap().is_empty());
    assert!(state.mapping().features_of("1").unwrap().contains("2"));

    state.delete_package(1).unwrap();
    assert!(!state.mapping().contains_package("1"));
}

#[test]
fn id_changing_update_rekeys_assignments() {
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();

    let mut package = state.packages.get(1).cloned().unwrap();
    package.id = 50;
    state.update_package(1, package).unwrap();

    assert!(!state.mapping().contains_package("1"));
    assert!(state.mapping().features_of("50").unwrap().contains("2"));
}

#[test]
fn id_collision_update_unions_feature_sets() {
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();
    state.assign(2, 3).unwrap();

    let mut package = state.packages.get(2).cloned().unwrap();
    package.id = 1;
    state.update_package(2, package).unwrap();

    let merged = state.mapping().features_of("1").unwrap();
    assert!(merged.contains("2"));
    assert!(merged.contains("3"));
    assert!(!state.mapping().contains_package("2"));
}

#[test]
fn feature_delete_purges_every_set() {
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();
    state.assign(2, 2).unwrap();
    state.assign(2, 3).unwrap();

    state.delete_feature(2).unwrap();
    assert!(!state.mapping().features_of("1").unwrap().contains("2"));
    let remaining = state.mapping().features_of("2").unwrap();
    assert!(!remaining.contains("2"));
    assert!(remaining.contains("3"));
}

#[test]
fn feature_id_change_renames_members() {
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();

    let mut feature = state.features.get(2).cloned().unwrap();
    feature.id = 60;
    state.update_feature(2, feature).unwrap();

    let set = state.mapping().features_of("1").unwrap();
    assert!(set.contains("60"));
    assert!(!set.contains("2"));
}

#[test]
fn snapshot_is_isolated_from_later_mutations() {
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();

    let snap = state.snapshot();
    state.clear_package_features(1);

    assert!(snap.features_of("1").unwrap().contains("2"));
    assert!(state.mapping().features_of("1").unwrap().is_empty());
}

#[tokio::test]
async fn save_and_load_round_trip_carries_catalogs_and_map() {
    let pool = setup_test_db().await;

    let mut state = PackageAdminState::new_seeded();
    let id = state.create_package("Custom", Some("user built"), Some(12.5), Some(90));
    state.assign(id, 2).unwrap();
    state.save(&pool).await.unwrap();

    let reloaded = PackageAdminState::load(&pool).await.unwrap();
    assert_eq!(reloaded.mapping(), state.mapping());
    let custom = reloaded.packages.get(id).unwrap();
    assert_eq!(custom.name, "Custom");
    assert_eq!(custom.description, "user built");
    assert_eq!(custom.price, 12.5);
    assert_eq!(custom.duration_days, 90);
    assert_eq!(reloaded.features.len(), state.features.len());
}

#[tokio::test]
async fn load_without_saved_state_uses_seed_catalogs() {
    let pool = setup_test_db().await;
    let state = PackageAdminState::load(&pool).await.unwrap();
    assert!(!state.packages.is_empty());
    assert!(!state.features.is_empty());
    assert!(state.mapping().is_empty());
}

#[tokio::test]
async fn load_with_corrupt_blob_falls_back_to_seeds() {
    let pool = setup_test_db().await;
    save_state_blob(&pool, STATE_BLOB_KEY, "{broken").await.unwrap();

    let state = PackageAdminState::load(&pool).await.unwrap();
    assert!(!state.packages.is_empty());
    assert!(state.mapping().is_empty());
}

#[tokio::test]
async fn load_skips_malformed_records_keeps_good_ones() {
    let pool = setup_test_db().await;
    let blob = r#"{
        "packages": [
            {"id": 1, "name": "Good"},
            "not an object",
            {"id": "wrong type", "name": "Bad"}
        ],
        "features": [{"id": 2, "name": "Kept", "code": "K"}],
        "mapping": {"1": ["2"]}
    }"#;
    save_state_blob(&pool, STATE_BLOB_KEY, blob).await.unwrap();

    let state = PackageAdminState::load(&pool).await.unwrap();
    assert_eq!(state.packages.len(), 1);
    assert_eq!(state.packages.get(1).unwrap().name, "Good");
    assert_eq!(state.features.get(2).unwrap().code, "K");
    assert!(state.mapping().features_of("1").unwrap().contains("2"));
}

#[tokio::test]
async fn saved_blob_has_three_sections() {
    let pool = setup_test_db().await;
    let mut state = PackageAdminState::new_seeded();
    state.assign(1, 2).unwrap();
    state.save(&pool).await.unwrap();

    let text = load_state_blob(&pool, STATE_BLOB_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value["packages"].is_array());
    assert!(value["features"].is_array());
    assert_eq!(value["mapping"], serde_json::json!({"1": ["2"]}));
    // Entities serialize with camelCase field names
    assert!(value["packages"][0]["createdAt"].is_i64());
    assert!(value["packages"][0]["durationDays"].is_i64());
}

#[test]
fn update_of_missing_package_reports_not_found() {
    let mut state = PackageAdminState::new_seeded();
    let ghost = Package::new(99, "Ghost");
    assert!(matches!(
        state.update_package(99, ghost),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(state.delete_package(99), Err(Error::NotFound(_))));
}
