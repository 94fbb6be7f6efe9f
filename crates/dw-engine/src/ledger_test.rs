use super::*;
use dw_db::{DatabaseCore, DatabaseSchema, DuckDbBackend};

const TABLE: &str = "dbwarden_migrations";

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

async fn ledger_db() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    Ledger::new(&db, TABLE).ensure_table().await.unwrap();
    db
}

#[tokio::test]
async fn test_ensure_table_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let ledger = Ledger::new(&db, TABLE);
    assert!(!ledger.table_exists().await.unwrap());
    ledger.ensure_table().await.unwrap();
    ledger.ensure_table().await.unwrap();
    assert!(ledger.table_exists().await.unwrap());
    assert!(ledger.records().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_and_read_versioned() {
    let db = ledger_db().await;
    let ledger = Ledger::new(&db, TABLE);

    ledger
        .record_versioned_apply(&v("1"), "create users", "V1__create_users.sql", "abc")
        .await
        .unwrap();
    ledger
        .record_versioned_apply(&v("2"), "add email", "V2__add_email.sql", "def")
        .await
        .unwrap();

    let records = ledger.records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].version.as_deref(), Some("1"));
    assert_eq!(records[0].description, "create users");
    assert_eq!(records[0].migration_type, MigrationKind::Versioned);
    assert_eq!(records[0].checksum.as_deref(), Some("abc"));
    assert!(records[0].order_executed < records[1].order_executed);

    assert_eq!(ledger.applied_versions().await.unwrap(), vec!["1", "2"]);
    let latest = ledger.latest_versioned_entry().await.unwrap().unwrap();
    assert_eq!(latest.version.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_latest_entry_ties_broken_by_order() {
    let db = ledger_db().await;
    let ledger = Ledger::new(&db, TABLE);

    // now() is fixed for the whole transaction, so both rows share applied_at
    db.begin().await.unwrap();
    ledger
        .record_versioned_apply(&v("1"), "a", "V1__a.sql", "x")
        .await
        .unwrap();
    ledger
        .record_versioned_apply(&v("2"), "b", "V2__b.sql", "y")
        .await
        .unwrap();
    db.commit().await.unwrap();

    let latest = ledger.latest_versioned_entry().await.unwrap().unwrap();
    assert_eq!(latest.version.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_duplicate_version_rejected() {
    let db = ledger_db().await;
    let ledger = Ledger::new(&db, TABLE);
    ledger
        .record_versioned_apply(&v("1.5"), "a", "V1.5__a.sql", "x")
        .await
        .unwrap();

    for dup in ["1.5", "1.5.0"] {
        let err = ledger
            .record_versioned_apply(&v(dup), "a", "V1.5__a.sql", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::DuplicateVersion { .. }), "{err:?}");
    }
    assert!(ledger.is_version_applied(&v("1.5.0")).await.unwrap());
    assert!(!ledger.is_version_applied(&v("1.6")).await.unwrap());
}

#[tokio::test]
async fn test_revert_versioned() {
    let db = ledger_db().await;
    let ledger = Ledger::new(&db, TABLE);
    ledger
        .record_versioned_apply(&v("1"), "a", "V1__a.sql", "x")
        .await
        .unwrap();

    assert!(ledger.record_versioned_revert("1").await.unwrap());
    assert!(!ledger.record_versioned_revert("1").await.unwrap());
    assert!(ledger.latest_versioned_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_repeatable_replaces_row() {
    let db = ledger_db().await;
    let ledger = Ledger::new(&db, TABLE);

    ledger
        .upsert_repeatable("ROC__views.sql", "views", MigrationKind::RunsOnChange, "c1")
        .await
        .unwrap();
    ledger
        .upsert_repeatable("ROC__views.sql", "views", MigrationKind::RunsOnChange, "c2")
        .await
        .unwrap();
    ledger
        .upsert_repeatable("RA__grants.sql", "grants", MigrationKind::RunsAlways, "g1")
        .await
        .unwrap();

    let records = ledger.records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.is_versioned()));

    let on_change = ledger
        .repeatable_checksums(MigrationKind::RunsOnChange)
        .await
        .unwrap();
    assert_eq!(on_change.len(), 1);
    assert_eq!(on_change["ROC__views.sql"], "c2");

    let always = ledger
        .repeatable_checksums(MigrationKind::RunsAlways)
        .await
        .unwrap();
    assert_eq!(always["RA__grants.sql"], "g1");

    // repeatables never count as the latest versioned entry
    assert!(ledger.latest_versioned_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_qualified_table_name() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.create_schema_if_not_exists("ops").await.unwrap();
    let ledger = Ledger::new(&db, "ops.history");
    ledger.ensure_table().await.unwrap();
    assert!(ledger.table_exists().await.unwrap());
    ledger
        .record_versioned_apply(&v("1"), "a", "V1__a.sql", "x")
        .await
        .unwrap();
    assert_eq!(ledger.applied_versions().await.unwrap(), vec!["1"]);
}

#[test]
fn test_parse_timestamp_with_and_without_fraction() {
    let with_fraction = parse_timestamp("2024-02-15 12:00:00.123456").unwrap();
    let without = parse_timestamp("2024-02-15 12:00:00").unwrap();
    assert!(with_fraction > without);
    assert!(parse_timestamp("yesterday").is_err());
}
