use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_versioned_filenames() {
    let parsed = parse_filename("V1__create_users_table.sql").unwrap();
    assert_eq!(parsed.kind, MigrationKind::Versioned);
    assert_eq!(parsed.version.unwrap().as_str(), "1");
    assert_eq!(parsed.description, "create users table");

    let parsed = parse_filename("V20240215_120000__add_user_profile.sql").unwrap();
    assert_eq!(parsed.version.unwrap().as_str(), "20240215_120000");
    assert_eq!(parsed.description, "add user profile");

    let parsed = parse_filename("V1.5__initial_schema.sql").unwrap();
    assert_eq!(parsed.version.unwrap().as_str(), "1.5");
    assert_eq!(parsed.description, "initial schema");
}

#[test]
fn test_parse_repeatable_filenames() {
    let parsed = parse_filename("RA__refresh_views.sql").unwrap();
    assert_eq!(parsed.kind, MigrationKind::RunsAlways);
    assert!(parsed.version.is_none());
    assert_eq!(parsed.description, "refresh views");

    let parsed = parse_filename("ROC__grant_permissions.sql").unwrap();
    assert_eq!(parsed.kind, MigrationKind::RunsOnChange);
    assert_eq!(parsed.description, "grant permissions");
}

#[test]
fn test_non_migration_filenames() {
    for name in [
        "README.md",
        "V1_create.sql",
        "V__missing_version.sql",
        "v1__lowercase.sql",
        "V1__desc.SQL",
        "V1__desc.sql.bak",
        "Vx__bad.sql",
        "RA_single_underscore.sql",
        "notes.sql",
    ] {
        assert!(parse_filename(name).is_none(), "'{name}' should not match");
    }
}

#[test]
fn test_description_from_filename() {
    assert_eq!(
        description_from_filename("V1__create_users_table.sql"),
        "create users table"
    );
    assert_eq!(description_from_filename("plain_name.sql"), "plain name");
    assert_eq!(description_from_filename("ROC__a__b.sql"), "a  b");
}

#[test]
fn test_kind_strings_round_trip() {
    for kind in [
        MigrationKind::Versioned,
        MigrationKind::RunsAlways,
        MigrationKind::RunsOnChange,
    ] {
        assert_eq!(kind.as_str().parse::<MigrationKind>().unwrap(), kind);
    }
    assert!("repeatable".parse::<MigrationKind>().is_err());
    assert!(MigrationKind::RunsAlways.is_repeatable());
    assert!(!MigrationKind::Versioned.is_repeatable());
}

#[test]
fn test_versioned_filename() {
    assert_eq!(
        versioned_filename("3", "Add orders table"),
        "V3__add_orders_table.sql"
    );
    let name = versioned_filename("1.2", "seed-data");
    assert_eq!(name, "V1.2__seed_data.sql");
    assert!(parse_filename(&name).is_some());
}

#[test]
fn test_repeatable_filename() {
    let name = repeatable_filename(MigrationKind::RunsOnChange, "User views").unwrap();
    assert_eq!(name, "ROC__user_views.sql");
    assert_eq!(parse_filename(&name).unwrap().kind, MigrationKind::RunsOnChange);
    assert_eq!(
        repeatable_filename(MigrationKind::RunsAlways, "grants").as_deref(),
        Some("RA__grants.sql")
    );
    assert!(repeatable_filename(MigrationKind::Versioned, "x").is_none());
}

#[test]
fn test_load_extracts_statements_and_checksum() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("V2__add_email.sql");
    std::fs::write(
        &path,
        "-- upgrade\n\nALTER TABLE users ADD COLUMN email VARCHAR;\n\n-- rollback\n\nALTER TABLE users DROP COLUMN email;\n",
    )
    .unwrap();

    let file = MigrationFile::load(&path).unwrap();
    assert_eq!(file.filename, "V2__add_email.sql");
    assert_eq!(file.version_str(), Some("2"));
    assert_eq!(file.description, "add email");
    assert_eq!(
        file.upgrade_statements,
        vec!["ALTER TABLE users ADD COLUMN email VARCHAR;"]
    );
    assert_eq!(
        file.rollback_statements,
        vec!["ALTER TABLE users DROP COLUMN email;"]
    );
    assert_eq!(file.checksum, statements_checksum(&file.upgrade_statements));
}

#[test]
fn test_load_rejects_non_migration_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.sql");
    std::fs::write(&path, "-- upgrade\nSELECT 1;\n").unwrap();
    assert!(matches!(
        MigrationFile::load(&path),
        Err(CoreError::InvalidMigrationFilename { .. })
    ));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("V9__gone.sql");
    assert!(matches!(
        MigrationFile::load(&path),
        Err(CoreError::IoWithPath { .. })
    ));
}

#[test]
fn test_template_parses_to_empty_sections() {
    let sql = parse_sections(MIGRATION_TEMPLATE);
    assert!(sql.upgrade.is_empty());
    assert!(sql.rollback.is_empty());
}
