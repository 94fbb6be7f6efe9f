//! CLI integration tests
//!
//! Runs the `dbwarden` binary against temporary projects with a file-backed
//! DuckDB database, so state carries across invocations.

use dw_db::DuckDbBackend;
use dw_engine::LockManager;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled dbwarden binary (resolved at compile time)
fn dbwarden_bin() -> String {
    env!("CARGO_BIN_EXE_dbwarden").to_string()
}

fn dbwarden(project: &Path, args: &[&str]) -> Output {
    Command::new(dbwarden_bin())
        .args(args)
        .args(["--project-dir", project.to_str().unwrap(), "--quiet"])
        .env_remove("DBWARDEN_DATABASE")
        .env_remove("DBWARDEN_SCHEMA")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run dbwarden")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed.\nstdout: {}\nstderr: {}",
        stdout(output),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Initialized project with two versioned migrations.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    assert_success(&dbwarden(tmp.path(), &["init"]));
    let migrations = tmp.path().join("migrations");
    std::fs::write(
        migrations.join("V1__create_users.sql"),
        "-- upgrade\n\nCREATE TABLE users (id INTEGER, name VARCHAR);\n\n-- rollback\n\nDROP TABLE users;\n",
    )
    .unwrap();
    std::fs::write(
        migrations.join("V2__add_email.sql"),
        "-- upgrade\n\nALTER TABLE users ADD COLUMN email VARCHAR;\n\n-- rollback\n\nALTER TABLE users DROP COLUMN email;\n",
    )
    .unwrap();
    tmp
}

fn status_json(project: &Path) -> serde_json::Value {
    let output = dbwarden(project, &["status", "--output", "json"]);
    assert_success(&output);
    serde_json::from_str(&stdout(&output)).unwrap()
}

// ── init / new ─────────────────────────────────────────────────────────

#[test]
fn test_init_scaffolds_project() {
    let tmp = TempDir::new().unwrap();
    assert_success(&dbwarden(tmp.path(), &["init"]));
    assert!(tmp.path().join("warden.yml").is_file());
    assert!(tmp.path().join("migrations").is_dir());

    let config = std::fs::read_to_string(tmp.path().join("warden.yml")).unwrap();
    assert!(config.contains("warden.duckdb"));

    // running it again keeps the existing config
    std::fs::write(tmp.path().join("warden.yml"), "migrations_dir: db\n").unwrap();
    assert_success(&dbwarden(tmp.path(), &["init"]));
    assert!(tmp.path().join("db").is_dir());
}

#[test]
fn test_new_numbers_files() {
    let tmp = TempDir::new().unwrap();
    assert_success(&dbwarden(tmp.path(), &["init"]));

    assert_success(&dbwarden(tmp.path(), &["new", "create users"]));
    assert_success(&dbwarden(tmp.path(), &["new", "Add Email"]));
    assert_success(&dbwarden(
        tmp.path(),
        &["new", "user views", "--repeatable", "on-change"],
    ));

    let migrations = tmp.path().join("migrations");
    assert!(migrations.join("V1__create_users.sql").is_file());
    assert!(migrations.join("V2__add_email.sql").is_file());
    assert!(migrations.join("ROC__user_views.sql").is_file());

    let body = std::fs::read_to_string(migrations.join("V1__create_users.sql")).unwrap();
    assert!(body.starts_with("-- upgrade"));
    assert!(body.contains("-- rollback"));

    let dup = dbwarden(tmp.path(), &["new", "again", "--version", "2"]);
    assert_eq!(dup.status.code(), Some(1));
}

// ── migrate / rollback ─────────────────────────────────────────────────

#[test]
fn test_migrate_then_status() {
    let tmp = project();
    let before = status_json(tmp.path());
    assert_eq!(before["pending"].as_array().unwrap().len(), 2);

    assert_success(&dbwarden(tmp.path(), &["migrate"]));

    let after = status_json(tmp.path());
    let applied = after["applied"].as_array().unwrap();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0]["version"], "1");
    assert_eq!(applied[1]["version"], "2");
    assert!(after["pending"].as_array().unwrap().is_empty());

    // second run is a no-op
    assert_success(&dbwarden(tmp.path(), &["migrate"]));
    let history = dbwarden(tmp.path(), &["history", "--output", "yaml"]);
    assert_success(&history);
    let records: serde_yaml::Value = serde_yaml::from_str(&stdout(&history)).unwrap();
    assert_eq!(records.as_sequence().unwrap().len(), 2);
}

#[test]
fn test_table_output() {
    let tmp = project();
    assert_success(&dbwarden(tmp.path(), &["migrate", "--count", "1"]));
    let output = dbwarden(tmp.path(), &["status"]);
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.starts_with("STATE"), "{text}");
    assert!(text.contains("1 applied, 1 pending"), "{text}");
}

#[test]
fn test_rollback_to_version() {
    let tmp = project();
    assert_success(&dbwarden(tmp.path(), &["migrate"]));
    assert_success(&dbwarden(tmp.path(), &["rollback", "--to-version", "1"]));
    let status = status_json(tmp.path());
    assert!(status["applied"].as_array().unwrap().is_empty());
    assert_eq!(status["pending"].as_array().unwrap().len(), 2);

    let missing = dbwarden(tmp.path(), &["rollback", "--to-version", "9"]);
    assert_eq!(missing.status.code(), Some(1));
}

// ── exit codes ─────────────────────────────────────────────────────────

#[test]
fn test_conflicting_bounds_exit_2() {
    let tmp = project();
    let output = dbwarden(tmp.path(), &["migrate", "--count", "1", "--to-version", "2"]);
    assert_eq!(output.status.code(), Some(2));
    // nothing was applied
    assert!(status_json(tmp.path())["applied"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[test]
fn test_zero_count_exit_2() {
    let tmp = project();
    let output = dbwarden(tmp.path(), &["migrate", "--count", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_directory_exit_4() {
    let tmp = TempDir::new().unwrap();
    let output = dbwarden(tmp.path(), &["migrate"]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dbwarden init"), "{stderr}");

    let output = dbwarden(tmp.path(), &["new", "first"]);
    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test]
async fn test_lock_held_exit_3_and_unlock() {
    let tmp = project();
    assert_success(&dbwarden(tmp.path(), &["migrate", "--count", "1"]));

    {
        let db = DuckDbBackend::from_path(&tmp.path().join("warden.duckdb")).unwrap();
        assert!(LockManager::new(&db, "dbwarden_lock").acquire().await.unwrap());
    }

    let output = dbwarden(tmp.path(), &["migrate"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        status_json(tmp.path())["applied"].as_array().unwrap().len(),
        1
    );

    let lock = dbwarden(tmp.path(), &["lock-status", "--output", "json"]);
    assert_success(&lock);
    let state: serde_json::Value = serde_json::from_str(&stdout(&lock)).unwrap();
    assert_eq!(state["locked"], true);

    assert_success(&dbwarden(tmp.path(), &["unlock"]));
    assert_success(&dbwarden(tmp.path(), &["migrate"]));
    assert_eq!(
        status_json(tmp.path())["applied"].as_array().unwrap().len(),
        2
    );
}

#[test]
fn test_verify_reports_edited_file() {
    let tmp = project();
    assert_success(&dbwarden(tmp.path(), &["migrate"]));
    assert_success(&dbwarden(tmp.path(), &["verify"]));

    std::fs::write(
        tmp.path().join("migrations/V1__create_users.sql"),
        "-- upgrade\n\nCREATE TABLE users (id BIGINT, name VARCHAR);\n\n-- rollback\n\nDROP TABLE users;\n",
    )
    .unwrap();
    let output = dbwarden(tmp.path(), &["verify", "--output", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let drift: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(drift[0]["version"], "1");
}

#[test]
fn test_database_override() {
    let tmp = project();
    let other = tmp.path().join("other.duckdb");
    let output = Command::new(dbwarden_bin())
        .args(["migrate", "--project-dir", tmp.path().to_str().unwrap()])
        .env("DBWARDEN_DATABASE", other.to_str().unwrap())
        .env_remove("DBWARDEN_SCHEMA")
        .output()
        .expect("Failed to run dbwarden");
    assert_success(&output);
    assert!(other.is_file());
    // the configured database was left alone
    assert_eq!(
        status_json(tmp.path())["pending"].as_array().unwrap().len(),
        2
    );
}
