use super::*;
use anyhow::Context;

#[test]
fn test_exit_code_passthrough() {
    let err: anyhow::Error = ExitCode(7).into();
    assert_eq!(exit_code_for(&err), 7);
    assert_eq!(err.to_string(), "");
}

#[test]
fn test_migrate_errors_map_to_codes() {
    let cases = [
        (MigrateError::InvalidArguments("x".to_string()), 2),
        (
            MigrateError::LockHeld {
                acquired_at: "now".to_string(),
            },
            3,
        ),
        (MigrateError::LockTimeout { seconds: 5 }, 3),
        (
            MigrateError::DirectoryNotFound {
                path: "migrations".to_string(),
            },
            4,
        ),
        (
            MigrateError::VersionNotFound {
                version: "9".to_string(),
            },
            1,
        ),
    ];
    for (err, expected) in cases {
        let err = anyhow::Error::new(err);
        assert_eq!(exit_code_for(&err), expected, "{err}");
    }
}

#[test]
fn test_code_found_through_context() {
    let result: Result<(), MigrateError> = Err(MigrateError::LockTimeout { seconds: 1 });
    let err = result.context("Migration failed").unwrap_err();
    assert_eq!(exit_code_for(&err), EXIT_LOCK_UNAVAILABLE);
}

#[test]
fn test_core_directory_error() {
    let err = anyhow::Error::new(CoreError::DirectoryNotFound {
        path: "db/migrations".to_string(),
    });
    assert_eq!(exit_code_for(&err), EXIT_MISSING_DIR);
    assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), EXIT_FAILURE);
}
