use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_count_conflicts_with_to_version() {
    let err = Cli::try_parse_from(["dbwarden", "migrate", "--count", "1", "--to-version", "2"])
        .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "dbwarden",
        "rollback",
        "-n",
        "2",
        "--project-dir",
        "/srv/app",
        "--lock-timeout",
        "5",
    ])
    .unwrap();
    assert_eq!(cli.global.project_dir, "/srv/app");
    assert_eq!(cli.global.lock_timeout, Some(5));
    match cli.command {
        Commands::Rollback(args) => {
            assert_eq!(args.count, Some(2));
            assert!(args.to_version.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_status_output_format() {
    let cli = Cli::try_parse_from(["dbwarden", "status", "-o", "yaml"]).unwrap();
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, OutputFormat::Yaml),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_new_rejects_version_for_repeatable() {
    assert!(Cli::try_parse_from([
        "dbwarden",
        "new",
        "views",
        "--version",
        "3",
        "--repeatable",
        "always"
    ])
    .is_err());
}
