//! dw-core - Core library for dbwarden
//!
//! This crate holds the database-independent half of the migration engine:
//! configuration parsing, version ordering, statement extraction from
//! migration files, checksums, and discovery of migration files on disk.

pub mod checksum;
pub mod config;
pub mod error;
pub mod migration;
pub mod parser;
pub mod record;
pub mod resolver;
pub mod sql_utils;
pub mod version;

pub use checksum::{compute_checksum, statements_checksum};
pub use config::{Config, DatabaseConfig, DbType};
pub use error::{CoreError, CoreResult};
pub use migration::{MigrationFile, MigrationKind};
pub use parser::{extract_rollback, extract_upgrade, parse_sections, MigrationSql};
pub use record::MigrationRecord;
pub use resolver::{discover, list_migrations, list_repeatables, RangeSelection};
pub use version::{compare_versions, Version};
