//! SQLite-based store using `SeaORM`.
//!
//! A single `SqliteStore` implements `DomainRepository`,
//! `DnsAccountRepository` and `ServerRepository` against one `SQLite`
//! database. Credentials arrive already sealed by the core key ring and are
//! stored as opaque text.

mod account_repo;
mod domain_repo;
pub(crate) mod entity;
mod migration;
mod server_repo;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use doorway_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

/// SQLite-based store for the doorway daemon.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and bring the schema up to date.
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self { db };

        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        Ok(store)
    }
}

/// RFC 3339 in UTC with fixed microsecond precision, so text order is time order.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

pub(crate) fn storage_error(action: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::StorageError(format!("Failed to {action}: {err}"))
}
