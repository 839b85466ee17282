//! SQLite-based unified store using `SeaORM`.
//!
//! A single `SqliteStore` implements every repository trait of the engine
//! (`DomainRepository`, `PendingDomainRepository`, `DnsRecordRepository`,
//! `ScanRepository`, `QuotaRepository`) against one `SQLite` database.
//! Timestamps are stored as RFC 3339 strings and enums as their serde names.

mod codec;
mod dns_record_repo;
mod domain_repo;
pub(crate) mod entity;
mod migration;
mod pending_domain_repo;
mod quota_repo;
mod scan_repo;

use std::path::Path;

use domain_warden_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

/// SQLite-backed storage for the whole engine.
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

        log::info!("[sqlite] Opened {}", db_path.display());
        Ok(store)
    }
}
