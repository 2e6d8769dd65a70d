//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the subscription store.
//! - Apply the named schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories refuse connections whose migrations have not been applied.
//! - A failed migration names itself and leaves the schema version unchanged.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening the store or bringing its schema up to date.
#[derive(Debug)]
pub enum DbError {
    /// Connection, pragma or bookkeeping query failed.
    Sqlite(rusqlite::Error),
    /// One named migration (`person_table`, `subscription_table`) failed to apply.
    MigrationFailed {
        migration: &'static str,
        version: u32,
        source: rusqlite::Error,
    },
    /// The store was migrated by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Returns the migration name when the failure happened inside one.
    pub fn migration(&self) -> Option<&'static str> {
        match self {
            Self::MigrationFailed { migration, .. } => Some(migration),
            Self::Sqlite(_) | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MigrationFailed {
                migration,
                version,
                source,
            } => write!(f, "migration `{migration}` (v{version}) failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than this build supports ({latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
