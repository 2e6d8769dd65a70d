//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define insert / find-one / find-all contracts per record type.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - Lookup misses are `Ok(None)`, never errors.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod person_repo;
mod schema;
pub mod subscription_repo;

use crate::db::DbError;
use crate::model::person::PersonValidationError;
use crate::model::subscription::SubscriptionValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error shared by the person and subscription repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Person record failed field validation.
    PersonValidation(PersonValidationError),
    /// Subscription record failed save-time validation.
    SubscriptionValidation(SubscriptionValidationError),
    /// Record already carries a positive store-assigned id.
    AlreadyPersisted(i64),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonValidation(err) => write!(f, "{err}"),
            Self::SubscriptionValidation(err) => write!(f, "{err}"),
            Self::AlreadyPersisted(id) => write!(f, "record already persisted with id {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersonValidation(err) => Some(err),
            Self::SubscriptionValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::AlreadyPersisted(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::PersonValidation(value)
    }
}

impl From<SubscriptionValidationError> for RepoError {
    fn from(value: SubscriptionValidationError) -> Self {
        Self::SubscriptionValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
