//! Record layer for a small event-subscription application.
//!
//! Persons and their event subscriptions are stored in SQLite behind
//! repository traits; services own the save/get/list use-cases and the CSV
//! bulk import.

pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CoreConfig, CsvImportConfig};
pub use import::csv_import::{import_subscriptions, upload_csv, ImportError, ImportReport};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::person::{Person, PersonId, PersonValidationError};
pub use model::subscription::{Subscription, SubscriptionId, SubscriptionValidationError};
pub use repo::person_repo::{PersonFilter, PersonRepository, SqlitePersonRepository};
pub use repo::subscription_repo::{
    SqliteSubscriptionRepository, SubscriptionFilter, SubscriptionRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::person_service::PersonService;
pub use service::subscription_service::SubscriptionService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
