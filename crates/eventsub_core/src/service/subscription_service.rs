//! Subscription use-case service.
//!
//! # Responsibility
//! - Save subscriptions after person validation.
//! - Read subscriptions with their person hydrated.
//! - Drive CSV bulk import against the same store.
//!
//! # Invariants
//! - A rejected save leaves the record transient and the store untouched.

use crate::config::CsvImportConfig;
use crate::import::csv_import::{upload_csv, ImportError, ImportReport};
use crate::model::subscription::{Subscription, SubscriptionId};
use crate::repo::subscription_repo::{
    SqliteSubscriptionRepository, SubscriptionFilter, SubscriptionRepository,
};
use crate::repo::{RepoError, RepoResult};
use log::warn;
use std::path::Path;

/// Use-case service wrapper for subscription records.
pub struct SubscriptionService<R: SubscriptionRepository> {
    repo: R,
}

impl<R: SubscriptionRepository> SubscriptionService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists `subscription`, storing the assigned id on it.
    ///
    /// # Errors
    /// - `RepoError::SubscriptionValidation(PersonRequired)` when no person is set.
    /// - `RepoError::SubscriptionValidation(PersonInvalid)` when the person is
    ///   not persisted, has blank fields or no longer exists.
    pub fn save(&self, subscription: &mut Subscription) -> RepoResult<SubscriptionId> {
        match self.repo.insert_subscription(subscription) {
            Ok(id) => {
                subscription.id = Some(id);
                Ok(id)
            }
            Err(RepoError::SubscriptionValidation(reason)) => {
                warn!("event=subscription_save module=service status=rejected reason={reason:?}");
                Err(RepoError::SubscriptionValidation(reason))
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the first subscription matching `filter`, person hydrated.
    pub fn get(&self, filter: &SubscriptionFilter) -> RepoResult<Option<Subscription>> {
        self.repo.find_subscription(filter)
    }

    /// Lists all subscriptions ordered by id, persons hydrated.
    pub fn list(&self) -> RepoResult<Vec<Subscription>> {
        self.repo.list_subscriptions()
    }
}

impl SubscriptionService<SqliteSubscriptionRepository<'_>> {
    /// Imports a CSV export using the default column mapping.
    pub fn upload_csv(&self, path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
        self.upload_csv_with(path, &CsvImportConfig::default())
    }

    /// Imports a CSV export using a caller-provided column mapping.
    pub fn upload_csv_with(
        &self,
        path: impl AsRef<Path>,
        config: &CsvImportConfig,
    ) -> Result<ImportReport, ImportError> {
        upload_csv(self.repo.connection(), path, config)
    }
}
