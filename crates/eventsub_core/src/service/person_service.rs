//! Person use-case service.
//!
//! # Invariants
//! - `save` transitions a record from transient to persisted exactly once.
//! - Service APIs never bypass repository validation.

use crate::model::person::{Person, PersonId};
use crate::repo::person_repo::{PersonFilter, PersonRepository};
use crate::repo::RepoResult;

/// Use-case service wrapper for person records.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists `person` and stores the assigned id on it.
    ///
    /// Fails with `RepoError::AlreadyPersisted` when `person.id` holds a positive id.
    /// `Some(0)` counts as transient.
    pub fn save(&self, person: &mut Person) -> RepoResult<PersonId> {
        let id = self.repo.insert_person(person)?;
        person.id = Some(id);
        Ok(id)
    }

    /// Returns the first person matching every field set in `filter`.
    pub fn get(&self, filter: &PersonFilter) -> RepoResult<Option<Person>> {
        self.repo.find_person(filter)
    }

    /// Lists all persons ordered by id.
    pub fn list(&self) -> RepoResult<Vec<Person>> {
        self.repo.list_people()
    }
}
