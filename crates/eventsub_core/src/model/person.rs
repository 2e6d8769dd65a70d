//! Person record.
//!
//! # Responsibility
//! - Hold attendee identity fields (`fullname`, `email`, `phone`).
//! - Validate field presence before persistence.
//!
//! # Invariants
//! - `id` is assigned by the store on first successful save and never changes.
//! - All identity fields are required; no format rules are enforced.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate key assigned by the `person` table.
pub type PersonId = i64;

/// Attendee identity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// `None` until the record has been saved.
    pub id: Option<PersonId>,
    pub fullname: String,
    pub email: String,
    pub phone: String,
}

/// Field-presence violations for [`Person`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    EmptyFullname,
    EmptyEmail,
    EmptyPhone,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFullname => write!(f, "Person fullname is required."),
            Self::EmptyEmail => write!(f, "Person email is required."),
            Self::EmptyPhone => write!(f, "Person phone is required."),
        }
    }
}

impl Error for PersonValidationError {}

impl Person {
    /// Creates a transient person. Call a repository or service to persist it.
    pub fn new(
        fullname: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            fullname: fullname.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Returns whether this record carries a store-assigned id.
    pub fn is_persisted(&self) -> bool {
        matches!(self.id, Some(id) if id > 0)
    }

    /// Checks that every identity field is non-blank.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.fullname.trim().is_empty() {
            return Err(PersonValidationError::EmptyFullname);
        }
        if self.email.trim().is_empty() {
            return Err(PersonValidationError::EmptyEmail);
        }
        if self.phone.trim().is_empty() {
            return Err(PersonValidationError::EmptyPhone);
        }
        Ok(())
    }
}
