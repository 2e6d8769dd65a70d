//! Subscription record.
//!
//! # Responsibility
//! - Link one persisted [`Person`] to an event QR token.
//! - Own the ordered validation rules applied before insert.
//!
//! # Invariants
//! - `person` is held by value; read paths hydrate it from the `person` table.
//! - Validation order: person presence, person validity, then QR token.

use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate key assigned by the `subscription` table.
pub type SubscriptionId = i64;

/// Event subscription owned by exactly one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// `None` until the record has been saved.
    pub id: Option<SubscriptionId>,
    /// Subscriber. Must be a persisted person when saving.
    pub person: Option<Person>,
    /// Opaque token rendered as the attendee QR code.
    pub qr: String,
}

/// Reasons a subscription cannot be saved.
///
/// `Display` yields the exact messages callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionValidationError {
    PersonRequired,
    PersonInvalid,
    QrRequired,
}

impl Display for SubscriptionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonRequired => write!(f, "Person is required."),
            Self::PersonInvalid => write!(f, "Person is invalid."),
            Self::QrRequired => write!(f, "QR code is required."),
        }
    }
}

impl Error for SubscriptionValidationError {}

impl Subscription {
    /// Creates a transient subscription for `person`.
    pub fn new(person: Person, qr: impl Into<String>) -> Self {
        Self {
            id: None,
            person: Some(person),
            qr: qr.into(),
        }
    }

    /// Returns the referenced person id, if the person is persisted.
    pub fn person_id(&self) -> Option<PersonId> {
        self.person
            .as_ref()
            .filter(|person| person.is_persisted())
            .and_then(|person| person.id)
    }

    /// Applies the save-time rules and returns the validated subscriber.
    ///
    /// This only checks the in-memory record; repositories additionally
    /// verify the person row still exists.
    pub fn validate(&self) -> Result<&Person, SubscriptionValidationError> {
        let person = self
            .person
            .as_ref()
            .ok_or(SubscriptionValidationError::PersonRequired)?;
        if !person.is_persisted() || person.validate().is_err() {
            return Err(SubscriptionValidationError::PersonInvalid);
        }
        if self.qr.trim().is_empty() {
            return Err(SubscriptionValidationError::QrRequired);
        }
        Ok(person)
    }
}

#[cfg(test)]
mod tests {
    use super::{Subscription, SubscriptionValidationError};
    use crate::model::person::Person;

    fn persisted_person() -> Person {
        let mut person = Person::new("test1", "test@test.com1", "1111111111");
        person.id = Some(1);
        person
    }

    #[test]
    fn messages_match_caller_contract() {
        assert_eq!(
            SubscriptionValidationError::PersonRequired.to_string(),
            "Person is required."
        );
        assert_eq!(
            SubscriptionValidationError::PersonInvalid.to_string(),
            "Person is invalid."
        );
    }

    #[test]
    fn missing_person_is_reported_before_anything_else() {
        let subscription = Subscription {
            id: None,
            person: None,
            qr: String::new(),
        };
        assert_eq!(
            subscription.validate().unwrap_err(),
            SubscriptionValidationError::PersonRequired
        );
    }

    #[test]
    fn unsaved_or_blank_person_is_invalid() {
        let unsaved = Subscription::new(Person::default(), "asdf");
        assert_eq!(
            unsaved.validate().unwrap_err(),
            SubscriptionValidationError::PersonInvalid
        );

        let mut blank = Person::default();
        blank.id = Some(4);
        let blank = Subscription::new(blank, "asdf");
        assert_eq!(
            blank.validate().unwrap_err(),
            SubscriptionValidationError::PersonInvalid
        );
    }

    #[test]
    fn blank_qr_is_checked_after_person() {
        let subscription = Subscription::new(persisted_person(), " ");
        assert_eq!(
            subscription.validate().unwrap_err(),
            SubscriptionValidationError::QrRequired
        );
    }

    #[test]
    fn valid_subscription_exposes_person_id() {
        let subscription = Subscription::new(persisted_person(), "asdf");
        assert_eq!(subscription.validate().unwrap().fullname, "test1");
        assert_eq!(subscription.person_id(), Some(1));
    }
}
