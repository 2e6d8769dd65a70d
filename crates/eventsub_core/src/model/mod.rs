//! Plain record types for the subscription domain.
//!
//! # Responsibility
//! - Define the `Person` and `Subscription` records and their validation rules.
//! - Stay free of persistence concerns; repositories own SQL.
//!
//! # Invariants
//! - A record is transient while `id` is `None` and persisted once `id` holds
//!   a positive surrogate key.

pub mod person;
pub mod subscription;
