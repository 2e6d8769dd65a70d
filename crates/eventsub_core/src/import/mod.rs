//! Bulk import paths.
//!
//! # Responsibility
//! - Turn external attendee exports (CSV) into persons and subscriptions.
//!
//! # Invariants
//! - Imports run in one transaction; storage errors leave no partial writes.
//! - Row-level problems are reported, never raised.

pub mod csv_import;
