//! Core use-case services.
//!
//! # Responsibility
//! - Expose save / get / list entry points per record type.
//! - Assign store ids back onto caller-owned records after a save.
//! - Keep callers decoupled from storage details.

pub mod person_service;
pub mod subscription_service;
