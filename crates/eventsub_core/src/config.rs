//! Runtime configuration for the core crate.
//!
//! # Responsibility
//! - Describe where the store lives and how logging is set up.
//! - Describe the CSV import contract (column mapping and duplicate policy).
//!
//! # Invariants
//! - Every field has a default, so partial documents deserialize.
//! - CSV header names are compared after `normalize_header`.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid header regex"));

/// Column mapping and policy for subscription CSV imports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsvImportConfig {
    pub fullname_column: String,
    pub email_column: String,
    pub phone_column: String,
    /// Optional column; rows without a token get a generated one.
    pub qr_column: Option<String>,
    /// Single ASCII field separator.
    #[serde(deserialize_with = "deserialize_ascii_delimiter")]
    pub delimiter: char,
    /// Link rows to an existing person with the same fullname, email and phone
    /// instead of inserting a new one.
    pub reuse_existing_people: bool,
}

impl Default for CsvImportConfig {
    fn default() -> Self {
        Self {
            fullname_column: "fullname".to_string(),
            email_column: "email".to_string(),
            phone_column: "phone".to_string(),
            qr_column: Some("qr".to_string()),
            delimiter: ',',
            reuse_existing_people: true,
        }
    }
}

impl CsvImportConfig {
    /// Returns the delimiter as the single byte the CSV reader expects,
    /// or `None` when it is not ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }
}

/// Top-level settings used to bootstrap the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file. `None` opens an in-memory store.
    pub db_path: Option<PathBuf>,
    /// Falls back to [`default_log_level`] when unset.
    pub log_level: Option<String>,
    /// Absolute log directory. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub csv_import: CsvImportConfig,
}

impl CoreConfig {
    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(());
        };
        let log_dir = log_dir.to_str().ok_or_else(|| {
            LoggingError::InvalidLogDir(format!(
                "log_dir must be valid UTF-8, got `{}`",
                log_dir.display()
            ))
        })?;
        init_logging(
            self.log_level.as_deref().unwrap_or(default_log_level()),
            log_dir,
        )
    }

    /// Opens the configured store with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

fn deserialize_ascii_delimiter<'de, D>(deserializer: D) -> Result<char, D::Error>
where
    D: Deserializer<'de>,
{
    let delimiter = char::deserialize(deserializer)?;
    if !delimiter.is_ascii() {
        return Err(serde::de::Error::custom(format!(
            "csv delimiter must be a single ASCII character, got `{delimiter}`"
        )));
    }
    Ok(delimiter)
}

/// Lowercases a header and collapses non-alphanumeric runs into `_`.
///
/// `"Full Name "` and `"full_name"` both become `full_name`.
pub fn normalize_header(value: &str) -> String {
    let lowered = value.trim().to_ascii_lowercase();
    NON_ALNUM_RE
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}
