//! CSV subscription import.
//!
//! # Responsibility
//! - Map CSV columns to person identity fields and an optional QR token.
//! - Create or reuse persons, then create one subscription per person.
//!
//! # Invariants
//! - A header row is required and must contain the fullname, email and
//!   phone columns configured in [`CsvImportConfig`].
//! - Row numbers in errors are 1-based file line numbers (header is row 1).
//! - A person that already holds a subscription is skipped, so re-importing
//!   the same file creates nothing new.

use crate::config::{normalize_header, CsvImportConfig};
use crate::model::person::Person;
use crate::model::subscription::Subscription;
use crate::repo::person_repo::{PersonFilter, PersonRepository, SqlitePersonRepository};
use crate::repo::subscription_repo::{
    SqliteSubscriptionRepository, SubscriptionFilter, SubscriptionRepository,
};
use crate::repo::RepoError;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Counters and row diagnostics for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub people_created: usize,
    pub people_reused: usize,
    pub subscriptions_created: usize,
    /// Rows whose person already had a subscription.
    pub skipped_duplicates: usize,
    /// Rows rejected for missing or malformed fields.
    pub skipped_invalid: usize,
    /// One `Row N: ...` message per rejected row.
    pub errors: Vec<String>,
}

/// Fatal import failures. Nothing is written when one is returned.
#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// Configured column is absent from the header row.
    MissingColumn(String),
    /// Configured delimiter is not a single ASCII character.
    InvalidDelimiter(char),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read csv: {err}"),
            Self::Csv(err) => write!(f, "invalid csv: {err}"),
            Self::MissingColumn(column) => write!(f, "csv header is missing column `{column}`"),
            Self::InvalidDelimiter(delimiter) => {
                write!(f, "csv delimiter must be ASCII, got `{delimiter}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::MissingColumn(_) | Self::InvalidDelimiter(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Imports subscriptions from the CSV file at `path`.
pub fn upload_csv(
    conn: &Connection,
    path: impl AsRef<Path>,
    config: &CsvImportConfig,
) -> Result<ImportReport, ImportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        error!(
            "event=csv_import module=import status=error error_code=csv_open_failed path={} error={}",
            path.display(),
            err
        );
        err
    })?;
    import_subscriptions(conn, file, config)
}

/// Imports subscriptions from any CSV byte source.
pub fn import_subscriptions<R: Read>(
    conn: &Connection,
    reader: R,
    config: &CsvImportConfig,
) -> Result<ImportReport, ImportError> {
    let started_at = Instant::now();
    let delimiter = config
        .delimiter_byte()
        .ok_or(ImportError::InvalidDelimiter(config.delimiter))?;
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::resolve(csv_reader.headers()?, config)?;

    let tx = conn.unchecked_transaction()?;
    let people = SqlitePersonRepository::try_new(&tx)?;
    let subscriptions = SqliteSubscriptionRepository::try_new(&tx)?;
    let mut report = ImportReport::default();

    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(0, |position| position.line());
                report.skipped_invalid += 1;
                report.errors.push(format!("Row {line}: {err}"));
                continue;
            }
        };
        let line = record.position().map_or(0, |position| position.line());

        let row = match columns.read_row(&record, config) {
            RowOutcome::Blank => continue,
            RowOutcome::Missing(column) => {
                report.skipped_invalid += 1;
                report.errors.push(format!("Row {line}: {column} is required"));
                continue;
            }
            RowOutcome::Row(row) => row,
        };

        let existing = if config.reuse_existing_people {
            people.find_person(&PersonFilter::by_identity(
                row.person.fullname.as_str(),
                row.person.email.as_str(),
                row.person.phone.as_str(),
            ))?
        } else {
            None
        };
        let person = match existing {
            Some(person) => {
                report.people_reused += 1;
                person
            }
            None => {
                let mut person = row.person;
                person.id = Some(people.insert_person(&person)?);
                report.people_created += 1;
                person
            }
        };

        if let Some(person_id) = person.id {
            if subscriptions
                .find_subscription(&SubscriptionFilter::by_person_id(person_id))?
                .is_some()
            {
                report.skipped_duplicates += 1;
                continue;
            }
        }

        let qr = row
            .qr
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        subscriptions.insert_subscription(&Subscription::new(person, qr))?;
        report.subscriptions_created += 1;
    }

    tx.commit()?;

    if !report.errors.is_empty() {
        warn!(
            "event=csv_import module=import status=partial skipped_invalid={}",
            report.skipped_invalid
        );
    }
    info!(
        "event=csv_import module=import status=ok duration_ms={} people_created={} people_reused={} subscriptions_created={} skipped_duplicates={} skipped_invalid={}",
        started_at.elapsed().as_millis(),
        report.people_created,
        report.people_reused,
        report.subscriptions_created,
        report.skipped_duplicates,
        report.skipped_invalid
    );

    Ok(report)
}

struct ImportRow {
    person: Person,
    qr: Option<String>,
}

enum RowOutcome<'cfg> {
    Blank,
    Missing(&'cfg str),
    Row(ImportRow),
}

/// Header positions of the configured columns.
struct ColumnIndex {
    fullname: usize,
    email: usize,
    phone: usize,
    qr: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, config: &CsvImportConfig) -> Result<Self, ImportError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let position = |column: &str| {
            let wanted = normalize_header(column);
            normalized.iter().position(|header| *header == wanted)
        };
        let required = |column: &str| {
            position(column).ok_or_else(|| ImportError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            fullname: required(&config.fullname_column)?,
            email: required(&config.email_column)?,
            phone: required(&config.phone_column)?,
            qr: config.qr_column.as_deref().and_then(&position),
        })
    }

    fn read_row<'cfg>(
        &self,
        record: &StringRecord,
        config: &'cfg CsvImportConfig,
    ) -> RowOutcome<'cfg> {
        if record.iter().all(str::is_empty) {
            return RowOutcome::Blank;
        }

        let field = |index: usize| record.get(index).unwrap_or_default().to_string();
        let person = Person::new(field(self.fullname), field(self.email), field(self.phone));
        for (value, column) in [
            (&person.fullname, &config.fullname_column),
            (&person.email, &config.email_column),
            (&person.phone, &config.phone_column),
        ] {
            if value.is_empty() {
                return RowOutcome::Missing(column.as_str());
            }
        }

        let qr = self.qr.map(field).filter(|qr| !qr.is_empty());
        RowOutcome::Row(ImportRow { person, qr })
    }
}
