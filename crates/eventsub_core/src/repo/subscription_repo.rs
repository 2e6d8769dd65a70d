//! Subscription repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Validate and insert subscriptions referencing a persisted person.
//! - Hydrate the owning [`Person`] on every read path.
//!
//! # Invariants
//! - Validation happens entirely before the single `INSERT`, so a rejected
//!   save leaves no row behind.
//! - A person id that is not present in `person` counts as an invalid person.
//! - Results are ordered by ascending subscription id.

use crate::model::person::PersonId;
use crate::model::subscription::{Subscription, SubscriptionId, SubscriptionValidationError};
use crate::repo::person_repo::parse_person_row;
use crate::repo::schema::{ensure_connection_ready, PERSON_TABLE, SUBSCRIPTION_TABLE};
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const SUBSCRIPTION_SELECT_SQL: &str = "SELECT
    s.id AS subscription_id,
    s.qr AS qr,
    p.id AS person_id,
    p.fullname AS fullname,
    p.email AS email,
    p.phone AS phone
FROM subscription s
JOIN person p ON p.id = s.person_id";

/// Column filter for single-subscription lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub id: Option<SubscriptionId>,
    pub person_id: Option<PersonId>,
    pub qr: Option<String>,
}

impl SubscriptionFilter {
    pub fn by_id(id: SubscriptionId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_person_id(person_id: PersonId) -> Self {
        Self {
            person_id: Some(person_id),
            ..Self::default()
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1 = 1");
        let mut bind_values = Vec::new();

        if let Some(id) = self.id {
            sql.push_str(" AND s.id = ?");
            bind_values.push(Value::Integer(id));
        }
        if let Some(person_id) = self.person_id {
            sql.push_str(" AND s.person_id = ?");
            bind_values.push(Value::Integer(person_id));
        }
        if let Some(qr) = &self.qr {
            sql.push_str(" AND s.qr = ?");
            bind_values.push(Value::Text(qr.clone()));
        }

        (sql, bind_values)
    }
}

/// Repository interface for subscription persistence.
pub trait SubscriptionRepository {
    /// Validates and inserts a transient subscription, returning its id.
    fn insert_subscription(&self, subscription: &Subscription) -> RepoResult<SubscriptionId>;
    /// Returns the first subscription matching `filter` with its person hydrated.
    fn find_subscription(&self, filter: &SubscriptionFilter) -> RepoResult<Option<Subscription>>;
    /// Returns every subscription with its person hydrated.
    fn list_subscriptions(&self) -> RepoResult<Vec<Subscription>>;
}

/// SQLite-backed subscription repository.
pub struct SqliteSubscriptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubscriptionRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PERSON_TABLE, SUBSCRIPTION_TABLE])?;
        Ok(Self { conn })
    }

    /// Returns the connection this repository reads and writes through.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn person_exists(&self, person_id: PersonId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM person WHERE id = ?1);",
            [person_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl SubscriptionRepository for SqliteSubscriptionRepository<'_> {
    fn insert_subscription(&self, subscription: &Subscription) -> RepoResult<SubscriptionId> {
        let person = subscription.validate()?;
        if let Some(id) = subscription.id.filter(|id| *id > 0) {
            return Err(RepoError::AlreadyPersisted(id));
        }

        let person_id = person
            .id
            .ok_or(SubscriptionValidationError::PersonInvalid)?;
        if !self.person_exists(person_id)? {
            return Err(SubscriptionValidationError::PersonInvalid.into());
        }

        self.conn.execute(
            "INSERT INTO subscription (person_id, qr) VALUES (?1, ?2);",
            params![person_id, subscription.qr.as_str()],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(
            "event=subscription_insert module=repo status=ok subscription_id={id} person_id={person_id}"
        );
        Ok(id)
    }

    fn find_subscription(&self, filter: &SubscriptionFilter) -> RepoResult<Option<Subscription>> {
        let (where_sql, bind_values) = filter.where_clause();
        let mut stmt = self.conn.prepare(&format!(
            "{SUBSCRIPTION_SELECT_SQL}{where_sql} ORDER BY s.id ASC LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subscription_row(row)?));
        }

        Ok(None)
    }

    fn list_subscriptions(&self) -> RepoResult<Vec<Subscription>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBSCRIPTION_SELECT_SQL} ORDER BY s.id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut subscriptions = Vec::new();

        while let Some(row) = rows.next()? {
            subscriptions.push(parse_subscription_row(row)?);
        }

        Ok(subscriptions)
    }
}

fn parse_subscription_row(row: &Row<'_>) -> RepoResult<Subscription> {
    let id: SubscriptionId = row.get("subscription_id")?;
    if id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid subscription id `{id}` in subscription.id"
        )));
    }

    Ok(Subscription {
        id: Some(id),
        person: Some(parse_person_row(row, "person_id")?),
        qr: row.get("qr")?,
    })
}
