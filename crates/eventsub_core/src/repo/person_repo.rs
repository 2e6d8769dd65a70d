//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Insert persons and assign surrogate ids.
//! - Look up one person by any combination of columns.
//!
//! # Invariants
//! - Write paths call `Person::validate()` before SQL mutations.
//! - Filter fields combine with AND; an empty filter matches every row.
//! - Results are ordered by ascending id.

use crate::model::person::{Person, PersonId};
use crate::repo::schema::{ensure_connection_ready, PERSON_TABLE};
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT id, fullname, email, phone FROM person";

/// Column filter for single-person lookups.
///
/// Every `Some` field must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub id: Option<PersonId>,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PersonFilter {
    /// Matches the row with this surrogate id.
    pub fn by_id(id: PersonId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Matches on the full identity triple, the way a caller re-fetches a
    /// person it has just saved.
    pub fn by_identity(
        fullname: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            fullname: Some(fullname.into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1 = 1");
        let mut bind_values = Vec::new();

        if let Some(id) = self.id {
            sql.push_str(" AND id = ?");
            bind_values.push(Value::Integer(id));
        }
        for (column, value) in [
            ("fullname", &self.fullname),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if let Some(value) = value {
                sql.push_str(&format!(" AND {column} = ?"));
                bind_values.push(Value::Text(value.clone()));
            }
        }

        (sql, bind_values)
    }
}

/// Repository interface for person persistence.
pub trait PersonRepository {
    /// Inserts a transient person and returns the assigned id.
    fn insert_person(&self, person: &Person) -> RepoResult<PersonId>;
    /// Returns the first person matching `filter`, if any.
    fn find_person(&self, filter: &PersonFilter) -> RepoResult<Option<Person>>;
    /// Returns every person ordered by id.
    fn list_people(&self) -> RepoResult<Vec<Person>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PERSON_TABLE])?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn insert_person(&self, person: &Person) -> RepoResult<PersonId> {
        if let Some(id) = person.id.filter(|_| person.is_persisted()) {
            return Err(RepoError::AlreadyPersisted(id));
        }
        person.validate()?;

        self.conn.execute(
            "INSERT INTO person (fullname, email, phone) VALUES (?1, ?2, ?3);",
            params![
                person.fullname.as_str(),
                person.email.as_str(),
                person.phone.as_str()
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("event=person_insert module=repo status=ok person_id={id}");
        Ok(id)
    }

    fn find_person(&self, filter: &PersonFilter) -> RepoResult<Option<Person>> {
        let (where_sql, bind_values) = filter.where_clause();
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL}{where_sql} ORDER BY id ASC LIMIT 1;"))?;

        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row, "id")?));
        }

        Ok(None)
    }

    fn list_people(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();

        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row, "id")?);
        }

        Ok(people)
    }
}

/// Builds a [`Person`] from a row exposing `fullname`, `email`, `phone` and
/// the person key under `id_column`.
pub(crate) fn parse_person_row(row: &Row<'_>, id_column: &str) -> RepoResult<Person> {
    let id: PersonId = row.get(id_column)?;
    let person = Person {
        id: Some(id),
        fullname: row.get("fullname")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
    };

    if !person.is_persisted() {
        return Err(RepoError::InvalidData(format!(
            "invalid person id `{id}` in person.id"
        )));
    }
    person
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("person {id}: {err}")))?;

    Ok(person)
}
