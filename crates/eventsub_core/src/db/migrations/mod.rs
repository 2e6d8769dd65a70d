//! Named SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations (`person_table`, `subscription_table`) in
//!   strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic and names unique.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "person_table",
        sql: include_str!("0001_person_table.sql"),
    },
    Migration {
        version: 2,
        name: "subscription_table",
        sql: include_str!("0002_subscription_table.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Returns every registered migration name in apply order.
pub fn migration_names() -> Vec<&'static str> {
    MIGRATIONS.iter().map(|migration| migration.name).collect()
}

/// Returns the names of migrations already applied to `conn`.
pub fn applied_migration_names(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let current_version = current_user_version(conn)?;
    Ok(MIGRATIONS
        .iter()
        .filter(|migration| migration.version <= current_version)
        .map(|migration| migration.name)
        .collect())
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| {
                error!(
                    "event=migration_apply module=db status=error name={} version={} error={}",
                    migration.name, migration.version, source
                );
                DbError::MigrationFailed {
                    migration: migration.name,
                    version: migration.version,
                    source,
                }
            })?;
        info!(
            "event=migration_apply module=db status=ok name={} version={}",
            migration.name, migration.version
        );
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, migration_names, MIGRATIONS};

    #[test]
    fn versions_are_strictly_increasing() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn person_table_runs_before_subscription_table() {
        assert_eq!(migration_names(), vec!["person_table", "subscription_table"]);
    }
}
