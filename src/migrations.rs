//! Embedded schema migrations for the bookstore tables.
//!
//! Scripts live in `migrations/` and are compiled in. Applied versions are
//! recorded in `schema_migrations`; a run applies every script newer than the
//! recorded maximum inside one transaction, so a failure leaves the schema
//! untouched. Concurrent runners serialize on a transaction-scoped advisory
//! lock.

use std::time::Instant;

use crate::error::BookstoreDbError;
use crate::typed::{Idle, PgConnection};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_author",
        sql: include_str!("../migrations/0001_create_author.sql"),
    },
    Migration {
        version: 2,
        name: "create_publisher",
        sql: include_str!("../migrations/0002_create_publisher.sql"),
    },
    Migration {
        version: 3,
        name: "create_book",
        sql: include_str!("../migrations/0003_create_book.sql"),
    },
    Migration {
        version: 4,
        name: "create_author_book",
        sql: include_str!("../migrations/0004_create_author_book.sql"),
    },
];

/// Advisory lock key held while migrating ("bookstor" in ASCII).
const MIGRATION_LOCK_KEY: i64 = 0x626f_6f6b_7374_6f72;

const CREATE_LEDGER: &str = "\
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CURRENT_VERSION: &str = "SELECT COALESCE(MAX(version), 0) FROM schema_migrations";

/// Returns the latest migration version known by this binary.
#[must_use]
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Highest version recorded in the database, `0` for an unmigrated one.
///
/// # Errors
/// Returns `BookstoreDbError` if the ledger cannot be read.
pub async fn current_version(conn: &PgConnection<Idle>) -> Result<i32, BookstoreDbError> {
    let client = conn.conn_ref();
    let ledger_exists: bool = client
        .query_one("SELECT to_regclass('schema_migrations') IS NOT NULL", &[])
        .await?
        .try_get(0)?;
    if !ledger_exists {
        return Ok(0);
    }
    Ok(client.query_one(CURRENT_VERSION, &[]).await?.try_get(0)?)
}

/// Applies all pending migrations and returns how many ran.
///
/// # Errors
/// Returns `BookstoreDbError::UnsupportedSchemaVersion` if the database is newer
/// than this binary, or the driver error of the failing script.
pub async fn apply_migrations(conn: &mut PgConnection<Idle>) -> Result<usize, BookstoreDbError> {
    let started_at = Instant::now();
    let latest = latest_version();

    let tx = conn.conn_mut().transaction().await?;
    tx.execute("SELECT pg_advisory_xact_lock($1)", &[&MIGRATION_LOCK_KEY])
        .await?;
    tx.batch_execute(CREATE_LEDGER).await?;
    let current: i32 = tx.query_one(CURRENT_VERSION, &[]).await?.try_get(0)?;

    if current > latest {
        return Err(BookstoreDbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "applying migration"
        );
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES ($1, $2)",
            &[&migration.version, &migration.name],
        )
        .await?;
        applied += 1;
    }
    tx.commit().await?;

    tracing::info!(
        from = current,
        to = latest,
        applied,
        duration_ms = started_at.elapsed().as_millis(),
        "migrations complete"
    );
    Ok(applied)
}
