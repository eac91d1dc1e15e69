#![allow(dead_code)]

use std::error::Error;

use bookstore_db::prelude::*;
use bookstore_db::test_utils::{migrated_db, setup_postgres_embedded, stop_postgres_embedded};

const TEST_DB: &str = "bookstore_test";

/// Start a disposable server, migrate a fresh database and run `scenario`
/// against it. The server is stopped whether or not the scenario succeeds.
pub fn with_store<F>(scenario: F) -> Result<(), Box<dyn Error>>
where
    F: AsyncFnOnce(Db) -> Result<(), BookstoreDbError>,
{
    run(true, scenario)
}

/// Same as [`with_store`] but the database has no schema yet.
pub fn with_empty_store<F>(scenario: F) -> Result<(), Box<dyn Error>>
where
    F: AsyncFnOnce(Db) -> Result<(), BookstoreDbError>,
{
    run(false, scenario)
}

fn run<F>(migrate: bool, scenario: F) -> Result<(), Box<dyn Error>>
where
    F: AsyncFnOnce(Db) -> Result<(), BookstoreDbError>,
{
    let pg = setup_postgres_embedded(TEST_DB)?;
    let config = pg.config.clone();

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async move {
        let db = if migrate {
            migrated_db(config).await?
        } else {
            Db::connect(config).await?
        };
        scenario(db).await
    });
    // Close pooled connections before the server goes away.
    drop(rt);

    stop_postgres_embedded(pg);
    outcome?;
    Ok(())
}

pub fn author(name: &str, bio: Option<&str>) -> CreateAuthorParams {
    CreateAuthorParams {
        id: AuthorId::new(),
        name: name.to_string(),
        bio: bio.map(str::to_string),
    }
}

pub fn publisher(name: &str) -> CreatePublisherParams {
    CreatePublisherParams {
        id: PublisherId::new(),
        name: name.to_string(),
    }
}

pub fn book(title: &str, publisher_id: PublisherId) -> CreateBookParams {
    CreateBookParams {
        id: BookId::new(),
        title: title.to_string(),
        publisher_id,
    }
}

pub fn assert_constraint(
    result: Result<(), BookstoreDbError>,
    expected: ConstraintKind,
) {
    match result {
        Err(err) => assert_eq!(
            err.constraint_kind(),
            Some(expected),
            "expected {expected} violation, got {err:?}"
        ),
        Ok(()) => panic!("expected {expected} violation, write succeeded"),
    }
}
