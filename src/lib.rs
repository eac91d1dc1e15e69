//! Typed async query layer for the author / publisher / book schema on Postgres.
//!
//! ```no_run
//! use bookstore_db::prelude::*;
//!
//! # async fn demo(config: DbConfig) -> Result<(), BookstoreDbError> {
//! let db = Db::connect(config).await?;
//! let conn = db.checkout().await?;
//! let author = with_transaction(conn, async |tx| {
//!     let q = tx.queries();
//!     let id = AuthorId::new();
//!     q.create_author(&CreateAuthorParams {
//!         id,
//!         name: "Brian Kernighan".into(),
//!         bio: None,
//!     })
//!     .await?;
//!     q.get_author(id).await
//! })
//! .await?;
//! assert_eq!(author.name, "Brian Kernighan");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod prelude;
pub mod queries;
pub mod typed;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::DbConfig;
pub use error::{BookstoreDbError, ConstraintKind};
pub use queries::Queries;
pub use typed::{Db, PgConnection, Queryable, with_rollback, with_transaction};
