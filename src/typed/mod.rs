//! Pooled Postgres handles with compile-time transaction state.
//!
//! A [`PgConnection<Idle>`] auto-commits every statement. [`PgConnection::begin`]
//! turns it into a [`PgConnection<InTx>`], which must be finished with
//! `commit` or `rollback`; dropping it unfinished rolls the transaction back.
//! [`with_transaction`] and [`with_rollback`] wrap that lifecycle in a scope.

mod core;
mod scope;
mod traits;
mod tx;

pub use self::core::{Db, Idle, InTx, PgConnection, PgManager};
pub use scope::{with_rollback, with_transaction};
pub use traits::Queryable;
