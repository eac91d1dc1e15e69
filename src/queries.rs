//! One async method per statement against the bookstore schema.
//!
//! [`Queries`] borrows whatever client it was built from (an auto-commit
//! connection or an open transaction; see [`crate::typed::Queryable`]). Every
//! method issues exactly one parameterized statement and decodes the rows it
//! returns. Nothing is cached, retried or batched.
//!
//! Each call can be interrupted by a [`CancellationToken`] or a deadline. An
//! interruption that lands while the statement is in flight drops the pending
//! request and asks the server to cancel it, so a long-running statement does
//! not keep holding locks.

mod author;
mod author_book;
mod book;
mod publisher;

use std::fmt::Display;
use std::future::{Future, pending};
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tokio_util::sync::CancellationToken;

use crate::error::BookstoreDbError;
use crate::models::{FromPgRow, decode_all};

type Params<'p> = &'p [&'p (dyn ToSql + Sync)];

/// Query layer bound to one client.
#[derive(Clone)]
pub struct Queries<'c> {
    client: &'c Client,
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl std::fmt::Debug for Queries<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queries")
            .field("cancel", &self.cancel)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

impl From<Interrupt> for BookstoreDbError {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Cancelled => BookstoreDbError::Cancelled,
            Interrupt::DeadlineExceeded => BookstoreDbError::DeadlineExceeded,
        }
    }
}

impl<'c> Queries<'c> {
    #[must_use]
    pub fn new(client: &'c Client) -> Self {
        Self {
            client,
            cancel: None,
            deadline: None,
        }
    }

    /// Abort calls when `token` is cancelled.
    ///
    /// The server-side cancel request targets the connection's backend, not
    /// one request. Any other statement pipelined on the same client at that
    /// moment (from a clone of this `Queries`, say) is cancelled too. Give
    /// independently cancellable work its own connection.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Abort calls still running at `deadline`.
    ///
    /// Expiry sends the same backend-wide cancel request as [`Self::with_cancel`].
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now. The clock starts here, not per call.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    fn pending_interrupt(&self) -> Option<Interrupt> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(Interrupt::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Some(Interrupt::DeadlineExceeded);
        }
        None
    }

    /// Drive one driver future under the cancellation token and deadline.
    async fn guard<T, F>(&self, op: &'static str, statement: F) -> Result<T, BookstoreDbError>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>>,
    {
        if let Some(interrupt) = self.pending_interrupt() {
            tracing::debug!(op, "statement not sent; already interrupted");
            return Err(interrupt.into());
        }

        let started = std::time::Instant::now();
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            res = statement => Ok(res),
            () = cancelled => Err(Interrupt::Cancelled),
            () = expired => Err(Interrupt::DeadlineExceeded),
        };

        match outcome {
            Ok(res) => {
                let elapsed_ms = started.elapsed().as_millis();
                match res {
                    Ok(value) => {
                        tracing::debug!(op, elapsed_ms, "statement ok");
                        Ok(value)
                    }
                    Err(err) => {
                        tracing::debug!(op, elapsed_ms, error = %err, "statement failed");
                        Err(err.into())
                    }
                }
            }
            Err(interrupt) => {
                tracing::debug!(op, "statement interrupted; requesting server-side cancel");
                if let Err(e) = self.client.cancel_token().cancel_query(NoTls).await {
                    tracing::warn!(op, error = %e, "postgres cancel request failed");
                }
                Err(interrupt.into())
            }
        }
    }

    async fn execute(
        &self,
        op: &'static str,
        sql: &str,
        params: Params<'_>,
    ) -> Result<u64, BookstoreDbError> {
        self.guard(op, self.client.execute(sql, params)).await
    }

    async fn fetch_one<T: FromPgRow>(
        &self,
        op: &'static str,
        sql: &str,
        params: Params<'_>,
        entity: &'static str,
        key: impl Display,
    ) -> Result<T, BookstoreDbError> {
        match self.guard(op, self.client.query_opt(sql, params)).await? {
            Some(row) => T::from_row(&row),
            None => Err(BookstoreDbError::not_found(entity, key)),
        }
    }

    async fn fetch_all<T: FromPgRow>(
        &self,
        op: &'static str,
        sql: &str,
        params: Params<'_>,
    ) -> Result<Vec<T>, BookstoreDbError> {
        let rows = self.guard(op, self.client.query(sql, params)).await?;
        decode_all(&rows)
    }
}
