use tokio::runtime::Handle;

use crate::error::BookstoreDbError;

use super::core::{Idle, InTx, PgConnection};

impl PgConnection<Idle> {
    /// Begin an explicit transaction.
    ///
    /// # Errors
    /// Returns `BookstoreDbError` if starting the transaction fails.
    pub async fn begin(mut self) -> Result<PgConnection<InTx>, BookstoreDbError> {
        let conn = self.take_conn()?;
        conn.simple_query("BEGIN").await?;
        Ok(PgConnection::new(conn, true))
    }
}

impl PgConnection<InTx> {
    /// Commit and return to idle.
    ///
    /// # Errors
    /// Returns `BookstoreDbError` if the commit fails. The transaction is rolled
    /// back in that case.
    pub async fn commit(self) -> Result<PgConnection<Idle>, BookstoreDbError> {
        self.finish_tx("COMMIT", "commit").await
    }

    /// Rollback and return to idle.
    ///
    /// # Errors
    /// Returns `BookstoreDbError` if the rollback fails.
    pub async fn rollback(self) -> Result<PgConnection<Idle>, BookstoreDbError> {
        self.finish_tx("ROLLBACK", "rollback").await
    }

    async fn finish_tx(
        mut self,
        sql: &str,
        action: &str,
    ) -> Result<PgConnection<Idle>, BookstoreDbError> {
        let conn = self.take_conn()?;
        match conn.simple_query(sql).await {
            Ok(_) => {
                self.needs_rollback = false;
                Ok(PgConnection::new(conn, false))
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "postgres transaction finish failed");
                // Best-effort rollback; keep needs_rollback so Drop can retry.
                let _ = conn.simple_query("ROLLBACK").await;
                self.conn = Some(conn);
                Err(err.into())
            }
        }
    }
}

// Drop cannot be specialized for PgConnection<InTx>, so the flag carries the
// state. Postgres would also discard an open transaction if the session ended,
// but pooled sessions outlive the handle and must come back clean.
impl<State> Drop for PgConnection<State> {
    fn drop(&mut self) {
        if self.needs_rollback
            && let Some(conn) = self.conn.take()
        {
            match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = conn.simple_query("ROLLBACK").await {
                            tracing::warn!(error = %e, "rollback of dropped transaction failed");
                        }
                    });
                }
                Err(_) => {
                    tracing::error!(
                        "transaction dropped outside a tokio runtime; rollback not sent"
                    );
                }
            }
        }
    }
}
