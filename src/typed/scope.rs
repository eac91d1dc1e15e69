use crate::error::BookstoreDbError;

use super::core::{Idle, InTx, PgConnection};

/// Run `body` in a transaction: commit when it returns `Ok`, roll back when it
/// returns `Err`.
///
/// If `body` panics or the future is dropped mid-way, the open transaction is
/// rolled back by `PgConnection`'s drop.
///
/// # Errors
/// Returns the error from `begin`, from `body`, or from `commit`.
pub async fn with_transaction<T, F>(
    conn: PgConnection<Idle>,
    body: F,
) -> Result<T, BookstoreDbError>
where
    F: AsyncFnOnce(&mut PgConnection<InTx>) -> Result<T, BookstoreDbError>,
{
    let mut tx = conn.begin().await?;
    match body(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed transaction body failed");
            }
            Err(err)
        }
    }
}

/// Run `body` in a transaction that is always rolled back.
///
/// Used for dry runs and for isolating test scenarios: `body` sees its own
/// writes, nothing outlives the call.
///
/// # Errors
/// Returns the error from `begin` or `body`; otherwise the error from `rollback`.
pub async fn with_rollback<T, F>(conn: PgConnection<Idle>, body: F) -> Result<T, BookstoreDbError>
where
    F: AsyncFnOnce(&mut PgConnection<InTx>) -> Result<T, BookstoreDbError>,
{
    let mut tx = conn.begin().await?;
    let outcome = body(&mut tx).await;
    let rolled_back = tx.rollback().await;
    let value = outcome?;
    rolled_back?;
    Ok(value)
}
