#![cfg(feature = "test-utils")]

mod common;

use std::time::Duration;

use bookstore_db::prelude::*;
use common::{author, with_store};
use tokio::time::{Instant, sleep};

#[test]
fn with_transaction_commits_on_ok() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("committed", None);
        with_transaction(db.checkout().await?, async |tx| {
            tx.queries().create_author(&params).await
        })
        .await?;

        let conn = db.checkout().await?;
        assert_eq!(conn.queries().get_author(params.id).await?.name, "committed");
        Ok(())
    })
}

#[test]
fn with_transaction_rolls_back_on_err() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("discarded", None);
        let outcome: Result<(), BookstoreDbError> =
            with_transaction(db.checkout().await?, async |tx| {
                tx.queries().create_author(&params).await?;
                Err(BookstoreDbError::ExecutionError("abort".into()))
            })
            .await;
        assert!(matches!(outcome, Err(BookstoreDbError::ExecutionError(ref m)) if m == "abort"));

        let conn = db.checkout().await?;
        assert!(conn.queries().get_author(params.id).await.unwrap_err().is_not_found());
        assert!(conn.queries().list_authors().await?.is_empty());
        Ok(())
    })
}

#[test]
fn with_rollback_discards_successful_writes() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("scratch", None);
        let seen = with_rollback(db.checkout().await?, async |tx| {
            let q = tx.queries();
            q.create_author(&params).await?;
            q.get_author(params.id).await
        })
        .await?;
        assert_eq!(seen.name, "scratch");

        let conn = db.checkout().await?;
        assert!(conn.queries().list_authors().await?.is_empty());
        Ok(())
    })
}

#[test]
fn explicit_commit_returns_an_idle_connection() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("explicit", Some("bio"));
        let tx = db.checkout().await?.begin().await?;
        tx.queries().create_author(&params).await?;
        let idle = tx.commit().await?;

        assert_eq!(idle.queries().get_author(params.id).await?, Author::from(params));
        Ok(())
    })
}

#[test]
fn dropped_transaction_is_rolled_back() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        // One pooled session, so the next checkout reuses the dropped one.
        let single = Db::connect(DbConfig {
            pool_max_size: 1,
            ..db.config().clone()
        })
        .await?;

        let params = author("never committed", None);
        {
            let tx = single.checkout().await?.begin().await?;
            tx.queries().create_author(&params).await?;
        }

        let conn = single.checkout().await?;
        let err = conn.queries().get_author(params.id).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err:?}");
        Ok(())
    })
}

#[test]
fn cancelled_token_stops_call_before_it_is_sent() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let conn = db.checkout().await?;
        let token = CancellationToken::new();
        token.cancel();

        let params = author("never sent", None);
        let q = conn.queries().with_cancel(token);
        let err = q.create_author(&params).await.unwrap_err();
        assert!(err.is_cancellation(), "unexpected error: {err:?}");
        assert!(matches!(err, BookstoreDbError::Cancelled));

        assert!(conn.queries().list_authors().await?.is_empty());
        Ok(())
    })
}

#[test]
fn expired_deadline_stops_call_before_it_is_sent() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let conn = db.checkout().await?;
        let q = conn.queries().with_deadline(Instant::now());
        let err = q.list_authors().await.unwrap_err();
        assert!(matches!(err, BookstoreDbError::DeadlineExceeded), "{err:?}");
        assert!(err.is_cancellation());
        Ok(())
    })
}

#[test]
fn cancelling_a_blocked_statement_leaves_connection_usable()
-> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("contended", None);
        db.checkout().await?.queries().create_author(&params).await?;

        // Hold the row lock so the second update blocks server-side.
        let holder = db.checkout().await?.begin().await?;
        let lock = UpdateAuthorParams {
            id: params.id,
            name: "holder".to_string(),
            bio: None,
        };
        holder.queries().update_author(&lock).await?;

        let waiter = db.checkout().await?;
        let token = CancellationToken::new();
        let q = waiter.queries().with_cancel(token.clone());
        let blocked = UpdateAuthorParams {
            id: params.id,
            name: "waiter".to_string(),
            bio: None,
        };
        let (outcome, ()) = tokio::join!(q.update_author(&blocked), async {
            sleep(Duration::from_millis(200)).await;
            token.cancel();
        });
        let err = outcome.unwrap_err();
        assert!(matches!(err, BookstoreDbError::Cancelled), "{err:?}");

        holder.rollback().await?;

        let got = waiter.queries().get_author(params.id).await?;
        assert_eq!(got.name, "contended");
        Ok(())
    })
}

#[test]
fn deadline_interrupts_a_blocked_statement() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("contended", None);
        db.checkout().await?.queries().create_author(&params).await?;

        let holder = db.checkout().await?.begin().await?;
        holder.queries().delete_author(params.id).await?;

        let waiter = db.checkout().await?;
        let q = waiter.queries().with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = q.delete_author(params.id).await.unwrap_err();
        assert!(matches!(err, BookstoreDbError::DeadlineExceeded), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));

        holder.rollback().await?;
        assert_eq!(waiter.queries().list_authors().await?.len(), 1);
        Ok(())
    })
}

#[test]
fn cancel_spares_statements_on_other_connections() -> Result<(), Box<dyn std::error::Error>> {
    with_store(async |db| {
        let params = author("contended", None);
        db.checkout().await?.queries().create_author(&params).await?;

        let holder = db.checkout().await?.begin().await?;
        let lock = UpdateAuthorParams {
            id: params.id,
            name: "holder".to_string(),
            bio: None,
        };
        holder.queries().update_author(&lock).await?;

        let cancelled_conn = db.checkout().await?;
        let bystander = db.checkout().await?;
        let token = CancellationToken::new();
        let q = cancelled_conn.queries().with_cancel(token.clone());
        let blocked = UpdateAuthorParams {
            id: params.id,
            name: "waiter".to_string(),
            bio: None,
        };

        let (outcome, slow, ()) = tokio::join!(
            q.update_author(&blocked),
            bystander.client().simple_query("SELECT pg_sleep(0.5)"),
            async {
                sleep(Duration::from_millis(200)).await;
                token.cancel();
            }
        );
        assert!(matches!(outcome, Err(BookstoreDbError::Cancelled)), "{outcome:?}");
        slow?;

        holder.rollback().await?;
        Ok(())
    })
}
