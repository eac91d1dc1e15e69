use std::{future::Future, marker::PhantomData};

use bb8::{ErrorSink, ManageConnection, Pool, PooledConnection};
use tokio::sync::broadcast;
use tokio_postgres::{Client, NoTls};

use crate::config::DbConfig;
use crate::error::BookstoreDbError;

/// Marker types for typestate
pub enum Idle {}
pub enum InTx {}

/// bb8 manager for Postgres clients.
pub struct PgManager {
    pub(crate) config: tokio_postgres::Config,
}

impl PgManager {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }

    /// Build a pool from this manager.
    ///
    /// One connection is opened up front, so an unreachable server or bad
    /// credentials fail here with the driver's error. Connects are never
    /// retried; later failures are logged and broadcast on `failures`.
    ///
    /// # Errors
    /// Returns `BookstoreDbError` if the first connection cannot be opened.
    pub async fn build_pool(
        self,
        max_size: u32,
        checkout_timeout: std::time::Duration,
        failures: broadcast::Sender<String>,
    ) -> Result<Pool<PgManager>, BookstoreDbError> {
        Pool::builder()
            .max_size(max_size)
            .min_idle(Some(1))
            .retry_connection(false)
            .connection_timeout(checkout_timeout)
            .error_sink(Box::new(ConnectFailures { tx: failures }))
            .build(self)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "postgres pool could not open a connection");
                BookstoreDbError::from(e)
            })
    }
}

/// Receives the connect and validation errors bb8 hits outside any single
/// call, logs them and hands them to whichever checkouts are waiting.
#[derive(Debug, Clone)]
struct ConnectFailures {
    tx: broadcast::Sender<String>,
}

impl ErrorSink<tokio_postgres::Error> for ConnectFailures {
    fn sink(&self, error: tokio_postgres::Error) {
        tracing::warn!(error = %error, "postgres pool connection failure");
        // Err only means no checkout is waiting right now.
        let _ = self.tx.send(error.to_string());
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<tokio_postgres::Error>> {
        Box::new(self.clone())
    }
}

async fn next_failure(failures: &mut broadcast::Receiver<String>) -> String {
    loop {
        match failures.recv().await {
            Ok(message) => return message,
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

impl ManageConnection for PgManager {
    type Connection = Client;
    type Error = tokio_postgres::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let cfg = self.config.clone();
        async move {
            tracing::debug!(
                hosts = ?cfg.get_hosts(),
                db = ?cfg.get_dbname(),
                user = ?cfg.get_user(),
                "postgres connect start"
            );
            let (client, connection) = cfg.connect(NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "postgres connection driver failed");
                }
            });
            Ok(client)
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.simple_query("SELECT 1").await.map(|_| ()) }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

/// Shared store handle: validated config plus the connection pool.
///
/// Cheap to clone; pass it to whatever needs database access.
#[derive(Clone)]
pub struct Db {
    config: DbConfig,
    pool: Pool<PgManager>,
    failures: broadcast::Sender<String>,
}

impl Db {
    /// Validate `config`, build a pool for it and open the first connection.
    ///
    /// # Errors
    /// Returns `BookstoreDbError::ConfigError` if required config fields are missing,
    /// `BookstoreDbError::ConnectionError` if the server cannot be reached, or the
    /// server's error if it refuses the session (for example bad credentials).
    pub async fn connect(config: DbConfig) -> Result<Self, BookstoreDbError> {
        let pg_config = config.to_pg_config()?;
        let (failures, _) = broadcast::channel(16);
        let pool = PgManager::new(pg_config)
            .build_pool(
                config.pool_max_size,
                config.connect_timeout,
                failures.clone(),
            )
            .await?;
        tracing::info!(target_db = %config, "postgres pool ready");
        Ok(Self {
            config,
            pool,
            failures,
        })
    }

    /// Checkout a connection from the pool.
    ///
    /// A connect or validation failure reported by the pool while this call
    /// waits ends it at once with that failure instead of waiting out
    /// `connect_timeout`.
    ///
    /// # Errors
    /// Returns `BookstoreDbError::ConnectionError` carrying the driver's message
    /// when the server cannot be reached, or `PoolErrorPostgres` on timeout.
    pub async fn checkout(&self) -> Result<PgConnection<Idle>, BookstoreDbError> {
        let mut failures = self.failures.subscribe();
        tokio::select! {
            biased;
            conn = PgConnection::from_pool(&self.pool) => conn,
            message = next_failure(&mut failures) => {
                Err(BookstoreDbError::ConnectionError(message))
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<PgManager> {
        &self.pool
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("config", &self.config)
            .field("pool", &self.pool.state())
            .finish()
    }
}

/// Typestate wrapper around a pooled Postgres client.
pub struct PgConnection<State> {
    pub(crate) conn: Option<PooledConnection<'static, PgManager>>,
    /// True when a transaction is in-flight and needs rollback if dropped.
    pub(crate) needs_rollback: bool,
    pub(crate) _state: PhantomData<State>,
}

impl<State> std::fmt::Debug for PgConnection<State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnection")
            .field("state", &std::any::type_name::<State>())
            .field("needs_rollback", &self.needs_rollback)
            .field("closed", &self.conn.as_deref().map(Client::is_closed))
            .finish()
    }
}

impl PgConnection<Idle> {
    /// Checkout a connection from the pool.
    ///
    /// # Errors
    /// Returns `BookstoreDbError` if acquiring the connection fails.
    pub async fn from_pool(pool: &Pool<PgManager>) -> Result<Self, BookstoreDbError> {
        let conn = pool.get_owned().await?;
        Ok(Self::new(conn, false))
    }
}

impl<State> PgConnection<State> {
    pub(crate) fn new(conn: PooledConnection<'static, PgManager>, needs_rollback: bool) -> Self {
        Self {
            conn: Some(conn),
            needs_rollback,
            _state: PhantomData,
        }
    }

    // The client is only absent between take_conn and the state transition
    // that consumes `self`, so no caller can observe it missing.
    pub(crate) fn conn_ref(&self) -> &Client {
        self.conn
            .as_deref()
            .expect("postgres connection already taken")
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Client {
        self.conn
            .as_deref_mut()
            .expect("postgres connection already taken")
    }

    pub(crate) fn take_conn(
        &mut self,
    ) -> Result<PooledConnection<'static, PgManager>, BookstoreDbError> {
        self.conn.take().ok_or_else(|| {
            BookstoreDbError::ExecutionError("postgres connection already taken".into())
        })
    }
}
