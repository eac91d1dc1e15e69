use postgresql_embedded::PostgreSQL;

use super::SHARED_RUNTIME;
use crate::config::DbConfig;
use crate::error::BookstoreDbError;
use crate::migrations::apply_migrations;
use crate::typed::Db;

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    /// Working configuration for the created database, credentials included.
    pub config: DbConfig,
}

/// Start an embedded `PostgreSQL` server and create `dbname` on it.
///
/// The database is empty; run [`migrated_db`] (or `apply_migrations`) to get
/// the bookstore schema.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, or the database
/// cannot be created.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();

        // Bundled binaries: setup only unpacks, no download.
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(dbname).await?;

        let settings = postgresql.settings();
        let config = DbConfig {
            dbname: Some(dbname.to_string()),
            host: Some(settings.host.clone()),
            port: Some(settings.port),
            user: Some(settings.username.clone()),
            password: Some(settings.password.clone()),
            pool_max_size: 4,
            ..DbConfig::default()
        };
        tracing::info!(target_db = %config, "embedded postgres started");

        Ok::<_, Box<dyn std::error::Error>>(EmbeddedPostgres { postgresql, config })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        if let Err(e) = postgresql.stop().await {
            tracing::warn!(error = %e, "embedded postgres stop failed");
        }
    });
}

/// Connect to `config` and bring the schema up to date.
///
/// Must be awaited on the runtime that will use the returned pool.
///
/// # Errors
/// Returns connection or migration errors.
pub async fn migrated_db(config: DbConfig) -> Result<Db, BookstoreDbError> {
    let db = Db::connect(config).await?;
    let mut conn = db.checkout().await?;
    apply_migrations(&mut conn).await?;
    Ok(db)
}
