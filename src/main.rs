use std::process::ExitCode;
use std::time::Duration;

use bookstore_db::prelude::*;
use clap::Parser;
use serde::Serialize;
use tracing::Level;

/// Connects to the bookstore database, lists the authors, adds one and reads it back.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "POSTGRES_DB")]
    database: String,
    #[arg(long, env = "POSTGRES_USER")]
    user: String,
    #[arg(long, env = "POSTGRES_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    host: String,
    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    port: u16,
    /// Apply pending schema migrations before running.
    #[arg(long)]
    migrate: bool,
    /// Per-run deadline in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            dbname: Some(self.database.clone()),
            host: Some(self.host.clone()),
            port: Some(self.port),
            user: Some(self.user.clone()),
            password: Some(self.password.clone()),
            ..DbConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling");
            on_signal.cancel();
        }
    });

    match run(&args, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, cancel: CancellationToken) -> Result<(), BookstoreDbError> {
    let db = Db::connect(args.db_config()).await?;
    let mut conn = db.checkout().await?;

    if args.migrate {
        let applied = apply_migrations(&mut conn).await?;
        tracing::info!(applied, "schema up to date");
    }

    let q = conn
        .queries()
        .with_cancel(cancel)
        .with_timeout(Duration::from_secs(args.timeout_secs));

    let authors = q.list_authors().await?;
    log_json("authors", &authors);

    let id = AuthorId::new();
    q.create_author(&CreateAuthorParams {
        id,
        name: "Brian Kernighan".to_string(),
        bio: Some(
            "Co-author of The C Programming Language and The Go Programming Language".to_string(),
        ),
    })
    .await?;

    let author = q.get_author(id).await?;
    log_json("author", &author);
    Ok(())
}

fn log_json<T: Serialize>(label: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => tracing::info!("{label}: {json}"),
        Err(e) => tracing::warn!(error = %e, "{label}: not serializable"),
    }
}
