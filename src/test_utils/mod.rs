//! Disposable Postgres servers for integration tests.
//!
//! Enabled by the `test-utils` feature.

use std::sync::LazyLock;
use tokio::runtime::Runtime;

/// Shared tokio runtime for server setup/teardown, separate from the runtime
/// a test drives its scenario on.
pub(crate) static SHARED_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("Failed to create tokio runtime for test utilities"));

pub mod embedded;

pub use embedded::{EmbeddedPostgres, migrated_db, setup_postgres_embedded, stop_postgres_embedded};
