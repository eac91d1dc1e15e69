use std::fmt;

use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Which integrity rule the store refused a write under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    NotNull,
    ForeignKey,
    Unique,
    Check,
}

impl ConstraintKind {
    /// Map an integrity-violation SQLSTATE (class 23) to its kind.
    #[must_use]
    pub fn from_sqlstate(code: &SqlState) -> Option<Self> {
        if *code == SqlState::NOT_NULL_VIOLATION {
            Some(Self::NotNull)
        } else if *code == SqlState::FOREIGN_KEY_VIOLATION || *code == SqlState::RESTRICT_VIOLATION
        {
            Some(Self::ForeignKey)
        } else if *code == SqlState::UNIQUE_VIOLATION {
            Some(Self::Unique)
        } else if *code == SqlState::CHECK_VIOLATION {
            Some(Self::Check)
        } else {
            None
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotNull => "not-null",
            Self::ForeignKey => "foreign key",
            Self::Unique => "unique",
            Self::Check => "check",
        })
    }
}

#[derive(Debug, Error)]
pub enum BookstoreDbError {
    /// A keyed lookup matched zero rows.
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{kind} constraint violated ({}): {message}", .constraint.as_deref().unwrap_or("unnamed"))]
    ConstraintViolation {
        kind: ConstraintKind,
        constraint: Option<String>,
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// The caller's cancellation token fired, or the server reports the
    /// statement as canceled.
    #[error("operation cancelled")]
    Cancelled,

    #[error("operation exceeded its deadline")]
    DeadlineExceeded,

    #[error(transparent)]
    PostgresError(tokio_postgres::Error),

    #[error(transparent)]
    PoolErrorPostgres(#[from] bb8::RunError<tokio_postgres::Error>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: i32, latest_supported: i32 },
}

impl BookstoreDbError {
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    /// Kind of the violated constraint, if this is a constraint violation.
    #[must_use]
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::ConstraintViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::PoolErrorPostgres(_))
    }
}

impl From<tokio_postgres::Error> for BookstoreDbError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db) = err.as_db_error() {
            if let Some(kind) = ConstraintKind::from_sqlstate(db.code()) {
                let constraint = db.constraint().map(str::to_owned);
                let message = db.message().to_owned();
                return Self::ConstraintViolation {
                    kind,
                    constraint,
                    message,
                    source: err,
                };
            }
            if *db.code() == SqlState::QUERY_CANCELED {
                return Self::Cancelled;
            }
        }
        if is_connection_level(&err) {
            return Self::ConnectionError(err.to_string());
        }
        Self::PostgresError(err)
    }
}

fn is_connection_level(err: &tokio_postgres::Error) -> bool {
    if err.is_closed() {
        return true;
    }
    // SQLSTATE class 08: connection exception
    if err.code().is_some_and(|code| code.code().starts_with("08")) {
        return true;
    }
    std::error::Error::source(err).is_some_and(|src| src.is::<std::io::Error>())
}
