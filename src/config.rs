use std::fmt;
use std::net::Ipv6Addr;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, PercentEncode, utf8_percent_encode};

use crate::error::BookstoreDbError;

/// Connection settings for the bookstore database.
///
/// The five connection fields are required; [`DbConfig::validate`] rejects the
/// config before any pool is built if one of them is missing.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub dbname: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: u32,
    /// Applied both to the TCP connect and to pool checkout.
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dbname: None,
            host: None,
            port: None,
            user: None,
            password: None,
            pool_max_size: 8,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DbConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every connection option is present and non-empty.
    ///
    /// # Errors
    /// Returns `BookstoreDbError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), BookstoreDbError> {
        require("dbname", self.dbname.as_deref())?;
        require("host", self.host.as_deref())?;
        if self.port.is_none() {
            return Err(BookstoreDbError::ConfigError("port is required".to_string()));
        }
        require("user", self.user.as_deref())?;
        // An empty password is a legitimate (trust auth) setting; only absence is rejected.
        if self.password.is_none() {
            return Err(BookstoreDbError::ConfigError(
                "password is required".to_string(),
            ));
        }
        if self.pool_max_size == 0 {
            return Err(BookstoreDbError::ConfigError(
                "pool_max_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the driver configuration.
    ///
    /// # Errors
    /// Returns `BookstoreDbError::ConfigError` if validation fails.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config, BookstoreDbError> {
        self.validate()?;
        let mut pg = tokio_postgres::Config::new();
        if let Some(dbname) = &self.dbname {
            pg.dbname(dbname);
        }
        if let Some(host) = &self.host {
            pg.host(host);
        }
        if let Some(port) = self.port {
            pg.port(port);
        }
        if let Some(user) = &self.user {
            pg.user(user);
        }
        if let Some(password) = &self.password {
            pg.password(password);
        }
        pg.connect_timeout(self.connect_timeout);
        pg.application_name(env!("CARGO_PKG_NAME"));
        Ok(pg)
    }

    /// Connection string in URL form, password included.
    ///
    /// User, password, host and database name are percent-encoded and an IPv6
    /// host is bracketed, so the string parses back to the same settings.
    ///
    /// # Errors
    /// Returns `BookstoreDbError::ConfigError` if validation fails.
    pub fn dsn(&self) -> Result<String, BookstoreDbError> {
        self.validate()?;
        let host = self.host.as_deref().unwrap_or_default();
        let host = if host.parse::<Ipv6Addr>().is_ok() {
            format!("[{host}]")
        } else {
            url_part(host).to_string()
        };
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            url_part(self.user.as_deref().unwrap_or_default()),
            url_part(self.password.as_deref().unwrap_or_default()),
            host,
            self.port.unwrap_or_default(),
            url_part(self.dbname.as_deref().unwrap_or_default()),
        ))
    }
}

/// Everything outside RFC 3986 unreserved characters gets escaped.
const URL_PART: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn url_part(raw: &str) -> PercentEncode<'_> {
    utf8_percent_encode(raw, URL_PART)
}

fn require(field: &str, value: Option<&str>) -> Result<(), BookstoreDbError> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(BookstoreDbError::ConfigError(format!("{field} is required"))),
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgres://{}:***@{}:{}/{}",
            self.user.as_deref().unwrap_or("?"),
            self.host.as_deref().unwrap_or("?"),
            self.port.map_or_else(|| "?".to_string(), |p| p.to_string()),
            self.dbname.as_deref().unwrap_or("?"),
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("dbname", &self.dbname)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("pool_max_size", &self.pool_max_size)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
