//! Connection and execution settings for [`Database`](crate::Database).

use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use std::time::Duration;
use tracing::Level;

/// Environment variable holding the connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable overriding the generated-key column.
pub const ENV_PRIMARY_KEY: &str = "PGQUERY_PRIMARY_KEY";
/// Environment variable holding the per-statement timeout in milliseconds.
pub const ENV_QUERY_TIMEOUT_MS: &str = "PGQUERY_QUERY_TIMEOUT_MS";

/// Configuration for [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// libpq-style connection string or `postgres://` URL.
    pub url: String,
    /// Column returned by inserts (`RETURNING <primary_key>`). `None` inserts
    /// without reading a key back.
    pub primary_key: Option<Ident>,
    /// Per-statement timeout. `None` waits forever.
    pub query_timeout: Option<Duration>,
    /// Whether executed SQL is logged.
    pub logging_enabled: bool,
    /// Level of the per-statement SQL event.
    pub log_level: Level,
    /// Truncate logged SQL after this many bytes. `None` logs it whole.
    pub max_sql_length: Option<usize>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            primary_key: Some(Ident::from_static("id")),
            query_timeout: None,
            logging_enabled: true,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the environment.
    ///
    /// `DATABASE_URL` is required; `PGQUERY_PRIMARY_KEY` and
    /// `PGQUERY_QUERY_TIMEOUT_MS` are optional. An empty `PGQUERY_PRIMARY_KEY`
    /// turns the generated-key read off.
    pub fn from_env() -> DbResult<Self> {
        let url = std::env::var(ENV_DATABASE_URL)
            .map_err(|_| DbError::Connection(format!("{ENV_DATABASE_URL} is not set")))?;
        let mut config = Self::new().url(url);

        if let Ok(pk) = std::env::var(ENV_PRIMARY_KEY) {
            config = match pk.trim() {
                "" => config.no_primary_key(),
                pk => config.primary_key(pk)?,
            };
        }
        if let Ok(ms) = std::env::var(ENV_QUERY_TIMEOUT_MS) {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                DbError::validation(format!("{ENV_QUERY_TIMEOUT_MS} must be an integer, got {ms:?}"))
            })?;
            config = config.query_timeout(Duration::from_millis(ms));
        }
        Ok(config)
    }

    /// Set the connection string.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the generated-key column. Fails if `column` is not a valid identifier.
    pub fn primary_key(mut self, column: &str) -> DbResult<Self> {
        self.primary_key = Some(Ident::parse(column)?);
        Ok(self)
    }

    /// Insert without `RETURNING`; inserts then yield `Value::Null`.
    pub fn no_primary_key(mut self) -> Self {
        self.primary_key = None;
        self
    }

    /// Set the per-statement timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Enable or disable SQL logging.
    pub fn logging_enabled(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// Set the level of the per-statement SQL event.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Truncate logged SQL after `len` bytes.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
