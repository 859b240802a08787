//! `tracing` events for executed SQL.
//!
//! Every statement that [`Database`](crate::Database) sends is reported under
//! the `pgquery.sql` target before it runs. Values are never logged, only
//! their count.

use crate::config::DatabaseConfig;
use tracing::Level;

/// What kind of call a logged statement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Execute,
    FetchRow,
    FetchAll,
    FetchScalar,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Execute => "execute",
            StatementKind::FetchRow => "fetch_row",
            StatementKind::FetchAll => "fetch_all",
            StatementKind::FetchScalar => "fetch_scalar",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
        }
    }
}

/// Emits one event per executed statement.
#[derive(Debug, Clone)]
pub struct SqlLogger {
    /// Whether events are emitted at all.
    pub enabled: bool,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            enabled: config.logging_enabled,
            level: config.log_level,
            max_sql_length: config.max_sql_length,
        }
    }

    /// A logger that never emits.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Report a statement about to be executed.
    pub fn log(&self, kind: StatementKind, sql: &str, param_count: usize) {
        if !self.enabled {
            return;
        }

        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "pgquery.sql",
            kind = kind.as_str(),
            param_count,
            sql = %sql,
        );
    }
}

/// Cut `sql` to at most `max_bytes`, backing off to the previous char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
