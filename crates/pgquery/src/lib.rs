//! # pgquery
//!
//! A small, injection-safe query builder and execution layer for PostgreSQL.
//!
//! ## Features
//!
//! - **Validated identifiers**: table and column names must match `^[A-Za-z_][A-Za-z0-9_]*$`
//!   per dot-separated segment; anything else is rejected before SQL is rendered
//! - **Values are always bound**: every value travels as a `$n` parameter, never as SQL text
//! - **Closed value type**: [`Value`] is null, bool, integer, float or text
//! - **Snapshot terminals**: `first()` and `count()` never mutate the builder
//! - **Explicit keyed writes**: `update()`/`delete()` refuse WHERE clauses they cannot express
//! - **Plain transactions**: `BEGIN`/`COMMIT`/`ROLLBACK` on one connection, via [`transaction!`]
//!
//! ## Query Builder
//!
//! ```ignore
//! use pgquery::{Database, DatabaseConfig, record};
//!
//! let db = Database::connect(DatabaseConfig::from_env()?).await?;
//!
//! // SELECT
//! let posts = db
//!     .table("posts")?
//!     .select(["id", "title"])
//!     .where_eq("status", "published")
//!     .order_by("created_at", "DESC")
//!     .limit(5)
//!     .get()
//!     .await?;
//!
//! // INSERT
//! let id = db.table("users")?.insert(record([("username", "alice")])).await?;
//!
//! // UPDATE
//! db.table("users")?
//!     .where_eq("id", id.clone())
//!     .update(record([("status", "inactive")]))
//!     .await?;
//!
//! // DELETE
//! db.table("users")?.where_eq("id", id).delete().await?;
//! ```
//!
//! Rendering is available without a connection through any [`Executor`]:
//! `build()` returns the SQL and its ordered bindings.

pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod ident;
pub mod logging;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod transaction;
pub mod value;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{DbError, DbResult};
pub use executor::{Executor, Record, record};
pub use ident::{IDENT_PATTERN, Ident, IntoIdent, validate_identifier};
pub use logging::{SqlLogger, StatementKind};
pub use qb::{BuiltQuery, Direction, KeyedConditions, Op, QueryBuilder};
pub use row::{FromRow, RowExt};
pub use value::Value;

// Re-export tokio_postgres for convenience
pub use tokio_postgres;
