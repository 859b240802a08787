//! Fluent query builder.
//!
//! A [`QueryBuilder`] is bound to one table and one [`Executor`]. It collects
//! columns, WHERE clauses, ordering and paging, binding every value as it is
//! added, and renders parameterized SQL with `$1, $2, ...` placeholders.
//! Identifiers are validated; values never appear in the SQL text.
//!
//! # Usage
//!
//! ```ignore
//! use pgquery::qb;
//!
//! // SELECT
//! let posts = qb::table(&db, "posts")?
//!     .select(["id", "title"])
//!     .where_eq("status", "published")
//!     .order_by_desc("created_at")
//!     .limit(5)
//!     .get()
//!     .await?;
//!
//! // UPDATE (equality conditions only)
//! db.table("users")?
//!     .where_eq("id", 7)
//!     .update(pgquery::record([("status", "inactive")]))
//!     .await?;
//! ```

mod builder;
mod clause;
mod mutation;
mod param;
mod select;

pub use builder::QueryBuilder;
pub use clause::{Direction, KeyedConditions, Op, OrderSpec, WhereClause};
pub use mutation::{render_delete, render_insert, render_update};
pub use param::{Bindings, as_refs};
pub use select::{BuiltQuery, Columns, QueryState};

use crate::error::DbResult;
use crate::executor::Executor;

/// Start a builder on `table`, executing through `conn`.
pub fn table<'c, E: Executor>(conn: &'c E, table: &str) -> DbResult<QueryBuilder<'c, E>> {
    QueryBuilder::new(conn, table)
}
