//! Convenient imports for typical `pgquery` usage.
//!
//! ```ignore
//! use pgquery::prelude::*;
//! ```

pub use crate::{
    Database, DatabaseConfig, DbError, DbResult, Executor, FromRow, Ident, QueryBuilder, Record,
    RowExt, Value, record,
};
