//! The execution contract the query builder hands rendered statements to.
//!
//! The builder only ever produces SQL text with positional placeholders and a
//! matching ordered list of [`Value`]s. Everything past that point (parameter
//! substitution, I/O, transaction state, timeouts) belongs to an [`Executor`].
//! [`Database`](crate::Database) is the `tokio-postgres` implementation.

use crate::error::DbResult;
use crate::ident::Ident;
use crate::value::Value;
use std::collections::BTreeMap;

/// A column -> value map, used for inserted/updated data and keyed conditions.
pub type Record = BTreeMap<String, Value>;

/// Build a [`Record`] from `(column, value)` pairs.
///
/// ```
/// use pgquery::{Value, record};
///
/// let r = record([("name", Value::from("alice")), ("age", Value::from(30))]);
/// assert_eq!(r["age"], Value::Int(30));
/// ```
pub fn record<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Record
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// A database-execution collaborator.
///
/// Failures are `Err`; "no rows" is an empty `Vec`, `None`, or `0`. The two are
/// never conflated.
pub trait Executor: Send + Sync {
    /// The row type returned by fetches.
    type Row: Send;

    /// Execute a raw statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;

    /// Fetch the first row, if any.
    fn fetch_row(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = DbResult<Option<Self::Row>>> + Send;

    /// Fetch all rows (possibly none).
    fn fetch_all(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = DbResult<Vec<Self::Row>>> + Send;

    /// Fetch the first column of the first row, if any.
    fn fetch_scalar(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = DbResult<Option<Value>>> + Send;

    /// Column an insert reads back when the caller names none.
    ///
    /// `None` means inserts return [`Value::Null`].
    fn primary_key(&self) -> Option<&Ident>;

    /// Insert one row and return the value of the `returning` column, or
    /// [`Value::Null`] when there is none.
    fn insert_row(
        &self,
        table: &Ident,
        data: &Record,
        returning: Option<&Ident>,
    ) -> impl std::future::Future<Output = DbResult<Value>> + Send;

    /// Update rows matching every keyed condition; returns affected rows.
    fn update_rows(
        &self,
        table: &Ident,
        data: &Record,
        conditions: &Record,
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;

    /// Delete rows matching every keyed condition; returns affected rows.
    fn delete_rows(
        &self,
        table: &Ident,
        conditions: &Record,
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;
}
