//! Row mapping traits and utilities

use crate::error::{DbError, DbResult};
use crate::executor::Record;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for types that can be constructed from a database row.
///
/// ```ignore
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> DbResult<Self> {
///         Ok(User {
///             id: row.try_get_column("id")?,
///             username: row.try_get_column("username")?,
///         })
///     }
/// }
///
/// let users: Vec<User> = db.table("users")?.where_eq("active", true).get_as().await?;
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> DbResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning DbError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| DbError::decode(column, e.to_string()))
    }
}

/// Every column, keyed by name. A column type with no [`Value`] mapping is a decode error.
impl FromRow for Record {
    fn from_row(row: &Row) -> DbResult<Self> {
        let mut record = Record::new();
        for (i, column) in row.columns().iter().enumerate() {
            let value: Value = row
                .try_get(i)
                .map_err(|e| DbError::decode(column.name(), e.to_string()))?;
            record.insert(column.name().to_string(), value);
        }
        Ok(record)
    }
}

macro_rules! impl_from_row_scalar {
    ($($t:ty),*) => {
        $(
            /// First column of the row.
            impl FromRow for $t {
                fn from_row(row: &Row) -> DbResult<Self> {
                    first_column(row)
                }
            }
        )*
    };
}

impl_from_row_scalar!(Value, bool, i16, i32, i64, f32, f64, String);

impl<T> FromRow for Option<T>
where
    T: for<'a> FromSql<'a>,
{
    fn from_row(row: &Row) -> DbResult<Self> {
        first_column(row)
    }
}

fn first_column<T>(row: &Row) -> DbResult<T>
where
    T: for<'a> FromSql<'a>,
{
    let name = row
        .columns()
        .first()
        .map(|c| c.name().to_string())
        .ok_or_else(|| DbError::decode("<none>", "row has no columns"))?;
    row.try_get(0).map_err(|e| DbError::decode(name, e.to_string()))
}
