//! INSERT / UPDATE / DELETE rendering for the keyed write primitives.
//!
//! Column names come from [`Record`] keys and are validated here, so a map
//! built from untrusted input cannot smuggle SQL into the statement.

use crate::error::{DbError, DbResult};
use crate::executor::Record;
use crate::ident::Ident;
use crate::qb::param::{Bindings, push_placeholder};
use crate::qb::select::BuiltQuery;
use crate::value::Value;

/// `INSERT INTO t (a, b) VALUES ($1, $2) RETURNING key`
///
/// An empty map renders `INSERT INTO t DEFAULT VALUES`. Without a `returning`
/// column the RETURNING clause is left off.
pub fn render_insert(
    table: &Ident,
    data: &Record,
    returning: Option<&Ident>,
) -> DbResult<BuiltQuery> {
    let mut bindings = Bindings::new();
    let mut sql = String::from("INSERT INTO ");
    table.write_sql(&mut sql);

    if data.is_empty() {
        sql.push_str(" DEFAULT VALUES");
    } else {
        let mut cols = String::new();
        let mut vals = String::new();
        for (i, (col, value)) in data.iter().enumerate() {
            if i > 0 {
                cols.push_str(", ");
                vals.push_str(", ");
            }
            Ident::parse(col)?.write_sql(&mut cols);
            push_placeholder(&mut vals, bindings.bind(value.clone()));
        }
        sql.push_str(" (");
        sql.push_str(&cols);
        sql.push_str(") VALUES (");
        sql.push_str(&vals);
        sql.push(')');
    }

    if let Some(key) = returning {
        sql.push_str(" RETURNING ");
        key.write_sql(&mut sql);
    }
    Ok(BuiltQuery::new(sql, bindings.into_values()))
}

/// `UPDATE t SET a = $1 WHERE k = $2 AND ...`
///
/// Refuses an empty data map and an empty condition map.
pub fn render_update(table: &Ident, data: &Record, conditions: &Record) -> DbResult<BuiltQuery> {
    if data.is_empty() {
        return Err(DbError::validation("UPDATE requires at least one column to set"));
    }
    if conditions.is_empty() {
        return Err(DbError::validation(
            "UPDATE requires at least one keyed condition",
        ));
    }

    let mut bindings = Bindings::new();
    let mut sql = String::from("UPDATE ");
    table.write_sql(&mut sql);
    sql.push_str(" SET ");
    for (i, (col, value)) in data.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        Ident::parse(col)?.write_sql(&mut sql);
        sql.push_str(" = ");
        push_placeholder(&mut sql, bindings.bind(value.clone()));
    }
    write_keyed_where(&mut sql, &mut bindings, conditions)?;
    Ok(BuiltQuery::new(sql, bindings.into_values()))
}

/// `DELETE FROM t WHERE k = $1 AND ...`
///
/// Refuses an empty condition map.
pub fn render_delete(table: &Ident, conditions: &Record) -> DbResult<BuiltQuery> {
    if conditions.is_empty() {
        return Err(DbError::validation(
            "DELETE requires at least one keyed condition",
        ));
    }

    let mut bindings = Bindings::new();
    let mut sql = String::from("DELETE FROM ");
    table.write_sql(&mut sql);
    write_keyed_where(&mut sql, &mut bindings, conditions)?;
    Ok(BuiltQuery::new(sql, bindings.into_values()))
}

/// NULL conditions render as `IS NULL`; `= NULL` would match nothing.
fn write_keyed_where(sql: &mut String, bindings: &mut Bindings, conditions: &Record) -> DbResult<()> {
    sql.push_str(" WHERE ");
    for (i, (col, value)) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        Ident::parse(col)?.write_sql(sql);
        if let Value::Null = value {
            sql.push_str(" IS NULL");
        } else {
            sql.push_str(" = ");
            push_placeholder(sql, bindings.bind(value.clone()));
        }
    }
    Ok(())
}
