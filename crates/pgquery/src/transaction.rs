//! Transaction helper macro.
//!
//! Transactions are plain `BEGIN`/`COMMIT`/`ROLLBACK` on the connection owned
//! by a [`Database`](crate::Database); there is no nesting and no savepoints.
//! Every statement issued through the same `Database` between `BEGIN` and
//! `COMMIT` belongs to the transaction, including query builder terminals.
//!
//! # Example
//!
//! ```ignore
//! use pgquery::{Database, DbResult, Value, record};
//!
//! # async fn demo(db: &Database) -> DbResult<()> {
//! pgquery::transaction!(db, {
//!     db.query(
//!         "UPDATE accounts SET balance = balance - $1 WHERE id = $2",
//!         &[Value::Int(100), Value::Int(1)],
//!     )
//!     .await?;
//!     db.insert("ledger", &record([("account_id", 1), ("amount", -100)])).await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$db.begin_transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `pgquery::DbResult<T>`. If the rollback itself
/// fails, both errors are reported in a single `DbError::Other`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $body:block) => {{
        let __pgquery_db = &$db;
        match __pgquery_db.begin_transaction().await {
            Err(error) => Err(error),
            Ok(()) => {
                let __pgquery_tx_body_result: $crate::DbResult<_> = async { $body }.await;
                match __pgquery_tx_body_result {
                    Ok(value) => match __pgquery_db.commit().await {
                        Ok(()) => Ok(value),
                        Err(error) => Err(error),
                    },
                    Err(error) => match __pgquery_db.rollback().await {
                        Ok(()) => Err(error),
                        Err(rollback_err) => Err($crate::DbError::Other(format!(
                            "{error} (rollback failed: {rollback_err})"
                        ))),
                    },
                }
            }
        }
    }};
}
