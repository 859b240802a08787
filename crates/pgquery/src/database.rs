//! `tokio-postgres` implementation of [`Executor`].
//!
//! [`Database`] owns one [`tokio_postgres::Client`]. It runs raw parameterized
//! SQL, the keyed insert/update/delete primitives the query builder hands off
//! to, and un-nested `BEGIN`/`COMMIT`/`ROLLBACK` on that single connection.
//!
//! ```ignore
//! use pgquery::{Database, DatabaseConfig, record};
//!
//! let db = Database::connect(DatabaseConfig::from_env()?).await?;
//! let id = db.insert("users", &record([("username", "alice")])).await?;
//! let n = db.table("users")?.where_eq("id", id).count().await?;
//! ```

use crate::config::DatabaseConfig;
use crate::error::{DbError, DbResult};
use crate::executor::{Executor, Record};
use crate::ident::{Ident, IntoIdent};
use crate::logging::{SqlLogger, StatementKind};
use crate::qb::{self, QueryBuilder, as_refs};
use crate::value::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_postgres::{Client, NoTls, Row};

/// A single PostgreSQL connection plus execution settings.
pub struct Database {
    client: Client,
    config: DatabaseConfig,
    logger: SqlLogger,
    in_transaction: AtomicBool,
}

impl Database {
    /// Open one connection (no TLS) using `config.url`.
    ///
    /// The driver's connection task is spawned onto the current tokio runtime;
    /// if it ends with an error, that error is logged under `pgquery.conn`.
    pub async fn connect(config: DatabaseConfig) -> DbResult<Self> {
        if config.url.is_empty() {
            return Err(DbError::Connection("no connection URL configured".to_string()));
        }
        let (client, connection) = tokio_postgres::connect(&config.url, NoTls)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "pgquery.conn", error = %e, "connection error");
            }
        });

        Ok(Self::new(client, config))
    }

    /// Wrap an already connected client.
    pub fn new(client: Client, config: DatabaseConfig) -> Self {
        let logger = SqlLogger::from_config(&config);
        Self {
            client,
            config,
            logger,
            in_transaction: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Start a query builder on `table`.
    pub fn table(&self, table: &str) -> DbResult<QueryBuilder<'_, Self>> {
        qb::table(self, table)
    }

    // ==================== Raw SQL ====================

    /// Run a statement and return the number of affected rows.
    pub async fn query(&self, sql: &str, bindings: &[Value]) -> DbResult<u64> {
        Executor::execute(self, sql, bindings).await
    }

    /// First row of the result, if any.
    pub async fn get_row(&self, sql: &str, bindings: &[Value]) -> DbResult<Option<Row>> {
        self.fetch_row(sql, bindings).await
    }

    /// All rows of the result.
    pub async fn get_results(&self, sql: &str, bindings: &[Value]) -> DbResult<Vec<Row>> {
        self.fetch_all(sql, bindings).await
    }

    /// First column of the first row, if any.
    pub async fn get_var(&self, sql: &str, bindings: &[Value]) -> DbResult<Option<Value>> {
        self.fetch_scalar(sql, bindings).await
    }

    // ==================== Keyed writes ====================

    /// Insert one row and return the value of the configured primary key.
    ///
    /// With [`DatabaseConfig::no_primary_key`] the row is inserted without
    /// `RETURNING` and the result is [`Value::Null`].
    pub async fn insert(&self, table: impl IntoIdent, data: &Record) -> DbResult<Value> {
        let table = table.into_ident()?;
        self.insert_row(&table, data, self.primary_key()).await
    }

    /// Insert one row and return the value of `column`.
    pub async fn insert_returning(
        &self,
        table: impl IntoIdent,
        data: &Record,
        column: impl IntoIdent,
    ) -> DbResult<Value> {
        let table = table.into_ident()?;
        let column = column.into_ident()?;
        self.insert_row(&table, data, Some(&column)).await
    }

    /// Update rows matching every `column = value` in `conditions`.
    pub async fn update(
        &self,
        table: impl IntoIdent,
        data: &Record,
        conditions: &Record,
    ) -> DbResult<u64> {
        let table = table.into_ident()?;
        self.update_rows(&table, data, conditions).await
    }

    /// Delete rows matching every `column = value` in `conditions`.
    pub async fn delete(&self, table: impl IntoIdent, conditions: &Record) -> DbResult<u64> {
        let table = table.into_ident()?;
        self.delete_rows(&table, conditions).await
    }

    // ==================== Transactions ====================

    /// Issue `BEGIN`. Fails if a transaction is already open.
    pub async fn begin_transaction(&self) -> DbResult<()> {
        if self
            .in_transaction
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DbError::transaction(
                "a transaction is already open (nested transactions are not supported)",
            ));
        }
        if let Err(e) = self.control("BEGIN").await {
            self.in_transaction.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }

    /// Issue `COMMIT`. Fails if no transaction is open.
    pub async fn commit(&self) -> DbResult<()> {
        self.finish("COMMIT").await
    }

    /// Issue `ROLLBACK`. Fails if no transaction is open.
    pub async fn rollback(&self) -> DbResult<()> {
        self.finish("ROLLBACK").await
    }

    /// Whether `begin_transaction` has been called without a matching commit/rollback.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::Acquire)
    }

    // Cleared up front: a failed COMMIT or ROLLBACK still ends the server-side transaction.
    async fn finish(&self, statement: &'static str) -> DbResult<()> {
        if self
            .in_transaction
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DbError::transaction(format!(
                "{statement} without an open transaction"
            )));
        }
        self.control(statement).await
    }

    async fn control(&self, statement: &'static str) -> DbResult<()> {
        tracing::debug!(target: "pgquery.tx", statement, "transaction control");
        self.run(self.client.batch_execute(statement)).await
    }

    // ==================== Internals ====================

    /// Await a driver call, classifying its error and applying the timeout.
    ///
    /// On timeout a server-side cancel is sent in the background.
    async fn run<T, F>(&self, future: F) -> DbResult<T>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>> + Send,
    {
        let future = async { future.await.map_err(DbError::from_db_error) };
        match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future).await.map_err(|_| {
                let cancel_token = self.client.cancel_token();
                tokio::spawn(async move {
                    if let Err(e) = cancel_token.cancel_query(NoTls).await {
                        tracing::warn!(target: "pgquery.conn", error = %e, "query cancel failed");
                    }
                });
                DbError::Timeout(timeout)
            })?,
            None => future.await,
        }
    }

    async fn query_rows(&self, kind: StatementKind, sql: &str, bindings: &[Value]) -> DbResult<Vec<Row>> {
        self.logger.log(kind, sql, bindings.len());
        let params = as_refs(bindings);
        self.run(self.client.query(sql, &params)).await
    }

    async fn execute_as(&self, kind: StatementKind, sql: &str, bindings: &[Value]) -> DbResult<u64> {
        self.logger.log(kind, sql, bindings.len());
        let params = as_refs(bindings);
        self.run(self.client.execute(sql, &params)).await
    }
}

fn first_value(row: &Row) -> DbResult<Option<Value>> {
    let Some(column) = row.columns().first() else {
        return Ok(None);
    };
    row.try_get::<_, Value>(0)
        .map(Some)
        .map_err(|e| DbError::decode(column.name(), e.to_string()))
}

impl Executor for Database {
    type Row = Row;

    async fn execute(&self, sql: &str, bindings: &[Value]) -> DbResult<u64> {
        self.execute_as(StatementKind::Execute, sql, bindings).await
    }

    async fn fetch_row(&self, sql: &str, bindings: &[Value]) -> DbResult<Option<Row>> {
        let rows = self.query_rows(StatementKind::FetchRow, sql, bindings).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_all(&self, sql: &str, bindings: &[Value]) -> DbResult<Vec<Row>> {
        self.query_rows(StatementKind::FetchAll, sql, bindings).await
    }

    async fn fetch_scalar(&self, sql: &str, bindings: &[Value]) -> DbResult<Option<Value>> {
        let rows = self.query_rows(StatementKind::FetchScalar, sql, bindings).await?;
        match rows.first() {
            Some(row) => first_value(row),
            None => Ok(None),
        }
    }

    fn primary_key(&self) -> Option<&Ident> {
        self.config.primary_key.as_ref()
    }

    async fn insert_row(&self, table: &Ident, data: &Record, returning: Option<&Ident>) -> DbResult<Value> {
        let built = qb::render_insert(table, data, returning)?;
        if returning.is_none() {
            self.execute_as(StatementKind::Insert, &built.sql, &built.bindings).await?;
            return Ok(Value::Null);
        }
        let rows = self.query_rows(StatementKind::Insert, &built.sql, &built.bindings).await?;
        let row = rows
            .first()
            .ok_or_else(|| DbError::not_found(format!("INSERT INTO {table} returned no row")))?;
        Ok(first_value(row)?.unwrap_or(Value::Null))
    }

    async fn update_rows(&self, table: &Ident, data: &Record, conditions: &Record) -> DbResult<u64> {
        let built = qb::render_update(table, data, conditions)?;
        self.execute_as(StatementKind::Update, &built.sql, &built.bindings).await
    }

    async fn delete_rows(&self, table: &Ident, conditions: &Record) -> DbResult<u64> {
        let built = qb::render_delete(table, conditions)?;
        self.execute_as(StatementKind::Delete, &built.sql, &built.bindings).await
    }
}
