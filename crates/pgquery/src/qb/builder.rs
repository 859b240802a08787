//! The fluent query builder.

use crate::error::{DbError, DbResult};
use crate::executor::{Executor, Record};
use crate::ident::Ident;
use crate::qb::clause::{Direction, KeyedConditions, Op, OrderSpec, WhereClause};
use crate::qb::select::{BuiltQuery, Columns, QueryState};
use crate::row::FromRow;
use crate::value::Value;

/// First problem found while configuring a builder.
///
/// Configuration methods cannot fail at the type level (they return `&mut Self`
/// for chaining), so the error is parked here and returned by `build()` and
/// by every terminal operation before anything is sent to the executor.
#[derive(Clone, Debug)]
enum BuildError {
    Identifier(String),
    Operator(String),
    MixedStar,
}

impl BuildError {
    fn to_error(&self) -> DbError {
        match self {
            BuildError::Identifier(name) => DbError::invalid_identifier(name.clone()),
            BuildError::Operator(op) => DbError::InvalidOperator(op.clone()),
            BuildError::MixedStar => {
                DbError::validation("`*` cannot be combined with named columns in select()")
            }
        }
    }
}

/// Key column `insert()` reads back.
#[derive(Clone, Debug)]
enum InsertKey {
    /// Whatever the executor reports as its primary key
    Default,
    Column(Ident),
    Nothing,
}

/// Fluent SELECT/INSERT/UPDATE/DELETE builder bound to one table.
///
/// Configuration methods take `&mut self` and return the same builder, so
/// calls chain. Terminal operations take `&self` and render from a snapshot:
/// `first()` and `count()` never change the stored limit or column list, and a
/// builder can serve several terminal calls.
///
/// # Example
/// ```ignore
/// let rows = db
///     .table("posts")?
///     .select(["id", "title"])
///     .where_eq("status", "published")
///     .order_by("created_at", "DESC")
///     .limit(5)
///     .get()
///     .await?;
/// ```
pub struct QueryBuilder<'c, E: Executor> {
    conn: &'c E,
    state: QueryState,
    build_error: Option<BuildError>,
    allow_partial_conditions: bool,
    insert_key: InsertKey,
}

impl<'c, E: Executor> QueryBuilder<'c, E> {
    /// Create a builder for `table`. Fails with `InvalidIdentifier` right away.
    pub fn new(conn: &'c E, table: &str) -> DbResult<Self> {
        let table = Ident::parse(table)?;
        Ok(Self {
            conn,
            state: QueryState::new(table),
            build_error: None,
            allow_partial_conditions: false,
            insert_key: InsertKey::Default,
        })
    }

    fn column(&mut self, name: &str) -> Option<Ident> {
        match Ident::parse(name) {
            Ok(ident) => Some(ident),
            Err(_) => {
                self.build_error
                    .get_or_insert_with(|| BuildError::Identifier(name.to_string()));
                None
            }
        }
    }

    fn push_simple(&mut self, column: &str, op: Op, value: Value) -> &mut Self {
        if let Some(column) = self.column(column) {
            let index = self.state.bindings.bind(value);
            self.state.clauses.push(WhereClause::Simple { column, op, index });
        }
        self
    }

    // ==================== SELECT columns ====================

    /// Replace the selected columns. An empty list or a lone `*` selects all.
    ///
    /// `*` next to named columns poisons the builder with a validation error.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cols = Vec::new();
        let mut all = false;
        let mut named = false;
        for col in columns {
            let col = col.as_ref();
            if col == "*" {
                all = true;
                continue;
            }
            named = true;
            if let Some(ident) = self.column(col) {
                cols.push(ident);
            }
        }
        if all && named {
            self.build_error.get_or_insert(BuildError::MixedStar);
        }
        self.state.columns = if all || cols.is_empty() {
            Columns::All
        } else {
            Columns::List(cols)
        };
        self
    }

    // ==================== WHERE conditions ====================

    /// Add WHERE: column = value
    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Eq, value.into())
    }

    /// Add WHERE: column <op> value, with `op` given as text (`">"`, `"LIKE"`, ...).
    ///
    /// Operators outside the allow-list of [`Op::parse`] poison the builder.
    pub fn where_op(&mut self, column: &str, op: &str, value: impl Into<Value>) -> &mut Self {
        match Op::parse(op) {
            Ok(op) => self.push_simple(column, op, value.into()),
            Err(_) => {
                self.build_error
                    .get_or_insert_with(|| BuildError::Operator(op.to_string()));
                self
            }
        }
    }

    /// Add WHERE: column IN (values...)
    ///
    /// An empty list adds a clause that matches no rows (`1 = $n`, with `0`
    /// bound) instead of rendering an invalid `IN ()`.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let Some(column) = self.column(column) else {
            return self;
        };
        let indices: Vec<usize> = values
            .into_iter()
            .map(|v| self.state.bindings.bind(v))
            .collect();
        let clause = if indices.is_empty() {
            WhereClause::Never {
                column,
                index: self.state.bindings.bind(0),
            }
        } else {
            WhereClause::In { column, indices }
        };
        self.state.clauses.push(clause);
        self
    }

    /// Add WHERE: column IS NULL
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        if let Some(column) = self.column(column) {
            self.state.clauses.push(WhereClause::Null { column, negated: false });
        }
        self
    }

    /// Add WHERE: column IS NOT NULL
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        if let Some(column) = self.column(column) {
            self.state.clauses.push(WhereClause::Null { column, negated: true });
        }
        self
    }

    /// Add WHERE: column = value
    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Eq, value.into())
    }

    /// Add WHERE: column != value
    pub fn ne(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Ne, value.into())
    }

    /// Add WHERE: column > value
    pub fn gt(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Gt, value.into())
    }

    /// Add WHERE: column >= value
    pub fn gte(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Gte, value.into())
    }

    /// Add WHERE: column < value
    pub fn lt(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Lt, value.into())
    }

    /// Add WHERE: column <= value
    pub fn lte(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Lte, value.into())
    }

    /// Add WHERE: column LIKE pattern
    pub fn like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        self.push_simple(column, Op::Like, pattern.into())
    }

    // ==================== Ordering & paging ====================

    /// Append an ORDER BY entry. `"desc"` in any case sorts descending,
    /// anything else ascending.
    pub fn order_by(&mut self, column: &str, direction: impl Into<Direction>) -> &mut Self {
        if let Some(column) = self.column(column) {
            self.state.order.push(OrderSpec {
                column,
                direction: direction.into(),
            });
        }
        self
    }

    /// Append ORDER BY column ASC.
    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.order_by(column, Direction::Asc)
    }

    /// Append ORDER BY column DESC.
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by(column, Direction::Desc)
    }

    /// Set LIMIT (last call wins).
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.state.limit = Some(n);
        self
    }

    /// Set OFFSET (last call wins).
    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.state.offset = Some(n);
        self
    }

    /// Let `update()`/`delete()` proceed when some WHERE clauses are not
    /// equalities. Those clauses are then ignored (and logged at WARN).
    pub fn allow_partial_conditions(&mut self, allow: bool) -> &mut Self {
        self.allow_partial_conditions = allow;
        self
    }

    /// Make `insert()` return `column` instead of the executor's primary key.
    pub fn returning(&mut self, column: &str) -> &mut Self {
        if let Some(column) = self.column(column) {
            self.insert_key = InsertKey::Column(column);
        }
        self
    }

    /// Make `insert()` skip `RETURNING` and yield [`Value::Null`], for tables
    /// without a generated key.
    pub fn no_returning(&mut self) -> &mut Self {
        self.insert_key = InsertKey::Nothing;
        self
    }

    // ==================== Inspection ====================

    pub fn table(&self) -> &Ident {
        &self.state.table
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// WHERE bindings accumulated so far (LIMIT/OFFSET are bound at render time).
    pub fn bindings(&self) -> &[Value] {
        self.state.bindings.values()
    }

    /// Return the first configuration error, if any.
    pub fn validate(&self) -> DbResult<()> {
        match &self.build_error {
            Some(err) => Err(err.to_error()),
            None => Ok(()),
        }
    }

    /// Render the SELECT statement and its bindings without executing it.
    pub fn build(&self) -> DbResult<BuiltQuery> {
        self.validate()?;
        Ok(self.state.render())
    }

    /// Render the SELECT SQL text (for debugging).
    pub fn to_sql(&self) -> DbResult<String> {
        self.build().map(|built| built.sql)
    }

    /// The equality-only condition map used by `update()`/`delete()`.
    pub fn keyed_conditions(&self) -> KeyedConditions {
        KeyedConditions::derive(&self.state.clauses, &self.state.bindings)
    }

    /// Conditions for a keyed write; `None` when no row can match.
    fn write_conditions(&self, verb: &str) -> DbResult<Option<Record>> {
        let keyed = self.keyed_conditions();
        if keyed.unsatisfiable {
            tracing::debug!(
                target: "pgquery.qb",
                table = %self.state.table,
                "{verb} skipped: empty IN list matches no rows"
            );
            return Ok(None);
        }
        if !keyed.is_lossless() {
            if !self.allow_partial_conditions {
                return Err(DbError::UnsupportedCondition(keyed.dropped));
            }
            tracing::warn!(
                target: "pgquery.qb",
                table = %self.state.table,
                dropped = ?keyed.dropped,
                "{verb} ignores non-equality conditions"
            );
        }
        if keyed.conditions.is_empty() {
            return Err(DbError::validation(format!(
                "{verb} requires at least one equality condition"
            )));
        }
        Ok(Some(keyed.conditions))
    }

    // ==================== Execution ====================

    /// Execute the SELECT and return all rows (possibly none).
    pub async fn get(&self) -> DbResult<Vec<E::Row>> {
        let built = self.build()?;
        self.conn.fetch_all(&built.sql, &built.bindings).await
    }

    /// Execute the SELECT with `LIMIT 1` and return the row, if any.
    pub async fn first(&self) -> DbResult<Option<E::Row>> {
        self.validate()?;
        let built = self.state.for_first().render();
        self.conn.fetch_row(&built.sql, &built.bindings).await
    }

    /// Execute `SELECT COUNT(*)` over the current filters.
    ///
    /// A missing or NULL scalar counts as `0`.
    pub async fn count(&self) -> DbResult<i64> {
        self.validate()?;
        let built = self.state.for_count().render();
        let scalar = self.conn.fetch_scalar(&built.sql, &built.bindings).await?;
        Ok(scalar.map_or(0, |v| v.coerce_i64()))
    }

    /// Insert one row into the builder's table and return its generated key.
    ///
    /// The key column is the executor's primary key unless
    /// [`returning`](Self::returning) or [`no_returning`](Self::no_returning)
    /// says otherwise.
    pub async fn insert(&self, data: Record) -> DbResult<Value> {
        self.validate()?;
        let returning = match &self.insert_key {
            InsertKey::Default => self.conn.primary_key(),
            InsertKey::Column(column) => Some(column),
            InsertKey::Nothing => None,
        };
        self.conn
            .insert_row(&self.state.table, &data, returning)
            .await
    }

    /// Update the rows matched by the equality WHERE clauses.
    ///
    /// Fails with [`DbError::UnsupportedCondition`] if other kinds of clause are
    /// present, unless [`allow_partial_conditions`](Self::allow_partial_conditions)
    /// is set. An empty IN list short-circuits to `Ok(0)`.
    pub async fn update(&self, data: Record) -> DbResult<u64> {
        self.validate()?;
        match self.write_conditions("UPDATE")? {
            Some(conditions) => {
                self.conn
                    .update_rows(&self.state.table, &data, &conditions)
                    .await
            }
            None => Ok(0),
        }
    }

    /// Delete the rows matched by the equality WHERE clauses.
    ///
    /// Same condition rules as [`update`](Self::update).
    pub async fn delete(&self) -> DbResult<u64> {
        self.validate()?;
        match self.write_conditions("DELETE")? {
            Some(conditions) => self.conn.delete_rows(&self.state.table, &conditions).await,
            None => Ok(0),
        }
    }
}

impl<E> QueryBuilder<'_, E>
where
    E: Executor<Row = tokio_postgres::Row>,
{
    /// Execute the SELECT and map every row to `T`.
    pub async fn get_as<T: FromRow>(&self) -> DbResult<Vec<T>> {
        let rows = self.get().await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the SELECT with `LIMIT 1` and map the row to `T`, if any.
    pub async fn first_as<T: FromRow>(&self) -> DbResult<Option<T>> {
        let row = self.first().await?;
        row.as_ref().map(T::from_row).transpose()
    }
}
