//! SELECT state and rendering.

use crate::ident::Ident;
use crate::qb::clause::{OrderSpec, WhereClause, write_where};
use crate::qb::param::{Bindings, push_placeholder};
use crate::value::Value;

/// What the SELECT list renders as.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    /// An explicit column list.
    List(Vec<Ident>),
    /// `COUNT(*)`
    Count,
}

/// SQL text plus the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, bindings: Vec<Value>) -> Self {
        Self { sql, bindings }
    }
}

/// Accumulated SELECT intent.
///
/// WHERE values are bound as clauses are added; LIMIT/OFFSET values are bound
/// only while rendering, into a copy of the binding list, so rendering twice
/// yields the same output and never grows the stored bindings.
#[derive(Clone, Debug)]
pub struct QueryState {
    pub(crate) table: Ident,
    pub(crate) columns: Columns,
    pub(crate) clauses: Vec<WhereClause>,
    pub(crate) order: Vec<OrderSpec>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) bindings: Bindings,
}

impl QueryState {
    /// Create the initial state: `SELECT * FROM table`.
    pub fn new(table: Ident) -> Self {
        Self {
            table,
            columns: Columns::All,
            clauses: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            bindings: Bindings::new(),
        }
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn clauses(&self) -> &[WhereClause] {
        &self.clauses
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Snapshot used by `first()`: same state with `LIMIT 1`.
    pub(crate) fn for_first(&self) -> Self {
        let mut snapshot = self.clone();
        snapshot.limit = Some(1);
        snapshot
    }

    /// Snapshot used by `count()`: `COUNT(*)` with ordering and paging removed.
    pub(crate) fn for_count(&self) -> Self {
        let mut snapshot = self.clone();
        snapshot.columns = Columns::Count;
        snapshot.order.clear();
        snapshot.limit = None;
        snapshot.offset = None;
        snapshot
    }

    /// Render `SELECT ... FROM ... [WHERE] [ORDER BY] [LIMIT] [OFFSET]`.
    pub fn render(&self) -> BuiltQuery {
        let mut bindings = self.bindings.clone();
        let mut sql = String::with_capacity(64);

        sql.push_str("SELECT ");
        match &self.columns {
            Columns::All => sql.push('*'),
            Columns::Count => sql.push_str("COUNT(*)"),
            Columns::List(cols) => {
                for (i, col) in cols.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    col.write_sql(&mut sql);
                }
            }
        }
        sql.push_str(" FROM ");
        self.table.write_sql(&mut sql);

        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            write_where(&mut sql, &self.clauses);
        }

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, spec) in self.order.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                spec.write_sql(&mut sql);
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            push_placeholder(&mut sql, bindings.bind(limit));
        }

        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ");
            push_placeholder(&mut sql, bindings.bind(offset));
        }

        BuiltQuery::new(sql, bindings.into_values())
    }
}
