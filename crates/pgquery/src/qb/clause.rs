//! WHERE / ORDER BY building blocks.
//!
//! Clauses never hold values directly: they refer to positions in the
//! builder's [`Bindings`], so the placeholder numbers are fixed at the moment
//! a value is bound and rendering is a pure read.

use crate::error::{DbError, DbResult};
use crate::executor::Record;
use crate::ident::Ident;
use crate::qb::param::{Bindings, push_placeholder};
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operator allowed in a simple WHERE clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=` (also parsed from `<>`)
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `ILIKE`
    ILike,
    /// `NOT ILIKE`
    NotILike,
}

impl Op {
    /// The operator as it appears in SQL.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
        }
    }

    /// Parse an operator from text.
    ///
    /// Matching ignores case and surrounding whitespace; runs of inner
    /// whitespace (`NOT   LIKE`) are collapsed. Anything outside the
    /// allow-list is rejected with [`DbError::InvalidOperator`].
    pub fn parse(s: &str) -> DbResult<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let op = match normalized.as_str() {
            "=" => Op::Eq,
            "!=" | "<>" => Op::Ne,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "LIKE" => Op::Like,
            "NOT LIKE" => Op::NotLike,
            "ILIKE" => Op::ILike,
            "NOT ILIKE" => Op::NotILike,
            _ => return Err(DbError::InvalidOperator(s.to_string())),
        };
        Ok(op)
    }
}

impl FromStr for Op {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        Op::parse(s)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction for ORDER BY.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// `DESC` (any case) is descending; everything else is ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl From<&str> for Direction {
    fn from(s: &str) -> Self {
        Direction::parse(s)
    }
}

/// One ORDER BY entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSpec {
    pub column: Ident,
    pub direction: Direction,
}

impl OrderSpec {
    pub(crate) fn write_sql(&self, out: &mut String) {
        self.column.write_sql(out);
        out.push(' ');
        out.push_str(self.direction.as_sql());
    }
}

/// A single WHERE condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WhereClause {
    /// `column op $n`
    Simple { column: Ident, op: Op, index: usize },
    /// `column IN ($n, $m, ...)`, never empty
    In { column: Ident, indices: Vec<usize> },
    /// Lowering of an empty IN list: `1 = $n` with a `0` bound, matches no rows.
    Never { column: Ident, index: usize },
    /// `column IS NULL` / `column IS NOT NULL`
    Null { column: Ident, negated: bool },
}

impl WhereClause {
    /// Render this clause on its own (diagnostics).
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        match self {
            WhereClause::Simple { column, op, index } => {
                column.write_sql(out);
                out.push(' ');
                out.push_str(op.as_sql());
                out.push(' ');
                push_placeholder(out, *index);
            }
            WhereClause::In { column, indices } => {
                column.write_sql(out);
                out.push_str(" IN (");
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    push_placeholder(out, *index);
                }
                out.push(')');
            }
            WhereClause::Never { index, .. } => {
                out.push_str("1 = ");
                push_placeholder(out, *index);
            }
            WhereClause::Null { column, negated } => {
                column.write_sql(out);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
        }
    }
}

/// Write `clauses` joined by ` AND `, in insertion order.
pub(crate) fn write_where(out: &mut String, clauses: &[WhereClause]) {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            out.push_str(" AND ");
        }
        clause.write_sql(out);
    }
}

/// The equality-only view of a WHERE list, as required by keyed update/delete.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyedConditions {
    /// `column -> value` for every `=` clause (and `IS NULL` as `column -> NULL`).
    pub conditions: Record,
    /// Rendered form of the clauses that could not be expressed.
    pub dropped: Vec<String>,
    /// An empty IN list was present: no row can match.
    pub unsatisfiable: bool,
}

impl KeyedConditions {
    /// Derive the keyed view from a clause list.
    ///
    /// Later clauses on the same column overwrite earlier ones.
    pub fn derive(clauses: &[WhereClause], bindings: &Bindings) -> Self {
        let mut keyed = KeyedConditions::default();
        for clause in clauses {
            match clause {
                WhereClause::Simple { column, op: Op::Eq, index } => {
                    let value = bindings.get(*index).cloned().unwrap_or(Value::Null);
                    keyed.conditions.insert(column.to_sql(), value);
                }
                WhereClause::Null { column, negated: false } => {
                    keyed.conditions.insert(column.to_sql(), Value::Null);
                }
                WhereClause::Never { .. } => keyed.unsatisfiable = true,
                other => keyed.dropped.push(other.to_sql()),
            }
        }
        keyed
    }

    /// `true` when every clause made it into the map.
    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty()
    }
}
