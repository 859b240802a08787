//! The binding list: ordered values behind positional placeholders.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// An append-only list of bound values.
///
/// Every literal that ends up in rendered SQL goes through [`Bindings::bind`];
/// the returned zero-based index `i` is rendered as the placeholder `$i+1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: Vec<Value>,
}

impl Bindings {
    /// Create a new empty binding list.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value and return its zero-based index.
    pub fn bind(&mut self, value: impl Into<Value>) -> usize {
        self.values.push(value.into());
        self.values.len() - 1
    }

    /// Get the value bound at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get the current binding count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Get all values as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        as_refs(&self.values)
    }
}

/// Borrow a value slice as tokio-postgres parameters.
pub fn as_refs(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

pub(crate) fn push_placeholder(out: &mut String, index: usize) {
    use std::fmt::Write;
    let _ = write!(out, "${}", index + 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_returns_zero_based_positions() {
        let mut b = Bindings::new();
        assert_eq!(b.bind("a"), 0);
        assert_eq!(b.bind(2), 1);
        assert_eq!(b.bind(None::<i32>), 2);
        assert_eq!(b.len(), 3);
        assert_eq!(b.get(1), Some(&Value::Int(2)));
        assert_eq!(b.values()[2], Value::Null);
    }

    #[test]
    fn placeholders_are_one_based() {
        let mut s = String::from("x = ");
        push_placeholder(&mut s, 0);
        assert_eq!(s, "x = $1");
        s.push_str(", ");
        push_placeholder(&mut s, 9);
        assert_eq!(s, "x = $1, $10");
    }

    #[test]
    fn refs_match_length() {
        let mut b = Bindings::new();
        b.bind(1);
        b.bind("two");
        assert_eq!(b.as_refs().len(), 2);
    }
}
