//! Safe SQL identifier handling.
//!
//! [`Ident`] is a table or column name that is safe to splice into SQL text.
//! Identifiers may be dotted (`schema.table`, `table.column`); every segment is
//! validated against [`IDENT_PATTERN`]. Quoting is not supported: a name that
//! would need quoting is rejected instead.
//!
//! # Example
//! ```
//! use pgquery::Ident;
//!
//! let t = Ident::parse("public.users")?;
//! assert_eq!(t.to_sql(), "public.users");
//! assert!(Ident::parse("users; DROP TABLE users").is_err());
//! # Ok::<(), pgquery::DbError>(())
//! ```

use crate::error::{DbError, DbResult};
use std::fmt;

/// Pattern every dot-separated identifier segment must match.
pub const IDENT_PATTERN: &str = "^[A-Za-z_][A-Za-z0-9_]*$";

/// A validated SQL identifier (table, column, or `schema.table`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Parse and validate an identifier.
    ///
    /// The input is split on `.`; each segment must be non-empty and match
    /// [`IDENT_PATTERN`]. Leading, trailing and doubled dots produce empty
    /// segments and are rejected. The error names the full input.
    pub fn parse(s: &str) -> DbResult<Self> {
        let mut parts = Vec::new();
        for segment in s.split('.') {
            if !is_valid_segment(segment) {
                return Err(DbError::invalid_identifier(s));
            }
            parts.push(segment.to_string());
        }
        Ok(Self { parts })
    }

    /// Single-segment identifier from a literal known to be valid.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(is_valid_segment(name));
        Self {
            parts: vec![name.to_string()],
        }
    }

    /// Returns `true` if `s` would parse as an identifier.
    pub fn is_valid(s: &str) -> bool {
        s.split('.').all(is_valid_segment)
    }

    /// The dot-separated segments.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(String::len).sum::<usize>() + self.parts.len() - 1;
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(part);
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl std::str::FromStr for Ident {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        Ident::parse(s)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Validate a raw name, returning the identifier or `InvalidIdentifier`.
pub fn validate_identifier(name: &str) -> DbResult<Ident> {
    Ident::parse(name)
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> DbResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}
