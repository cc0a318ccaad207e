// crates/ckan-core/src/persistence.rs
//
// Generic row abstraction at the persistence gateway boundary.
//
// The gateway is generic over statement shape: rows come back as
// column-name -> value maps and each call site maps them into its own
// typed domain immediately.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A positional statement parameter or a column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            SqlValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One result row: column name -> value.
pub type Row = BTreeMap<String, SqlValue>;

/// Rows in result order. Empty for writes.
pub type RowSet = Vec<Row>;

/// Discriminator selecting read or write execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    Read,
    Write,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_conversion_maps_none_to_null() {
        let none: Option<String> = None;
        assert!(SqlValue::from(none).is_null());
        assert_eq!(
            SqlValue::from(Some("a")).as_text(),
            Some("a")
        );
    }

    #[test]
    fn accessors_are_type_strict() {
        assert_eq!(SqlValue::Integer(7).as_i64(), Some(7));
        assert_eq!(SqlValue::Text("7".to_string()).as_i64(), None);
        assert_eq!(SqlValue::Real(1.5).as_text(), None);
    }
}
