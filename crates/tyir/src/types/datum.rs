//! Raw data model seen by type predicates and canonicalization

use std::collections::BTreeMap;

use serde::Serialize;

/// Externally supplied raw data, before any type has vetted it.
///
/// Serializes structurally (untagged), so a canonical rendering of a datum
/// looks like the data itself: `Int(4)` becomes `4`, `Seq` becomes an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datum {
    /// Absent, undefined-like payload.
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Datum>),
    Map(BTreeMap<String, Datum>),
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
