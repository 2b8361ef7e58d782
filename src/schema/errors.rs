use thiserror::Error;

use super::TableKind;

/// A column or criterion name absent from the registry for the table being
/// queried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} \"{key}\" for {table:?}")]
pub struct UnknownKeyError {
    pub what: &'static str,
    pub key: String,
    pub table: TableKind,
}

impl UnknownKeyError {
    pub fn column(table: TableKind, key: impl Into<String>) -> Self {
        UnknownKeyError { what: "column", key: key.into(), table }
    }

    pub fn criterion(table: TableKind, key: impl Into<String>) -> Self {
        UnknownKeyError { what: "criterion", key: key.into(), table }
    }
}
