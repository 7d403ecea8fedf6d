//! Error types for `riskdesk-core`.

use thiserror::Error;

use crate::table::TableName;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown table: {0:?}")]
  UnknownTable(String),

  #[error("table {table} is missing column {column:?}")]
  SchemaMismatch { table: TableName, column: String },

  #[error("table {table} has no column named {field:?}")]
  UnknownField { table: TableName, field: String },

  #[error("row {0} is not a data row")]
  InvalidRow(usize),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error so store-generic code can return a single type.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
