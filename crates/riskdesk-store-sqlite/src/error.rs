//! Error type for `riskdesk-store-sqlite`.

use riskdesk_core::table::TableName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("table not found: {0}")]
  TableNotFound(TableName),

  /// Row index 1 is the header and cannot be deleted.
  #[error("cannot delete the header row of {0}")]
  HeaderRow(TableName),

  #[error("table {table} has no row {index}")]
  RowOutOfRange { table: TableName, index: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
