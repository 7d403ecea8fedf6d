//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `riskdesk-store-sqlite`). The API server and the batch job depend on this
//! abstraction, not on any concrete backend.
//!
//! The store offers no transactions. Concurrent appends, deletes and
//! regeneration batches against the same table may interleave; a delete
//! racing a regeneration can lose or duplicate rows.

use std::future::Future;

use crate::{
  Error, Result,
  record::{TableRecord, read_records},
  table::{Table, TableName},
};

/// Abstraction over a store of named tables, each a header row followed by
/// ordered data rows of strings.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create `table` with the given header row. If it already exists the
  /// stored header is left untouched and returned.
  fn create_table(
    &self,
    table: TableName,
    headers: Vec<String>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Read the header row and every data row, in store order.
  fn read_table(
    &self,
    table: TableName,
  ) -> impl Future<Output = Result<Table, Self::Error>> + Send + '_;

  /// Append one row after the last data row.
  fn append_row(
    &self,
    table: TableName,
    cells: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append rows in order after the last data row.
  fn append_rows(
    &self,
    table: TableName,
    rows: Vec<Vec<String>>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete the row at 1-based store index `index`, where index 1 is the
  /// header. Deleting the header or an index past the end is an error.
  fn delete_row(
    &self,
    table: TableName,
    index: usize,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove every data row, keeping the header.
  fn truncate(
    &self,
    table: TableName,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Read `R::TABLE` and decode every row as `R`.
pub async fn load_records<S, R>(store: &S) -> Result<Vec<R>>
where
  S: RecordStore,
  R: TableRecord,
{
  let table = store.read_table(R::TABLE).await.map_err(Error::store)?;
  read_records(&table)
}

/// Create `R::TABLE` with its schema header if it is missing, and check that
/// an existing header still carries every schema column.
pub async fn ensure_table<S, R>(store: &S) -> Result<()>
where
  S: RecordStore,
  R: TableRecord,
{
  let headers = R::HEADERS.iter().map(|h| (*h).to_owned()).collect();
  let stored = store
    .create_table(R::TABLE, headers)
    .await
    .map_err(Error::store)?;
  let table = Table {
    headers: stored,
    rows:    Vec::new(),
  };
  table.require_columns(R::TABLE, R::HEADERS)?;
  Ok(())
}
