//! The SQLite implementation of [`RecordStore`], [`SqliteStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use riskdesk_core::{
  store::RecordStore,
  table::{HEADER_OFFSET, Table, TableName},
};

use crate::{
  Error, Result,
  encode::{decode_cells, encode_cells},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The stored header row of `table`, or `None` if the table does not
  /// exist.
  async fn stored_headers(&self, table: TableName) -> Result<Option<Vec<String>>> {
    let name = table.as_str();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT headers FROM sheets WHERE name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    raw.as_deref().map(decode_cells).transpose()
  }

  async fn require_headers(&self, table: TableName) -> Result<Vec<String>> {
    self
      .stored_headers(table)
      .await?
      .ok_or(Error::TableNotFound(table))
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn create_table(
    &self,
    table:   TableName,
    headers: Vec<String>,
  ) -> Result<Vec<String>> {
    let name    = table.as_str();
    let encoded = encode_cells(&headers)?;

    let created = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO sheets (name, headers) VALUES (?1, ?2)",
          rusqlite::params![name, encoded],
        )?)
      })
      .await?;

    if created > 0 {
      tracing::info!(%table, "created table");
    }
    self.require_headers(table).await
  }

  async fn read_table(&self, table: TableName) -> Result<Table> {
    let headers = self.require_headers(table).await?;
    let name    = table.as_str();

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT cells FROM sheet_rows WHERE sheet = ?1 ORDER BY row_id")?;
        let rows = stmt
          .query_map(rusqlite::params![name], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    let rows = raws
      .iter()
      .map(|raw| decode_cells(raw))
      .collect::<Result<Vec<_>>>()?;

    Ok(Table { headers, rows })
  }

  async fn append_row(&self, table: TableName, cells: Vec<String>) -> Result<()> {
    self.append_rows(table, vec![cells]).await
  }

  async fn append_rows(&self, table: TableName, rows: Vec<Vec<String>>) -> Result<()> {
    self.require_headers(table).await?;
    let name    = table.as_str();
    let encoded = rows
      .iter()
      .map(|cells| encode_cells(cells))
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt =
            tx.prepare("INSERT INTO sheet_rows (sheet, cells) VALUES (?1, ?2)")?;
          for cells in &encoded {
            stmt.execute(rusqlite::params![name, cells])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_row(&self, table: TableName, index: usize) -> Result<()> {
    if index == HEADER_OFFSET {
      return Err(Error::HeaderRow(table));
    }
    if index < HEADER_OFFSET {
      return Err(Error::RowOutOfRange { table, index });
    }
    self.require_headers(table).await?;

    let name   = table.as_str();
    let offset = (index - HEADER_OFFSET - 1) as i64;

    let deleted: bool = self
      .conn
      .call(move |conn| {
        let row_id: Option<i64> = conn
          .query_row(
            "SELECT row_id FROM sheet_rows WHERE sheet = ?1
             ORDER BY row_id LIMIT 1 OFFSET ?2",
            rusqlite::params![name, offset],
            |row| row.get(0),
          )
          .optional()?;

        match row_id {
          Some(id) => {
            conn.execute(
              "DELETE FROM sheet_rows WHERE row_id = ?1",
              rusqlite::params![id],
            )?;
            Ok(true)
          }
          None => Ok(false),
        }
      })
      .await?;

    if !deleted {
      return Err(Error::RowOutOfRange { table, index });
    }
    Ok(())
  }

  async fn truncate(&self, table: TableName) -> Result<()> {
    self.require_headers(table).await?;
    let name = table.as_str();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sheet_rows WHERE sheet = ?1",
          rusqlite::params![name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
