//! Handlers for `/tables` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tables` | The fixed table-name list |
//! | `GET`    | `/tables/{name}` | Header row plus every data row |
//! | `POST`   | `/tables/{name}` | Body: `{"<header>": "<value>", ...}`; returns 201 + the stored row |
//! | `DELETE` | `/tables/{name}/rows/{row}` | `row` is the 1-based data-row position |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Local;
use riskdesk_core::{
  engine::CompletionService,
  store::RecordStore,
  table::{TableName, build_row, store_row_index},
};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /tables`
pub async fn list() -> Json<Vec<TableName>> { Json(TableName::ALL.to_vec()) }

// ─── Read ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TableBody {
  pub table:   TableName,
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

/// `GET /tables/{name}`
pub async fn read<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(name): Path<String>,
) -> Result<Json<TableBody>, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  let table = TableName::parse(&name)?;
  let contents = state
    .store
    .read_table(table)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(TableBody {
    table,
    headers: contents.headers,
    rows: contents.rows,
  }))
}

// ─── Add ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AddedRow {
  pub table: TableName,
  pub row:   Vec<String>,
}

/// `POST /tables/{name}`: maps each stored header to the submitted field.
pub async fn add<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(name): Path<String>,
  Json(fields): Json<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  let table = TableName::parse(&name)?;
  let headers = state
    .store
    .read_table(table)
    .await
    .map_err(ApiError::store)?
    .headers;

  let row = build_row(table, &headers, &fields, Local::now().naive_local())?;
  state
    .store
    .append_row(table, row.clone())
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%table, "row added");
  Ok((StatusCode::CREATED, Json(AddedRow { table, row })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /tables/{name}/rows/{row}`
pub async fn delete_row<S, C>(
  State(state): State<ApiState<S, C>>,
  Path((name, row)): Path<(String, usize)>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  let table = TableName::parse(&name)?;
  let index = store_row_index(row)?;

  let len = state
    .store
    .read_table(table)
    .await
    .map_err(ApiError::store)?
    .rows
    .len();
  if row > len {
    return Err(ApiError::NotFound(format!("{table} has no row {row}")));
  }

  state
    .store
    .delete_row(table, index)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%table, row, "row deleted");
  Ok(StatusCode::NO_CONTENT)
}
