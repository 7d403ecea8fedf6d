//! Handler for `GET /dashboard`.

use axum::{Json, extract::State};
use riskdesk_core::{
  aggregate::load_composite_view,
  engine::CompletionService,
  store::RecordStore,
  summary::{DashboardSummary, summarize},
  table::TableName,
};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct DashboardBody {
  #[serde(flatten)]
  pub summary: DashboardSummary,
  /// Every browsable table, for navigation.
  pub tables:  Vec<TableName>,
}

/// `GET /dashboard`: top-10 ranking plus per-tier counts.
pub async fn handler<S, C>(
  State(state): State<ApiState<S, C>>,
) -> Result<Json<DashboardBody>, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  let view = load_composite_view(state.store.as_ref()).await?;
  Ok(Json(DashboardBody {
    summary: summarize(&view),
    tables:  TableName::ALL.to_vec(),
  }))
}
