//! Handlers for `/ask`.
//!
//! The question arrives as `?q=` on `GET` or as `{"question": "..."}` on
//! `POST`. A body that is not valid JSON is treated as an empty question.

use axum::{
  Json,
  body::Bytes,
  extract::{Query, State},
};
use riskdesk_core::{
  aggregate::load_composite_view,
  engine::CompletionService,
  store::RecordStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

/// Answer given to an empty or whitespace-only question.
pub const EMPTY_QUESTION_ANSWER: &str = "Please ask a question.";

#[derive(Debug, Deserialize, Default)]
pub struct AskParams {
  #[serde(default)]
  pub q: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct AskBody {
  #[serde(default)]
  pub question: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
  pub answer: String,
}

/// `GET /ask?q=...`
pub async fn query<S, C>(
  State(state): State<ApiState<S, C>>,
  Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  answer(&state, &params.q).await
}

/// `POST /ask`, body: `{"question":"..."}`
pub async fn body<S, C>(
  State(state): State<ApiState<S, C>>,
  body: Bytes,
) -> Result<Json<AskResponse>, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  let parsed: AskBody = serde_json::from_slice(&body).unwrap_or_default();
  answer(&state, &parsed.question).await
}

async fn answer<S, C>(
  state: &ApiState<S, C>,
  raw: &str,
) -> Result<Json<AskResponse>, ApiError>
where
  S: RecordStore,
  C: CompletionService,
{
  let question = raw.trim();
  if question.is_empty() {
    return Ok(Json(AskResponse {
      answer: EMPTY_QUESTION_ANSWER.to_owned(),
    }));
  }

  let view = load_composite_view(state.store.as_ref()).await?;
  let answer = state.engine.ask(question, &view).await;
  Ok(Json(AskResponse { answer }))
}
