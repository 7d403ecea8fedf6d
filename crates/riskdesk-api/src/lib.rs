//! JSON HTTP API for the student risk platform.
//!
//! Exposes an axum [`Router`] backed by any
//! [`riskdesk_core::store::RecordStore`] and
//! [`riskdesk_core::engine::CompletionService`]. Every request reads the
//! tables it needs afresh; nothing is cached between requests.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Redirects to `/dashboard` |
//! | `GET`  | `/dashboard` | Top-10 ranking and tier counts |
//! | `*`    | `/tables...` | See [`tables`] |
//! | `GET`  | `/ask` | `?q=<question>` |
//! | `POST` | `/ask` | Body: `{"question":"..."}` |

pub mod ask;
pub mod dashboard;
pub mod error;
pub mod tables;

use std::sync::Arc;

use axum::{
  Router,
  response::Redirect,
  routing::{delete, get},
};
use riskdesk_core::{
  engine::{CompletionService, GroundedQueryEngine},
  store::RecordStore,
};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S, C> {
  pub store:  Arc<S>,
  pub engine: Arc<GroundedQueryEngine<C>>,
}

impl<S, C> Clone for ApiState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      engine: Arc::clone(&self.engine),
    }
  }
}

impl<S, C: CompletionService> ApiState<S, C> {
  pub fn new(store: S, completion: C) -> Self {
    Self {
      store:  Arc::new(store),
      engine: Arc::new(GroundedQueryEngine::new(completion)),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: ApiState<S, C>) -> Router<()>
where
  S: RecordStore + 'static,
  C: CompletionService + 'static,
{
  Router::new()
    .route("/", get(|| async { Redirect::to("/dashboard") }))
    .route("/dashboard", get(dashboard::handler::<S, C>))
    // Tables
    .route("/tables", get(tables::list))
    .route("/tables/{name}", get(tables::read::<S, C>).post(tables::add::<S, C>))
    .route("/tables/{name}/rows/{row}", delete(tables::delete_row::<S, C>))
    // Questions
    .route("/ask", get(ask::query::<S, C>).post(ask::body::<S, C>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use riskdesk_core::{
    engine::{GROUNDED_INSTRUCTION, NO_DATA_ANSWER, OPEN_INSTRUCTION},
    record::{CategoryRiskRecord, StudentRecord, TableRecord},
    store::ensure_table,
    table::TableName,
  };
  use riskdesk_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;
  use crate::ask::EMPTY_QUESTION_ANSWER;

  #[derive(Debug, thiserror::Error)]
  #[error("model offline")]
  struct Offline;

  #[derive(Default)]
  struct FakeCompletion {
    calls:   AtomicUsize,
    prompts: Mutex<Vec<String>>,
    offline: bool,
  }

  impl CompletionService for FakeCompletion {
    type Error = Offline;

    async fn complete(&self, prompt: &str) -> Result<String, Offline> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.prompts.lock().unwrap().push(prompt.to_owned());
      if self.offline { Err(Offline) } else { Ok("model says hello".into()) }
    }
  }

  type TestState = ApiState<SqliteStore, FakeCompletion>;

  async fn make_state(completion: FakeCompletion) -> TestState {
    let store = SqliteStore::open_in_memory().await.unwrap();
    ensure_table::<_, StudentRecord>(&store).await.unwrap();
    ensure_table::<_, CategoryRiskRecord>(&store).await.unwrap();
    ApiState::new(store, completion)
  }

  async fn add_student(state: &TestState, id: &str, name: &str, scores: Option<[u32; 6]>) {
    let student = StudentRecord {
      student_id: id.into(),
      name:       name.into(),
      grade:      "12".into(),
      school:     "Riverside".into(),
    };
    state
      .store
      .append_row(TableName::StudentMaster, student.to_cells())
      .await
      .unwrap();
    if let Some(scores) = scores {
      let risk = CategoryRiskRecord::from_scores(id, &scores, "2024-05-05 10:00:00");
      state
        .store
        .append_row(TableName::AiRiskScore, risk.to_cells())
        .await
        .unwrap();
    }
  }

  async fn send(state: TestState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state)
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  // ── Root / dashboard ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn root_redirects_to_dashboard() {
    let state = make_state(FakeCompletion::default()).await;
    let resp = api_router(state)
      .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/dashboard");
  }

  #[tokio::test]
  async fn dashboard_ranks_and_counts() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "1", "Ana", Some([90; 6])).await;
    add_student(&state, "2", "Ben", Some([60; 6])).await;
    add_student(&state, "3", "Cai", Some([40; 6])).await;
    add_student(&state, "4", "Dev", None).await;

    let (status, body) = send(state, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["high"], 1);
    assert_eq!(body["medium"], 1);
    assert_eq!(body["low"], 1);
    let names: Vec<&str> = body["top"]
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["name"].as_str().unwrap())
      .collect();
    assert_eq!(names, vec!["Ana", "Ben", "Cai"]);
    assert_eq!(body["tables"].as_array().unwrap().len(), 11);
    assert_eq!(body["tables"][0], "student_master");
  }

  // ── Tables ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn read_table_returns_headers_and_rows() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "1", "Ana", None).await;

    let (status, body) = send(state, "GET", "/tables/student_master", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["headers"], json!(["student_id", "name", "grade", "school"]));
    assert_eq!(body["rows"], json!([["1", "Ana", "12", "Riverside"]]));
  }

  #[tokio::test]
  async fn unknown_table_is_404() {
    let state = make_state(FakeCompletion::default()).await;
    let (status, body) = send(state, "GET", "/tables/grades", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("grades"));
  }

  #[tokio::test]
  async fn missing_store_table_is_500() {
    let state = make_state(FakeCompletion::default()).await;
    let (status, _) = send(state, "GET", "/tables/risk_rules", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[tokio::test]
  async fn add_row_maps_headers_and_stamps_time() {
    let state = make_state(FakeCompletion::default()).await;
    let store = Arc::clone(&state.store);

    let (status, body) = send(
      state,
      "POST",
      "/tables/ai_risk_score",
      Some(json!({ "student_id": "8", "risk_category": "LOW" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let row = body["row"].as_array().unwrap();
    assert_eq!(row.len(), CategoryRiskRecord::HEADERS.len());
    assert_eq!(row[0], "8");
    assert_eq!(row[1], "");
    assert_eq!(row[8], "LOW");
    let stamp = row[9].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());

    let table = store.read_table(TableName::AiRiskScore).await.unwrap();
    assert_eq!(table.rows.len(), 1);
  }

  #[tokio::test]
  async fn add_row_with_unknown_field_is_400() {
    let state = make_state(FakeCompletion::default()).await;
    let (status, _) = send(
      state,
      "POST",
      "/tables/student_master",
      Some(json!({ "student_id": "1", "nickname": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn delete_uses_visible_row_position() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "1", "Ana", None).await;
    add_student(&state, "2", "Ben", None).await;
    let store = Arc::clone(&state.store);

    let (status, _) = send(state.clone(), "DELETE", "/tables/student_master/rows/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let table = store.read_table(TableName::StudentMaster).await.unwrap();
    assert_eq!(table.rows, vec![vec!["2", "Ben", "12", "Riverside"]]);

    let (status, _) = send(state.clone(), "DELETE", "/tables/student_master/rows/0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(state, "DELETE", "/tables/student_master/rows/5", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Ask ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn blank_question_skips_store_and_model() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "1", "Ana", Some([70; 6])).await;
    let engine = Arc::clone(&state.engine);

    let (_, body) = send(state.clone(), "GET", "/ask?q=%20%20", None).await;
    assert_eq!(body["answer"], EMPTY_QUESTION_ANSWER);

    let (_, body) = send(state.clone(), "POST", "/ask", Some(json!({ "question": "" }))).await;
    assert_eq!(body["answer"], EMPTY_QUESTION_ANSWER);

    let (_, body) = send(state, "GET", "/ask", None).await;
    assert_eq!(body["answer"], EMPTY_QUESTION_ANSWER);

    assert_eq!(engine.completion().calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn malformed_post_body_reads_as_blank() {
    let state = make_state(FakeCompletion::default()).await;
    let resp = api_router(state)
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/ask")
          .body(Body::from("{not json"))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["answer"], EMPTY_QUESTION_ANSWER);
  }

  #[tokio::test]
  async fn no_joined_rows_answers_without_model() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "1", "Ana", None).await;
    let engine = Arc::clone(&state.engine);

    let (_, body) = send(state, "GET", "/ask?q=riskai%20who%20is%20high", None).await;
    assert_eq!(body["answer"], NO_DATA_ANSWER);
    assert_eq!(engine.completion().calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn triggered_question_is_grounded_and_stripped() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "5", "Eli", Some([80; 6])).await;
    let engine = Arc::clone(&state.engine);

    let (status, body) = send(
      state,
      "POST",
      "/ask",
      Some(json!({ "question": "  RiskAI how is student 5 doing?  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "model says hello");

    let prompts = engine.completion().prompts.lock().unwrap();
    assert!(prompts[0].starts_with(GROUNDED_INSTRUCTION));
    assert!(prompts[0].contains("5,Eli,12,Riverside,HIGH,80,80,80,80,80,80,80"));
    assert!(prompts[0].ends_with("Question: how is student 5 doing?\n"));
  }

  #[tokio::test]
  async fn untriggered_question_is_open() {
    let state = make_state(FakeCompletion::default()).await;
    add_student(&state, "5", "Eli", Some([80; 6])).await;
    let engine = Arc::clone(&state.engine);

    send(state, "GET", "/ask?q=tell%20me%20a%20joke", None).await;

    let prompts = engine.completion().prompts.lock().unwrap();
    assert!(prompts[0].starts_with(OPEN_INSTRUCTION));
    assert!(prompts[0].ends_with("Question: tell me a joke\n"));
  }

  #[tokio::test]
  async fn model_failure_is_an_answer_not_an_error() {
    let state = make_state(FakeCompletion {
      offline: true,
      ..Default::default()
    })
    .await;
    add_student(&state, "5", "Eli", Some([80; 6])).await;

    let (status, body) = send(state, "GET", "/ask?q=chatbot%20status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "AI error: model offline");
  }
}
