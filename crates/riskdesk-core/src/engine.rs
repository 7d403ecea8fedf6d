//! Dataset-grounded question answering.
//!
//! The engine serialises the composite view into a comma-delimited block,
//! wraps it in a mode-specific instruction prompt and hands the prompt to a
//! [`CompletionService`]. It never returns an error: an empty dataset and a
//! failed completion both become answer text.

use std::future::Future;

use crate::{
  aggregate::CompositeRiskView,
  router::{QueryMode, QueryRouter},
};

/// Column line placed above the serialised rows.
pub const DATASET_HEADER: &str = "student_id,name,grade,school,risk,overall,attendance,academic,financial,behavior,engagement,wellbeing";

pub const NO_DATA_ANSWER: &str = "No student risk data found in the record store.";

/// Prefix of the answer returned when the completion call fails.
pub const ERROR_MARKER: &str = "AI error: ";

pub const GROUNDED_INSTRUCTION: &str = "You are StudentRisk AI. You must answer ONLY from the dataset. Do not hallucinate.";

pub const OPEN_INSTRUCTION: &str = "You are a helpful assistant.";

// ─── Completion service ──────────────────────────────────────────────────────

/// A single prompt-in, text-out language-model call.
///
/// Implementations send the prompt as one user-role message. No retry or
/// deadline is applied by callers.
pub trait CompletionService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn complete<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

// ─── Query context ───────────────────────────────────────────────────────────

/// Everything needed to answer one question. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
  pub raw_question: String,
  /// The question after trigger stripping.
  pub question:     String,
  pub mode:         QueryMode,
  /// Serialised rows, without the column header line.
  pub dataset_text: String,
}

impl QueryContext {
  /// Route `raw_question` and serialise `view`.
  pub fn build(
    router: &QueryRouter,
    raw_question: &str,
    view: &[CompositeRiskView],
  ) -> Self {
    let routed = router.route(raw_question);
    Self {
      raw_question: raw_question.to_owned(),
      question:     routed.question,
      mode:         routed.mode,
      dataset_text: serialize_dataset(view),
    }
  }

  pub fn instruction(&self) -> &'static str {
    match self.mode {
      QueryMode::Grounded => GROUNDED_INSTRUCTION,
      QueryMode::Open => OPEN_INSTRUCTION,
    }
  }

  /// The full prompt text sent to the completion service.
  pub fn prompt(&self) -> String {
    format!(
      "{}\n\n{DATASET_HEADER}\n{}\n\nQuestion: {}\n",
      self.instruction(),
      self.dataset_text,
      self.question
    )
  }
}

/// One line per composite entry, in view order, newline-joined.
pub fn serialize_dataset(view: &[CompositeRiskView]) -> String {
  view
    .iter()
    .map(|v| {
      let (s, r) = (&v.student, &v.risk);
      let cells: [&str; 12] = [
        &s.student_id,
        &s.name,
        &s.grade,
        &s.school,
        &r.risk_category,
        &r.overall_risk_score,
        &r.attendance_score,
        &r.academic_score,
        &r.financial_score,
        &r.behavior_score,
        &r.engagement_score,
        &r.wellbeing_score,
      ];
      cells.join(",")
    })
    .collect::<Vec<_>>()
    .join("\n")
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct GroundedQueryEngine<C> {
  completion: C,
  router:     QueryRouter,
}

impl<C: CompletionService> GroundedQueryEngine<C> {
  pub fn new(completion: C) -> Self {
    Self {
      completion,
      router: QueryRouter::default(),
    }
  }

  pub fn with_router(completion: C, router: QueryRouter) -> Self {
    Self { completion, router }
  }

  pub fn router(&self) -> &QueryRouter { &self.router }

  pub fn completion(&self) -> &C { &self.completion }

  /// Answer `question` in `mode` against `view`.
  pub async fn answer(
    &self,
    question: &str,
    view: &[CompositeRiskView],
    mode: QueryMode,
  ) -> String {
    let ctx = QueryContext {
      raw_question: question.to_owned(),
      question: question.to_owned(),
      mode,
      dataset_text: serialize_dataset(view),
    };
    self.answer_context(&ctx).await
  }

  /// Route `raw_question` through the trigger rules, then answer it.
  pub async fn ask(&self, raw_question: &str, view: &[CompositeRiskView]) -> String {
    let ctx = QueryContext::build(&self.router, raw_question, view);
    self.answer_context(&ctx).await
  }

  pub async fn answer_context(&self, ctx: &QueryContext) -> String {
    if ctx.dataset_text.is_empty() {
      return NO_DATA_ANSWER.to_owned();
    }

    let prompt = ctx.prompt();
    tracing::debug!(mode = ?ctx.mode, prompt_bytes = prompt.len(), "requesting completion");

    match self.completion.complete(&prompt).await {
      Ok(text) => text,
      Err(e) => {
        tracing::warn!(error = %e, "completion failed");
        format!("{ERROR_MARKER}{e}")
      }
    }
  }
}
