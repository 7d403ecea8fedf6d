//! Batch regeneration of the `ai_risk_score` table.
//!
//! Regeneration is destructive: the table is truncated to its header and
//! rewritten with one row per student, each cell placed under its column in
//! the stored header. The truncate and the append are separate store calls,
//! so a failure between them leaves the table cleared or partially filled.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use rand::Rng;

use crate::{
  Error, Result,
  record::{CategoryRiskRecord, CategoryScores, StudentRecord, TableRecord, layout_rows},
  store::{RecordStore, load_records},
  table::format_timestamp,
};

/// Lowest score a category can be assigned.
pub const SCORE_MIN: u32 = 40;
/// Highest score a category can be assigned.
pub const SCORE_MAX: u32 = 100;

// ─── Score sources ───────────────────────────────────────────────────────────

/// Supplies category scores for regeneration.
pub trait ScoreSource {
  /// Draw one category score in `SCORE_MIN..=SCORE_MAX`.
  fn draw(&mut self) -> u32;
}

/// Uniform draws from any [`rand::Rng`].
#[derive(Debug)]
pub struct RandomScores<R>(pub R);

impl<R: Rng> ScoreSource for RandomScores<R> {
  fn draw(&mut self) -> u32 { self.0.gen_range(SCORE_MIN..=SCORE_MAX) }
}

/// Replays a fixed sequence of scores, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedScores {
  queue: VecDeque<u32>,
}

impl ScriptedScores {
  pub fn new(scores: impl IntoIterator<Item = u32>) -> Self {
    Self {
      queue: scores.into_iter().collect(),
    }
  }
}

impl ScoreSource for ScriptedScores {
  fn draw(&mut self) -> u32 {
    let Some(next) = self.queue.pop_front() else {
      return SCORE_MIN;
    };
    self.queue.push_back(next);
    next
  }
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Draw six independent category scores, clamped to the valid range.
pub fn draw_scores<G: ScoreSource + ?Sized>(source: &mut G) -> CategoryScores {
  std::array::from_fn(|_| source.draw().clamp(SCORE_MIN, SCORE_MAX))
}

/// Build one risk record per student, in student order.
pub fn generate_records<G: ScoreSource + ?Sized>(
  students: &[StudentRecord],
  source: &mut G,
  now: NaiveDateTime,
) -> Vec<CategoryRiskRecord> {
  let stamp = format_timestamp(now);
  students
    .iter()
    .map(|s| {
      let scores = draw_scores(source);
      CategoryRiskRecord::from_scores(s.student_id.clone(), &scores, stamp.clone())
    })
    .collect()
}

/// Replace the contents of `ai_risk_score` with freshly generated records
/// for every row of `student_master`. Returns the number of rows written.
pub async fn regenerate<S, G>(
  store: &S,
  source: &mut G,
  now: NaiveDateTime,
) -> Result<usize>
where
  S: RecordStore,
  G: ScoreSource + ?Sized,
{
  let students: Vec<StudentRecord> = load_records(store).await?;
  let records = generate_records(&students, source, now);

  // Rows follow the stored header, which may order columns differently.
  let layout = store
    .read_table(CategoryRiskRecord::TABLE)
    .await
    .map_err(Error::store)?;
  let rows = layout_rows(&layout, &records)?;

  store
    .truncate(CategoryRiskRecord::TABLE)
    .await
    .map_err(Error::store)?;

  let count = records.len();
  store
    .append_rows(CategoryRiskRecord::TABLE, rows)
    .await
    .map_err(Error::store)?;

  tracing::info!(count, "regenerated risk scores");
  Ok(count)
}
