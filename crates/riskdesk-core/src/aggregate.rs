//! Joining student identity with category risk into a composite view.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
  Result,
  record::{CategoryRiskRecord, StudentRecord},
  store::{RecordStore, load_records},
};

/// One student's identity and category-risk data side by side. Built fresh
/// for each operation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeRiskView {
  pub student: StudentRecord,
  pub risk:    CategoryRiskRecord,
  /// `overall_risk_score` coerced to a number; `0.0` when absent or
  /// unparseable.
  pub score:   f64,
}

impl CompositeRiskView {
  pub fn student_id(&self) -> &str { &self.student.student_id }

  /// The stored tier label, passed through verbatim.
  pub fn risk_category(&self) -> &str { &self.risk.risk_category }
}

/// Parse a stored score; `None` when blank or not a finite number.
pub fn coerce_score(raw: &str) -> Option<f64> {
  raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Inner-join `students` with `risks` on `student_id`.
///
/// Duplicate ids are resolved first-match-wins on both sides: the earliest
/// risk record for an id is the one joined, and a later student row that
/// repeats an already-joined id is skipped rather than joined again. Each
/// id therefore appears at most once, which keeps the output no longer than
/// the smaller input. Students without a risk record (and risk records
/// without a student) are dropped. Output follows the order of `students`.
pub fn join(
  students: &[StudentRecord],
  risks: &[CategoryRiskRecord],
) -> Vec<CompositeRiskView> {
  let mut by_id: HashMap<&str, &CategoryRiskRecord> =
    HashMap::with_capacity(risks.len());
  for risk in risks {
    by_id.entry(risk.student_id.as_str()).or_insert(risk);
  }

  let mut seen: HashSet<&str> = HashSet::new();
  students
    .iter()
    .filter_map(|student| {
      let risk = by_id.get(student.student_id.as_str())?;
      if !seen.insert(student.student_id.as_str()) {
        return None;
      }
      let score = coerce_score(&risk.overall_risk_score).unwrap_or_else(|| {
        tracing::warn!(
          student_id = %student.student_id,
          raw = %risk.overall_risk_score,
          "non-numeric overall_risk_score; using 0"
        );
        0.0
      });
      Some(CompositeRiskView {
        student: student.clone(),
        risk: (*risk).clone(),
        score,
      })
    })
    .collect()
}

/// Read both tables from `store` and join them.
pub async fn load_composite_view<S: RecordStore>(
  store: &S,
) -> Result<Vec<CompositeRiskView>> {
  let students: Vec<StudentRecord> = load_records(store).await?;
  let risks: Vec<CategoryRiskRecord> = load_records(store).await?;
  Ok(join(&students, &risks))
}
