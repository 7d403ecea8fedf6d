//! Typed records for the tables the risk logic reads and writes.
//!
//! Cells stay as strings: the store is string-typed, and a stored
//! `risk_category` must be passed through as-is even when it disagrees with
//! the scores beside it. Numeric interpretation happens at the point of use.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Result,
  table::{Table, TableName},
};

// ─── Tiers ───────────────────────────────────────────────────────────────────

/// Scores at or above this are [`RiskTier::High`].
pub const HIGH_THRESHOLD: f64 = 75.0;
/// Scores at or above this (and below [`HIGH_THRESHOLD`]) are
/// [`RiskTier::Medium`].
pub const MEDIUM_THRESHOLD: f64 = 55.0;

/// A coarse risk band derived from a composite score.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RiskTier {
  Low,
  Medium,
  High,
}

impl RiskTier {
  pub fn from_score(score: f64) -> Self {
    if score >= HIGH_THRESHOLD {
      Self::High
    } else if score >= MEDIUM_THRESHOLD {
      Self::Medium
    } else {
      Self::Low
    }
  }

  /// Exact, case-sensitive match against a stored label.
  pub fn from_label(label: &str) -> Option<Self> { label.parse().ok() }

  pub fn label(self) -> &'static str { self.into() }
}

/// The six per-category scores, in column order.
pub type CategoryScores = [u32; 6];

/// Mean of the six category scores, rounded half-to-even.
pub fn composite_score(scores: &CategoryScores) -> u32 {
  let sum: u32 = scores.iter().sum();
  (f64::from(sum) / scores.len() as f64).round_ties_even() as u32
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// A record type bound to one table with a fixed set of columns.
pub trait TableRecord: Sized {
  const TABLE: TableName;
  /// Columns this record needs, in the order `from_cells`/`to_cells` use.
  const HEADERS: &'static [&'static str];

  fn from_cells(cells: &[&str]) -> Self;
  fn to_cells(&self) -> Vec<String>;
}

/// Decode every row of `table` as `R`.
///
/// The stored header must contain every column in `R::HEADERS`; extra
/// columns are ignored and column order is taken from the stored header.
pub fn read_records<R: TableRecord>(table: &Table) -> Result<Vec<R>> {
  let positions = table.require_columns(R::TABLE, R::HEADERS)?;
  Ok(
    (0..table.rows.len())
      .map(|row| {
        let cells: Vec<&str> =
          positions.iter().map(|&col| table.cell(row, col)).collect();
        R::from_cells(&cells)
      })
      .collect(),
  )
}

/// Encode `records` as rows laid out by the stored header of `table`.
///
/// Each schema column lands at its stored position; columns outside
/// `R::HEADERS` are left empty.
pub fn layout_rows<R: TableRecord>(table: &Table, records: &[R]) -> Result<Vec<Vec<String>>> {
  let positions = table.require_columns(R::TABLE, R::HEADERS)?;
  Ok(
    records
      .iter()
      .map(|rec| {
        let mut row = vec![String::new(); table.headers.len()];
        for (&col, value) in positions.iter().zip(rec.to_cells()) {
          row[col] = value;
        }
        row
      })
      .collect(),
  )
}

fn cell(cells: &[&str], i: usize) -> String {
  cells.get(i).copied().unwrap_or_default().to_owned()
}

// ─── Students ────────────────────────────────────────────────────────────────

/// Identity row from `student_master`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
  pub student_id: String,
  pub name:       String,
  pub grade:      String,
  pub school:     String,
}

impl TableRecord for StudentRecord {
  const TABLE: TableName = TableName::StudentMaster;
  const HEADERS: &'static [&'static str] =
    &["student_id", "name", "grade", "school"];

  fn from_cells(cells: &[&str]) -> Self {
    Self {
      student_id: cell(cells, 0),
      name:       cell(cells, 1),
      grade:      cell(cells, 2),
      school:     cell(cells, 3),
    }
  }

  fn to_cells(&self) -> Vec<String> {
    vec![
      self.student_id.clone(),
      self.name.clone(),
      self.grade.clone(),
      self.school.clone(),
    ]
  }
}

// ─── Category risk ───────────────────────────────────────────────────────────

/// Per-category risk row from `ai_risk_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRiskRecord {
  pub student_id:         String,
  pub attendance_score:   String,
  pub academic_score:     String,
  pub financial_score:    String,
  pub behavior_score:     String,
  pub engagement_score:   String,
  pub wellbeing_score:    String,
  pub overall_risk_score: String,
  /// Stored tier label; never re-derived on read.
  pub risk_category:      String,
  pub last_calculated:    String,
}

impl CategoryRiskRecord {
  /// Build a record from freshly drawn scores, deriving the composite score
  /// and tier.
  pub fn from_scores(
    student_id: impl Into<String>,
    scores: &CategoryScores,
    last_calculated: impl Into<String>,
  ) -> Self {
    let overall = composite_score(scores);
    let tier = RiskTier::from_score(f64::from(overall));
    let [att, acad, fin, beh, eng, well] = scores.map(|s| s.to_string());
    Self {
      student_id:         student_id.into(),
      attendance_score:   att,
      academic_score:     acad,
      financial_score:    fin,
      behavior_score:     beh,
      engagement_score:   eng,
      wellbeing_score:    well,
      overall_risk_score: overall.to_string(),
      risk_category:      tier.label().to_owned(),
      last_calculated:    last_calculated.into(),
    }
  }
}

impl TableRecord for CategoryRiskRecord {
  const TABLE: TableName = TableName::AiRiskScore;
  const HEADERS: &'static [&'static str] = &[
    "student_id",
    "attendance_score",
    "academic_score",
    "financial_score",
    "behavior_score",
    "engagement_score",
    "wellbeing_score",
    "overall_risk_score",
    "risk_category",
    "last_calculated",
  ];

  fn from_cells(cells: &[&str]) -> Self {
    Self {
      student_id:         cell(cells, 0),
      attendance_score:   cell(cells, 1),
      academic_score:     cell(cells, 2),
      financial_score:    cell(cells, 3),
      behavior_score:     cell(cells, 4),
      engagement_score:   cell(cells, 5),
      wellbeing_score:    cell(cells, 6),
      overall_risk_score: cell(cells, 7),
      risk_category:      cell(cells, 8),
      last_calculated:    cell(cells, 9),
    }
  }

  fn to_cells(&self) -> Vec<String> {
    vec![
      self.student_id.clone(),
      self.attendance_score.clone(),
      self.academic_score.clone(),
      self.financial_score.clone(),
      self.behavior_score.clone(),
      self.engagement_score.clone(),
      self.wellbeing_score.clone(),
      self.overall_risk_score.clone(),
      self.risk_category.clone(),
      self.last_calculated.clone(),
    ]
  }
}
