//! Named tables and their raw, string-typed contents.
//!
//! Every table in the record store is a header row followed by data rows of
//! strings. Typed access to the two tables the risk logic depends on lives in
//! [`crate::record`]; everything here is schema-agnostic.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Table names ─────────────────────────────────────────────────────────────

/// The fixed set of tables the platform knows about.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TableName {
  StudentMaster,
  AttendanceRisk,
  AcademicRisk,
  FinancialRisk,
  BehaviorRisk,
  EngagementRisk,
  WellbeingRisk,
  FamilyRisk,
  MlFeatures,
  AiRiskScore,
  RiskRules,
}

impl TableName {
  /// All tables, in navigation order.
  pub const ALL: [TableName; 11] = [
    Self::StudentMaster,
    Self::AttendanceRisk,
    Self::AcademicRisk,
    Self::FinancialRisk,
    Self::BehaviorRisk,
    Self::EngagementRisk,
    Self::WellbeingRisk,
    Self::FamilyRisk,
    Self::MlFeatures,
    Self::AiRiskScore,
    Self::RiskRules,
  ];

  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse a table name, rejecting anything outside the fixed set.
  pub fn parse(name: &str) -> Result<Self> {
    name.parse().map_err(|_| Error::UnknownTable(name.to_owned()))
  }
}

// ─── Table contents ──────────────────────────────────────────────────────────

/// A full-table read: the header row plus every data row in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

impl Table {
  /// Position of `column` in the header row.
  pub fn column(&self, column: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == column)
  }

  /// Resolve every name in `columns` to a header position, failing on the
  /// first one that is absent.
  pub fn require_columns(
    &self,
    table: TableName,
    columns: &[&str],
  ) -> Result<Vec<usize>> {
    columns
      .iter()
      .map(|c| {
        self.column(c).ok_or_else(|| Error::SchemaMismatch {
          table,
          column: (*c).to_owned(),
        })
      })
      .collect()
  }

  /// The cell at `(row, column)`; short rows read as empty.
  pub fn cell(&self, row: usize, column: usize) -> &str {
    self
      .rows
      .get(row)
      .and_then(|r| r.get(column))
      .map(String::as_str)
      .unwrap_or("")
  }
}

// ─── Row construction ────────────────────────────────────────────────────────

/// Columns that are stamped with the current time instead of taking input.
pub const STAMPED_COLUMNS: [&str; 2] = ["last_updated", "last_calculated"];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: NaiveDateTime) -> String {
  at.format(TIMESTAMP_FORMAT).to_string()
}

/// Build a row for `table` by mapping each stored header to a submitted
/// field.
///
/// Headers without a submitted value become empty cells; stamped columns
/// always receive `now`. A submitted field that is not a header is rejected.
pub fn build_row(
  table: TableName,
  headers: &[String],
  fields: &BTreeMap<String, String>,
  now: NaiveDateTime,
) -> Result<Vec<String>> {
  if let Some(field) = fields.keys().find(|f| !headers.contains(f)) {
    return Err(Error::UnknownField {
      table,
      field: field.clone(),
    });
  }

  let stamp = format_timestamp(now);
  Ok(
    headers
      .iter()
      .map(|h| {
        if STAMPED_COLUMNS.contains(&h.as_str()) {
          stamp.clone()
        } else {
          fields.get(h).cloned().unwrap_or_default()
        }
      })
      .collect(),
  )
}

/// Store rows are 1-based and include the header at index 1.
pub const HEADER_OFFSET: usize = 1;

/// Translate a 1-based visible data-row position into the store's row index.
pub fn store_row_index(visible: usize) -> Result<usize> {
  if visible == 0 {
    return Err(Error::InvalidRow(visible));
  }
  Ok(visible + HEADER_OFFSET)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
      .unwrap()
      .and_hms_opt(14, 5, 7)
      .unwrap()
  }

  fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn table_names_round_trip_through_snake_case() {
    assert_eq!(TableName::MlFeatures.as_str(), "ml_features");
    assert_eq!(TableName::AiRiskScore.to_string(), "ai_risk_score");
    assert_eq!(
      TableName::parse("student_master").unwrap(),
      TableName::StudentMaster
    );
    for name in TableName::ALL {
      assert_eq!(TableName::parse(name.as_str()).unwrap(), name);
    }
  }

  #[test]
  fn unknown_table_name_is_rejected() {
    let err = TableName::parse("grades").unwrap_err();
    assert!(matches!(err, Error::UnknownTable(n) if n == "grades"));
    assert!(TableName::parse("Student_Master").is_err());
  }

  #[test]
  fn build_row_follows_header_order_and_stamps_time() {
    let hs = headers(&["student_id", "reason", "last_updated"]);
    let mut fields = BTreeMap::new();
    fields.insert("reason".to_string(), "late fees".to_string());
    fields.insert("student_id".to_string(), "S7".to_string());

    let row = build_row(TableName::FinancialRisk, &hs, &fields, now()).unwrap();
    assert_eq!(row, vec!["S7", "late fees", "2024-03-09 14:05:07"]);
  }

  #[test]
  fn build_row_ignores_submitted_value_for_stamped_column() {
    let hs = headers(&["student_id", "last_calculated"]);
    let mut fields = BTreeMap::new();
    fields.insert("last_calculated".to_string(), "yesterday".to_string());

    let row = build_row(TableName::AiRiskScore, &hs, &fields, now()).unwrap();
    assert_eq!(row, vec!["", "2024-03-09 14:05:07"]);
  }

  #[test]
  fn build_row_rejects_unknown_field() {
    let hs = headers(&["student_id"]);
    let mut fields = BTreeMap::new();
    fields.insert("nickname".to_string(), "x".to_string());

    let err = build_row(TableName::StudentMaster, &hs, &fields, now()).unwrap_err();
    assert!(matches!(err, Error::UnknownField { field, .. } if field == "nickname"));
  }

  #[test]
  fn visible_rows_skip_the_header() {
    assert_eq!(store_row_index(1).unwrap(), 2);
    assert_eq!(store_row_index(10).unwrap(), 11);
    assert!(matches!(store_row_index(0), Err(Error::InvalidRow(0))));
  }

  #[test]
  fn short_rows_read_as_empty_cells() {
    let table = Table {
      headers: headers(&["a", "b"]),
      rows:    vec![vec!["1".to_string()]],
    };
    assert_eq!(table.cell(0, 0), "1");
    assert_eq!(table.cell(0, 1), "");
    assert_eq!(table.cell(5, 0), "");
  }
}
