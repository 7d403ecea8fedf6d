//! Dashboard reduction of the composite view.

use serde::Serialize;

use crate::{aggregate::CompositeRiskView, record::RiskTier};

/// How many students the dashboard ranks.
pub const TOP_N: usize = 10;

/// A single row of the top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStudent {
  pub student_id: String,
  pub name:       String,
  /// Stored tier label.
  pub risk:       String,
  pub score:      f64,
}

impl From<&CompositeRiskView> for RankedStudent {
  fn from(v: &CompositeRiskView) -> Self {
    Self {
      student_id: v.student.student_id.clone(),
      name:       v.student.name.clone(),
      risk:       v.risk.risk_category.clone(),
      score:      v.score,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
  pub top:    Vec<RankedStudent>,
  pub high:   usize,
  pub medium: usize,
  pub low:    usize,
}

/// Rank the view by score (stable, highest first) and count stored tier
/// labels.
///
/// Counts match the stored `risk_category` exactly; labels that are not one
/// of the three tiers are counted nowhere.
pub fn summarize(view: &[CompositeRiskView]) -> DashboardSummary {
  let mut ranked: Vec<&CompositeRiskView> = view.iter().collect();
  ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

  let count = |tier: RiskTier| {
    view
      .iter()
      .filter(|v| RiskTier::from_label(v.risk_category()) == Some(tier))
      .count()
  };

  DashboardSummary {
    top:    ranked.into_iter().take(TOP_N).map(RankedStudent::from).collect(),
    high:   count(RiskTier::High),
    medium: count(RiskTier::Medium),
    low:    count(RiskTier::Low),
  }
}
