//! Trigger-phrase routing for incoming questions.
//!
//! A question that starts with a known activation phrase is answered in
//! grounded mode, with the phrase removed. Rules are tried in order and the
//! first match wins, so a shorter phrase listed earlier shadows any longer
//! phrase that shares its prefix.

use serde::{Deserialize, Serialize};

/// How a question is to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
  /// Answer strictly from the serialised dataset.
  Grounded,
  /// Generic assistant.
  Open,
}

/// One activation rule: a case-insensitive leading phrase and the mode it
/// selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRule {
  pub phrase: &'static str,
  pub mode:   QueryMode,
}

impl TriggerRule {
  pub const fn grounded(phrase: &'static str) -> Self {
    Self {
      phrase,
      mode: QueryMode::Grounded,
    }
  }

  /// The rest of `question` after this rule's phrase, if it matches.
  fn strip<'q>(&self, question: &'q str) -> Option<&'q str> {
    let head = question.get(..self.phrase.len())?;
    head
      .eq_ignore_ascii_case(self.phrase)
      .then(|| &question[self.phrase.len()..])
  }
}

/// The activation phrases, in match order.
pub const DEFAULT_TRIGGERS: &[TriggerRule] = &[
  TriggerRule::grounded("suresh"),
  TriggerRule::grounded("chatbot"),
  TriggerRule::grounded("hi"),
  TriggerRule::grounded("studentrisk"),
  TriggerRule::grounded("student risk"),
  TriggerRule::grounded("riskai"),
  TriggerRule::grounded("risk ai"),
];

/// The routing decision for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
  pub mode:     QueryMode,
  /// The question with the matched phrase and surrounding whitespace
  /// removed; unchanged when nothing matched.
  pub question: String,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryRouter {
  rules: &'static [TriggerRule],
}

impl Default for QueryRouter {
  fn default() -> Self { Self::new(DEFAULT_TRIGGERS) }
}

impl QueryRouter {
  pub const fn new(rules: &'static [TriggerRule]) -> Self { Self { rules } }

  pub fn rules(&self) -> &'static [TriggerRule] { self.rules }

  pub fn route(&self, question: &str) -> Routed {
    for rule in self.rules {
      if let Some(rest) = rule.strip(question) {
        tracing::debug!(phrase = rule.phrase, "activation trigger matched");
        return Routed {
          mode:     rule.mode,
          question: rest.trim().to_owned(),
        };
      }
    }
    Routed {
      mode:     QueryMode::Open,
      question: question.to_owned(),
    }
  }
}
