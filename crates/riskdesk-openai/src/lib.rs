//! Chat-completions client implementing
//! [`riskdesk_core::engine::CompletionService`].
//!
//! Each call sends a single user-role message holding the fully assembled
//! prompt and returns the text of the first choice. There is no retry and no
//! request deadline.

use reqwest::Client;
use riskdesk_core::engine::CompletionService;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("completion endpoint returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("malformed completion response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("completion response contained no choices")]
  NoChoices,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default)]
  pub api_key:  String,
  #[serde(default = "default_model")]
  pub model:    String,
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_owned() }

fn default_model() -> String { DEFAULT_MODEL.to_owned() }

impl Default for OpenAiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      api_key:  String::new(),
      model:    default_model(),
    }
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatRequest<'a> {
  model:    &'a str,
  messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
  #[serde(default)]
  content: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
  ChatRequest {
    model,
    messages: [ChatMessage {
      role:    "user",
      content: prompt,
    }],
  }
}

/// Extract the first choice's text from a raw response body.
fn parse_completion(body: &str) -> Result<String> {
  let resp: ChatResponse = serde_json::from_str(body)?;
  resp
    .choices
    .into_iter()
    .next()
    .map(|c| c.message.content.unwrap_or_default())
    .ok_or(Error::NoChoices)
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for a chat-completions endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client: Client,
  config: OpenAiConfig,
}

impl OpenAiClient {
  pub fn new(config: OpenAiConfig) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &OpenAiConfig { &self.config }

  fn url(&self) -> String {
    format!(
      "{}/chat/completions",
      self.config.base_url.trim_end_matches('/')
    )
  }

  /// `POST {base_url}/chat/completions`
  pub async fn chat(&self, prompt: &str) -> Result<String> {
    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&request_body(&self.config.model, prompt))
      .send()
      .await?;

    let status = resp.status();
    let body = resp.text().await?;
    tracing::debug!(%status, model = %self.config.model, "completion response");
    if !status.is_success() {
      return Err(Error::Status { status, body });
    }
    parse_completion(&body)
  }
}

impl CompletionService for OpenAiClient {
  type Error = Error;

  async fn complete(&self, prompt: &str) -> Result<String> { self.chat(prompt).await }
}
