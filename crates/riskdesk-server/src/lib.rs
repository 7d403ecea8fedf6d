//! Server bootstrap for the student risk platform: configuration, store
//! initialisation and the top-level router.

use std::path::{Path, PathBuf};

use axum::Router;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use riskdesk_api::ApiState;
use riskdesk_core::{
  engine::CompletionService,
  record::{CategoryRiskRecord, StudentRecord},
  store::{RecordStore, ensure_table},
};
use riskdesk_openai::OpenAiConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `RISKDESK_PORT=8080` or
/// `RISKDESK_COMPLETION__API_KEY=...`.
pub const ENV_PREFIX: &str = "RISKDESK";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub completion: OpenAiConfig,
}

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_port() -> u16 { 4090 }

fn default_store_path() -> PathBuf { PathBuf::from("riskdesk.sqlite3") }

/// Load configuration from an optional TOML file at `path`, overridden by
/// `RISKDESK_*` environment variables.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
  from_builder(Config::builder().add_source(File::from(path).required(false)))
}

fn from_builder(
  builder: ConfigBuilder<DefaultState>,
) -> Result<ServerConfig, ConfigError> {
  builder
    .add_source(
      Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Store initialisation ────────────────────────────────────────────────────

/// Make sure the two tables the risk logic reads exist with compatible
/// headers.
pub async fn ensure_schema<S: RecordStore>(store: &S) -> riskdesk_core::Result<()> {
  ensure_table::<S, StudentRecord>(store).await?;
  ensure_table::<S, CategoryRiskRecord>(store).await?;
  Ok(())
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn router<S, C>(state: ApiState<S, C>) -> Router
where
  S: RecordStore + 'static,
  C: CompletionService + 'static,
{
  riskdesk_api::api_router(state).layer(TraceLayer::new_for_http())
}
