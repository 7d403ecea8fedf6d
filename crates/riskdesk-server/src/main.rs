//! riskdesk server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! record store and then either serves the HTTP API or runs one of the
//! maintenance jobs.
//!
//! ```text
//! riskdesk serve
//! riskdesk regenerate
//! riskdesk init-table family_risk student_id notes
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Local;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use riskdesk_api::ApiState;
use riskdesk_core::{
  generate::{RandomScores, regenerate},
  store::RecordStore,
  table::TableName,
};
use riskdesk_openai::OpenAiClient;
use riskdesk_server::{ServerConfig, ensure_schema, expand_tilde, load_config};
use riskdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Student risk dashboard and assistant")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Recompute the AI risk score table from the student roster.
  Regenerate,
  /// Create a table with the given header row if it does not exist.
  InitTable {
    /// Table name, e.g. `family_risk`.
    table:   String,
    /// Column names for the header row.
    #[arg(required = true)]
    headers: Vec<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    load_config(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, server_cfg).await,
    Command::Regenerate => {
      ensure_schema(&store).await.context("failed to prepare tables")?;
      let mut scores = RandomScores(StdRng::from_entropy());
      let count = regenerate(&store, &mut scores, Local::now().naive_local())
        .await
        .context("failed to regenerate risk scores")?;
      println!("AI risk scores generated for {count} students");
      Ok(())
    }
    Command::InitTable { table, headers } => {
      let table = TableName::parse(&table)?;
      let stored = store
        .create_table(table, headers)
        .await
        .with_context(|| format!("failed to create {table}"))?;
      println!("{table}: {}", stored.join(", "));
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  ensure_schema(&store).await.context("failed to prepare tables")?;

  if server_cfg.completion.api_key.is_empty() {
    tracing::warn!("no completion API key configured; /ask will report errors");
  }
  let completion = OpenAiClient::new(server_cfg.completion.clone())
    .context("failed to build completion client")?;

  let app = riskdesk_server::router(ApiState::new(store, completion));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
