//! picc-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `PICC_*` environment variables, opens an in-process SQLite store, and
//! either serves the JSON API, prints one annual report, or imports a bundle.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use picc_api::ApiState;
use picc_server::{ServerConfig, expand_tilde, import};
use picc_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PICC storytelling report server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Print the annual report for one year as JSON.
  Report {
    #[arg(short, long)]
    year:   i32,
    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
  },

  /// Load profiles and stories from a JSON bundle.
  Import {
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing. Logs go to stderr so `report` output stays clean.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PICC"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Serve => serve(store, &server_cfg).await,
    Command::Report { year, pretty } => report(&store, &server_cfg, year, pretty).await,
    Command::Import { file } => {
      let bundle = import::read_bundle(&file)
        .await
        .with_context(|| format!("failed to load bundle {file:?}"))?;
      let summary = import::import_bundle(&store, server_cfg.organization_id, bundle)
        .await
        .context("import failed")?;
      println!("imported {} profiles and {} stories", summary.profiles, summary.stories);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let state = ApiState::new(Arc::new(store), server_cfg.organization_id)
    .with_report_timeout(server_cfg.report_timeout());

  let app = picc_server::app(state);
  let address = server_cfg.address();

  tracing::info!(organization_id = %server_cfg.organization_id, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn report(
  store: &SqliteStore,
  server_cfg: &ServerConfig,
  year: i32,
  pretty: bool,
) -> anyhow::Result<()> {
  let run = picc_core::generate_annual_report(store, server_cfg.organization_id, year);
  let report = tokio::time::timeout(server_cfg.report_timeout(), run)
    .await
    .context("report unavailable, try again")?
    .with_context(|| format!("failed to generate report for {year}"))?;

  let json = if pretty {
    serde_json::to_string_pretty(&report)?
  } else {
    serde_json::to_string(&report)?
  };
  println!("{json}");
  Ok(())
}
