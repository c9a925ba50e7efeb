//! quill server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `QUILL_*` environment variables, opens an in-process SQLite store, and
//! serves the blog over HTTP.
//!
//! # Listing accounts
//!
//! ```
//! cargo run -p quill-web --bin quill -- users
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use quill_core::accounts::AccountManager;
use quill_store_sqlite::SqliteStore;
use quill_web::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Characters of the password hash shown by `quill users`.
const HASH_PREVIEW_CHARS: usize = 50;

#[derive(Parser)]
#[command(author, version, about = "Quill blog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the blog over HTTP (the default).
  Serve,
  /// Print every registered account and exit.
  Users,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
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
    .add_source(config::Environment::with_prefix("QUILL"))
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(Arc::new(store), server_cfg).await,
    Command::Users => list_users(Arc::new(store)).await,
  }
}

async fn serve(store: Arc<SqliteStore>, config: ServerConfig) -> anyhow::Result<()> {
  let address = format!("{}:{}", config.host, config.port);
  let app = quill_web::router(AppState::new(store, config));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn list_users(store: Arc<SqliteStore>) -> anyhow::Result<()> {
  let summaries = AccountManager::new(store)
    .list()
    .await
    .context("failed to list accounts")?;

  if summaries.is_empty() {
    println!("No registered users.");
    return Ok(());
  }

  println!("REGISTERED USERS:");
  println!("{}", "=".repeat(60));
  for summary in summaries {
    let account = &summary.account;
    let hash: String = account.credential.as_phc().chars().take(HASH_PREVIEW_CHARS).collect();
    println!("ID: {}", account.id);
    println!("Username: {}", account.username);
    println!("Email: {}", account.email);
    println!("Password Hash: {hash}...");
    println!("Posts: {}", summary.post_count);
    println!("{}", "-".repeat(40));
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
