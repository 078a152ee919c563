//! bingo server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `BINGO_*`
//! environment variables, opens the shared SQLite game database, and serves
//! the participant API and moderator routes over HTTP.
//!
//! # PIN hash generation
//!
//! To generate the argon2 PHC string for `moderator_pin_hash`:
//!
//! ```
//! cargo run -p bingo-server --bin server -- --hash-pin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use bingo_api::GameContext;
use bingo_server::{AppState, ServerConfig};
use bingo_store_sqlite::SqliteStore;
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Human bingo game server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a PIN entered on stdin and exit.
  #[arg(long)]
  hash_pin: bool,
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

  if cli.hash_pin {
    let pin = read_pin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(pin.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg: ServerConfig = bingo_server::load_config(&cli.config, None)
    .context("failed to load ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open_with_busy_timeout(&store_path, server_cfg.busy_timeout())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let rules = server_cfg.rules();
  tracing::info!(
    facts_per_player = rules.facts_per_player,
    win_target = rules.win_target,
    store = %store_path.display(),
    "game store ready"
  );
  if server_cfg.moderator_pin_hash.is_none() {
    tracing::warn!("moderator_pin_hash not set; using the plain moderator PIN");
  }

  let game = GameContext::new(Arc::new(store), rules);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = bingo_server::router(AppState::new(game, &server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a PIN from stdin.
fn read_pin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("PIN: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
