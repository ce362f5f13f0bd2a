//! dtaxi back-office server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an operator's `password_hash`:
//!
//! ```
//! cargo run -p dtaxi-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use dtaxi_api::ApiState;
use dtaxi_core::area::AreaRegistry;
use dtaxi_server::{ServerConfig, render::ProcessRenderer};
use dtaxi_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "D-TAXI back-office server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    println!("{}", hash_password(&read_password_line()?)?);
    return Ok(());
  }

  let server_cfg = load_config(&cli.config)?;
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path, server_cfg.base_url.clone())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mut state = ApiState::new(Arc::new(store), AreaRegistry::standard())
    .with_settings(server_cfg.api_settings());
  match ProcessRenderer::new(&server_cfg.renderer_command) {
    Some(renderer) => {
      tracing::info!(program = renderer.program(), "PDF/PNG rendering enabled");
      state = state.with_renderer(Arc::new(renderer));
    }
    None => tracing::warn!("no renderer_command configured; PDF and PNG exports are disabled"),
  }

  let auth = server_cfg.auth();
  if !auth.is_enabled() {
    tracing::warn!("no operators configured; authentication is disabled");
  }

  let app = dtaxi_server::router(state, auth);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Operator `password_hash` value for `password`.
fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string(),
  )
}

/// The TOML file at `path` (optional) overlaid with `DTAXI_*` variables.
fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("DTAXI"))
    .build()
    .with_context(|| format!("failed to read config from {}", path.display()))?
    .try_deserialize()
    .context("invalid server configuration")
}

/// Prompt for a password and read one line of stdin. Input is echoed.
fn read_password_line() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
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
