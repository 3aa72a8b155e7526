mod commands;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::Command;
use vhc::{CacheStore, Config, Connectivity, MemoryStore, ReqwestTransport, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "vhc")]
#[command(about = "Offline-first client for vehicle health check jobs")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/vhc/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Start in offline mode: serve reads from cache and queue writes
  #[arg(long)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

/// Log to a file in the data directory so stdout only carries command output.
fn init_logging() -> Result<WorkerGuard> {
  let dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("vhc");
  std::fs::create_dir_all(&dir)?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, "vhc.log"));
  let env_filter = EnvFilter::try_from_env("VHC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging()?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let transport = Arc::new(ReqwestTransport::new(&config)?);
  let connectivity = if args.offline {
    Connectivity::forced_offline()
  } else {
    Connectivity::online()
  };

  if config.cache.ephemeral {
    let store = Arc::new(MemoryStore::new());
    commands::run(args.command, &config, store, transport, connectivity).await
  } else {
    let store = match &config.cache.path {
      Some(path) => SqliteStore::new(path),
      None => SqliteStore::open_default()?,
    };
    store.initialize()?;
    commands::run(args.command, &config, Arc::new(store), transport, connectivity).await
  }
}
