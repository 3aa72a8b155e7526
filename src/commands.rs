//! CLI subcommands.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use vhc::http::ResponseSource;
use vhc::inspection::Category;
use vhc::models::Method;
use vhc::{ApiResponse, CacheStore, Config, Connectivity, Partition, Replayer, ReqwestTransport, ResilientClient};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// GET a URL through the offline-aware client and print the body
  Get { url: String },
  /// Send a request with any method
  Send {
    method: Method,
    url: String,
    /// JSON request body
    #[arg(short, long)]
    body: Option<String>,
  },
  /// List operations waiting to be replayed
  Queue,
  /// Replay queued operations now
  Replay,
  /// Stay running and replay the queue whenever the server is reachable again
  Watch,
  /// Print cached records from a partition
  Cache {
    partition: Partition,
    key: Option<String>,
  },
  /// Clear every cached record and the offline queue
  Clear,
  /// Evaluate an inspection form stored as JSON
  Assess { category: Category, file: PathBuf },
}

pub async fn run<S: CacheStore + 'static>(
  command: Command,
  config: &Config,
  store: Arc<S>,
  transport: Arc<ReqwestTransport>,
  connectivity: Connectivity,
) -> Result<()> {
  match command {
    Command::Get { url } => {
      let client = ResilientClient::new(store, transport, connectivity);
      print_response(client.get(&url).await?);
    }
    Command::Send { method, url, body } => {
      let body = body
        .map(|b| serde_json::from_str::<Value>(&b))
        .transpose()
        .map_err(|e| eyre!("--body is not valid JSON: {}", e))?;
      let client = ResilientClient::new(store, transport, connectivity);
      print_response(client.send(method, &url, body).await?);
    }
    Command::Queue => {
      let pending = store.pending_operations()?;
      if pending.is_empty() {
        println!("No queued operations");
      }
      for op in pending {
        println!(
          "{:>4}  {:<6} {:<40} {:<18} attempts={}{}",
          op.id,
          op.method,
          op.endpoint,
          op.kind,
          op.attempts,
          op.last_error.map(|e| format!("  last_error={}", e)).unwrap_or_default()
        );
      }
    }
    Command::Replay => {
      let replayer = Replayer::new(store, transport, connectivity, config.sync.max_attempts);
      let report = replayer.drain().await?;
      println!(
        "replayed {}, rejected {}, discarded {}, remaining {}",
        report.replayed, report.failed, report.discarded, report.remaining
      );
    }
    Command::Watch => {
      let (_replayer, watcher) = vhc::sync::spawn_sync(store, transport, connectivity, &config.sync);
      println!(
        "Watching {} every {}s, Ctrl-C to stop",
        config.sync.health_path,
        config.sync.probe_interval().as_secs()
      );
      tokio::signal::ctrl_c().await?;
      watcher.abort();
    }
    Command::Cache { partition, key } => {
      let records = match key {
        Some(key) => store.get(partition, &key)?.into_iter().collect(),
        None => store.get_all(partition)?,
      };
      for record in records {
        println!("# {} (cached {})", record.key, record.cached_at.to_rfc3339());
        println!("{}", serde_json::to_string_pretty(&record.data)?);
      }
    }
    Command::Clear => {
      store.clear_all()?;
      println!("Cache cleared");
    }
    Command::Assess { category, file } => {
      let contents = std::fs::read_to_string(&file)
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
      let fields: Value = serde_json::from_str(&contents)?;
      let assessment = category
        .assess_json(fields)
        .map_err(|e| eyre!("Invalid {} form: {}", category, e))?;
      println!("{}", serde_json::to_string_pretty(&assessment)?);
    }
  }

  Ok(())
}

fn print_response(response: ApiResponse) {
  match response.source() {
    ResponseSource::Network => {}
    ResponseSource::Cache { cached_at } => match cached_at {
      Some(at) => eprintln!("(offline: served from cache captured {})", at.to_rfc3339()),
      None => eprintln!("(offline: served from cache)"),
    },
    ResponseSource::Queued { operation_id } => {
      eprintln!("(offline: queued as operation {})", operation_id)
    }
  }
  println!("{}", response.into_text());
}
