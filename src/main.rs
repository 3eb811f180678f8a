use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use homesync::bus::{BusClient, Message, Reply};
use homesync::config::Config;
use homesync::event::EventHandler;
use homesync::queue::{NewChange, Operation};
use homesync::sync::{SyncOutcome, SyncTrigger};
use homesync::worker::{Worker, WorkerDeps};

#[derive(Parser, Debug)]
#[command(name = "homesync")]
#[command(about = "Offline-first sync worker for the family dashboard")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./homesync.yaml, then $XDG_CONFIG_HOME/homesync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the worker, reading bus messages as JSON lines on stdin
  Serve,
  /// Queue a change for the next sync
  Enqueue {
    /// create, update or delete
    #[arg(value_parser = parse_operation)]
    operation: Operation,
    /// Change payload as JSON
    payload: String,
  },
  /// Run one sync cycle now
  Sync,
  /// Show pending changes and stored collections
  Status,
  /// Deliver a push payload and print the resulting notification
  Push {
    /// Raw push payload; JSON or plain text
    payload: Option<String>,
  },
}

fn parse_operation(s: &str) -> Result<Operation, String> {
  serde_json::from_value(Value::String(s.to_lowercase()))
    .map_err(|_| format!("unknown operation '{}', expected create, update or delete", s))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Arc::new(Config::load(args.config.as_deref())?);
  let data_dir = config.data_dir()?;
  let _log_guard = homesync::logging::init(&data_dir.join("logs"));

  let deps = WorkerDeps::from_config(&config, data_dir)?;
  let worker = Arc::new(Worker::new(config.clone(), deps).await?);

  match args.command {
    Command::Serve => serve(worker, &config).await,
    Command::Enqueue { operation, payload } => {
      let payload: Value = serde_json::from_str(&payload)?;
      let change = worker.queue().enqueue(NewChange { operation, payload })?;
      println!("{}", serde_json::to_string_pretty(&change)?);
      Ok(())
    }
    Command::Sync => {
      match worker.sync().trigger(SyncTrigger::Manual).await? {
        SyncOutcome::Completed { applied } => println!("Synced {} change(s)", applied),
        SyncOutcome::Halted {
          applied,
          failed_id,
          error,
        } => println!(
          "Synced {} change(s), stopped at change {}: {}",
          applied, failed_id, error
        ),
        SyncOutcome::Coalesced => println!("A sync is already running"),
      }
      Ok(())
    }
    Command::Status => {
      let store = worker.store();
      let mut collections = serde_json::Map::new();
      for name in store.collections()? {
        collections.insert(name.clone(), json!(store.count(&name)?));
      }
      let status = json!({
        "sync": worker.sync().status()?,
        "schemaVersion": store.version()?,
        "collections": collections,
        "cache": worker.cache().state().to_string(),
      });
      println!("{}", serde_json::to_string_pretty(&status)?);
      Ok(())
    }
    Command::Push { payload } => {
      let id = worker.notifications().on_push(payload.as_deref().map(str::as_bytes));
      let shown = worker
        .notifications()
        .visible()
        .into_iter()
        .find(|n| n.id == id)
        .ok_or_else(|| eyre!("notification {} was not shown", id))?;
      println!("{}", serde_json::to_string_pretty(&shown.notification)?);
      Ok(())
    }
  }
}

async fn serve(worker: Arc<Worker>, config: &Config) -> Result<()> {
  if let Err(e) = worker.start().await {
    // Still useful without a cache: storage, queue and sync keep working
    warn!(error = %e, "Worker started without an installed cache");
  }

  let (events, tx) = EventHandler::new(config.sync.interval());
  let client = BusClient::new(tx);
  let running = tokio::spawn(worker.run(events));

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdout = tokio::io::stdout();
  info!("Reading bus messages from stdin");

  while let Some(line) = lines.next_line().await? {
    if line.trim().is_empty() {
      continue;
    }

    let reply = match serde_json::from_str::<Value>(&line) {
      Err(e) => Some(Reply::err(format!("protocol error: malformed JSON: {}", e))),
      Ok(body) => match serde_json::from_value::<Message>(body.clone()) {
        Ok(message) if !message.expects_reply() => {
          client.post(&message)?;
          None
        }
        _ => Some(client.request_raw(body).await?),
      },
    };

    if let Some(reply) = reply {
      let mut out = serde_json::to_vec(&reply)?;
      out.push(b'\n');
      stdout.write_all(&out).await?;
      stdout.flush().await?;
    }
  }

  drop(client);
  running.await?;
  Ok(())
}
