//! The background worker: owns every component and dispatches events.
//!
//! Handlers run as separate tasks so a long sync cycle never holds up bus
//! replies or fetches. On a current-thread runtime they interleave only at
//! `.await` points; shared state is touched solely through the offline store.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::bus::{Envelope, Message, Reply};
use crate::cache::{CacheManager, CachePolicy, HttpNetwork, Network, SqliteCacheStorage};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::{Event, EventHandler};
use crate::notify::{
  NotificationCenter, NotificationDispatcher, NotificationSurface, WindowHost, WindowRegistry,
};
use crate::queue::{NewChange, PendingQueue};
use crate::store::{OfflineStore, StoreHandle, PENDING_CHANGES};
use crate::sync::{HttpSyncBackend, SyncBackend, SyncCoordinator, SyncTrigger};

/// Collaborators the worker is built from.
pub struct WorkerDeps {
  pub store: StoreHandle,
  pub cache_storage: SqliteCacheStorage,
  pub network: Arc<dyn Network>,
  pub backend: Arc<dyn SyncBackend>,
  pub surface: Arc<dyn NotificationSurface>,
  pub windows: Arc<dyn WindowHost>,
}

impl WorkerDeps {
  /// Production wiring: on-disk databases, HTTP, in-process notification tray.
  pub fn from_config(config: &Config, data_dir: PathBuf) -> Result<Self> {
    let cache_storage = SqliteCacheStorage::open_at(&data_dir.join("caches.db"))?;

    Ok(Self {
      store: StoreHandle::new(&config.store, data_dir),
      cache_storage,
      network: Arc::new(HttpNetwork::new(config.cache.timeout())?),
      backend: Arc::new(HttpSyncBackend::new(
        &config.sync.endpoint,
        config.sync.timeout(),
      )?),
      surface: Arc::new(NotificationCenter::new()),
      windows: Arc::new(WindowRegistry::new()),
    })
  }
}

pub struct Worker {
  config: Arc<Config>,
  store: Arc<OfflineStore>,
  queue: PendingQueue,
  cache: CacheManager<SqliteCacheStorage>,
  sync: SyncCoordinator,
  notifications: Arc<NotificationDispatcher>,
}

impl Worker {
  pub async fn new(config: Arc<Config>, deps: WorkerDeps) -> Result<Self> {
    let store = deps.store.ensure_open().await?;
    let policy = CachePolicy::from_config(&config.app, &config.cache)
      .map_err(|e| Error::Lifecycle(format!("invalid cache configuration: {}", e)))?;

    let notifications = Arc::new(NotificationDispatcher::new(
      deps.surface,
      deps.windows,
      policy.origin.clone(),
    ));
    let queue = PendingQueue::new(store.clone());
    let sync = SyncCoordinator::new(queue.clone(), deps.backend, notifications.clone());
    let cache = CacheManager::new(deps.cache_storage, deps.network, policy);

    Ok(Self {
      config,
      store,
      queue,
      cache,
      sync,
      notifications,
    })
  }

  pub fn store(&self) -> &Arc<OfflineStore> {
    &self.store
  }

  pub fn queue(&self) -> &PendingQueue {
    &self.queue
  }

  pub fn cache(&self) -> &CacheManager<SqliteCacheStorage> {
    &self.cache
  }

  pub fn sync(&self) -> &SyncCoordinator {
    &self.sync
  }

  pub fn notifications(&self) -> &NotificationDispatcher {
    &self.notifications
  }

  /// Install the cache version and, unless configured to wait, activate it.
  pub async fn start(&self) -> Result<()> {
    self.dispatch(Event::Install).await?;
    if self.config.cache.skip_waiting {
      self.dispatch(Event::Activate).await?;
    }
    Ok(())
  }

  /// Handle one event. Every event kind has exactly one handler.
  pub async fn dispatch(&self, event: Event) -> Result<()> {
    match event {
      Event::Install => self.cache.install().await,
      Event::Activate => self.cache.activate().await,
      Event::Fetch { request, reply } => {
        let response = self.cache.handle(&request).await;
        let _ = reply.send(response);
        Ok(())
      }
      Event::Push(raw) => {
        self.notifications.on_push(raw.as_deref());
        Ok(())
      }
      Event::NotificationClick { id, action } => {
        let outcome = self.notifications.on_click(id, action.as_deref()).await;
        debug!(id, ?outcome, "Notification click handled");
        Ok(())
      }
      Event::Sync(trigger) => {
        self.sync.trigger(trigger).await?;
        Ok(())
      }
      Event::Online => {
        self.sync.trigger(SyncTrigger::Reconnect).await?;
        Ok(())
      }
      Event::Message(envelope) => {
        self.on_message(envelope).await;
        Ok(())
      }
    }
  }

  async fn on_message(&self, envelope: Envelope) {
    let message = match envelope.parse() {
      Ok(message) => message,
      Err(e) => {
        warn!(error = %e, "Rejecting bus message");
        envelope.respond(Reply::err(e));
        return;
      }
    };

    if !message.expects_reply() {
      if let Err(e) = self.handle_message(message).await {
        warn!(error = %e, "Bus message without reply failed");
      }
      return;
    }

    let reply = match self.handle_message(message).await {
      Ok(data) => Reply::ok(data),
      Err(e) => Reply::err(e),
    };
    envelope.respond(reply);
  }

  async fn handle_message(&self, message: Message) -> Result<Option<Value>> {
    match message {
      Message::SaveOffline { collection, data } => {
        if collection == PENDING_CHANGES {
          return Err(Error::Protocol(
            "pending changes are submitted with QUEUE_CHANGE".to_string(),
          ));
        }
        let stored = match data {
          Value::Array(records) => Value::Array(self.store.put_all(&collection, records)?),
          record => self.store.put(&collection, record)?,
        };
        Ok(Some(stored))
      }
      Message::GetOffline { collection } => Ok(Some(Value::Array(self.store.get_all(&collection)?))),
      Message::RequestSync => {
        self.sync.request_sync();
        Ok(None)
      }
      Message::SkipWaiting => {
        self.cache.skip_waiting().await?;
        Ok(None)
      }
      Message::QueueChange { operation, payload } => {
        let change = self.queue.enqueue(NewChange { operation, payload })?;
        Ok(Some(serde_json::to_value(change)?))
      }
      Message::DeleteOffline { collection, key } => {
        let deleted = self.store.delete(&collection, &key)?;
        Ok(Some(json!({ "deleted": deleted })))
      }
      Message::ClearOffline { collection } => {
        self.store.clear(&collection)?;
        Ok(None)
      }
      Message::GetSyncStatus => Ok(Some(serde_json::to_value(self.sync.status()?)?)),
    }
  }

  /// Event loop. Returns once every event sender is gone and in-flight
  /// handlers have finished.
  pub async fn run(self: Arc<Self>, mut events: EventHandler) {
    let mut tasks = JoinSet::new();
    info!("Worker running");

    loop {
      tokio::select! {
        event = events.next() => match event {
          Some(event) => self.spawn_dispatch(&mut tasks, event),
          None => break,
        },
        _ = self.sync.scheduled() => {
          self.spawn_dispatch(&mut tasks, Event::Sync(SyncTrigger::Requested));
        }
        Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_task(joined),
      }
    }

    while let Some(joined) = tasks.join_next().await {
      log_task(joined);
    }
    info!("Worker stopped");
  }

  fn spawn_dispatch(self: &Arc<Self>, tasks: &mut JoinSet<Result<()>>, event: Event) {
    let worker = Arc::clone(self);
    tasks.spawn(async move { worker.dispatch(event).await });
  }
}

fn log_task(joined: std::result::Result<Result<()>, tokio::task::JoinError>) {
  match joined {
    Ok(Ok(())) => {}
    Ok(Err(e)) => error!(error = %e, "Event handler failed"),
    Err(e) => error!(error = %e, "Event handler panicked"),
  }
}
