//! Scripted fakes for the network-facing traits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

use crate::cache::{AssetRequest, AssetResponse, Network};
use crate::error::NetworkError;
use crate::notify::{NotificationCenter, NotificationDispatcher, WindowRegistry};
use crate::queue::PendingChange;
use crate::sync::SyncBackend;

pub fn origin() -> Url {
  Url::parse("http://localhost:3000").unwrap()
}

pub fn dispatcher() -> NotificationDispatcher {
  NotificationDispatcher::new(
    Arc::new(NotificationCenter::new()),
    Arc::new(WindowRegistry::new()),
    origin(),
  )
}

/// Static web server that can be switched off.
#[derive(Default)]
pub struct FakeNetwork {
  routes: Mutex<HashMap<String, (String, Vec<u8>)>>,
  offline: AtomicBool,
  requests: AtomicUsize,
}

impl FakeNetwork {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn serve(&self, url: &str, content_type: &str, body: &[u8]) {
    self
      .routes
      .lock()
      .unwrap()
      .insert(url.to_string(), (content_type.to_string(), body.to_vec()));
  }

  pub fn go_offline(&self) {
    self.offline.store(true, Ordering::SeqCst);
  }

  pub fn request_count(&self) -> usize {
    self.requests.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Network for FakeNetwork {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
    self.requests.fetch_add(1, Ordering::SeqCst);
    if self.offline.load(Ordering::SeqCst) {
      return Err(NetworkError::Transport("network unreachable".to_string()));
    }

    let mut url = request.url.clone();
    url.set_fragment(None);

    let routes = self.routes.lock().unwrap();
    Ok(match routes.get(url.as_str()) {
      Some((content_type, body)) => {
        AssetResponse::from_network(200, Some(content_type.clone()), body.clone())
      }
      None => AssetResponse::from_network(404, None, Vec::new()),
    })
  }
}

/// Pauses a push until released, announcing when it started.
#[derive(Clone, Default)]
pub struct Gate {
  pub started: Arc<Notify>,
  pub release: Arc<Notify>,
}

/// Sync endpoint that accepts everything unless told otherwise.
#[derive(Default)]
pub struct FakeBackend {
  pushed: Mutex<Vec<PendingChange>>,
  rejects: Mutex<HashMap<String, u16>>,
  offline: AtomicBool,
  gate: Mutex<Option<Gate>>,
}

impl FakeBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reject changes whose payload `name` matches, with the given status.
  pub fn reject_named(&self, name: &str, status: u16) {
    self.rejects.lock().unwrap().insert(name.to_string(), status);
  }

  pub fn accept_all(&self) {
    self.rejects.lock().unwrap().clear();
    self.offline.store(false, Ordering::SeqCst);
  }

  pub fn go_offline(&self) {
    self.offline.store(true, Ordering::SeqCst);
  }

  pub fn gate(&self) -> Gate {
    let gate = Gate::default();
    *self.gate.lock().unwrap() = Some(gate.clone());
    gate
  }

  /// Payload names of every attempted push, in order.
  pub fn pushed_names(&self) -> Vec<String> {
    self
      .pushed
      .lock()
      .unwrap()
      .iter()
      .map(|c| c.payload["name"].as_str().unwrap_or_default().to_string())
      .collect()
  }
}

#[async_trait]
impl SyncBackend for FakeBackend {
  async fn push(&self, change: &PendingChange) -> Result<(), NetworkError> {
    self.pushed.lock().unwrap().push(change.clone());

    let gate = self.gate.lock().unwrap().clone();
    if let Some(gate) = gate {
      gate.started.notify_one();
      gate.release.notified().await;
    }

    if self.offline.load(Ordering::SeqCst) {
      return Err(NetworkError::Transport("connection refused".to_string()));
    }

    let name = change.payload["name"].as_str().unwrap_or_default();
    match self.rejects.lock().unwrap().get(name) {
      Some(status) => Err(NetworkError::Status(*status)),
      None => Ok(()),
    }
  }
}
