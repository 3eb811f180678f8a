//! Cache manager: asset lifecycle and network-first request handling.

use reqwest::Method;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::network::Network;
use super::policy::CachePolicy;
use super::storage::CacheStorage;
use super::types::{AssetRequest, AssetResponse, CacheEntry, ResponseSource};
use crate::error::{Error, NetworkError, Result, StorageError};

/// Lifecycle of one cache version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  /// Precaching assets
  Installing,
  /// Installed, waiting to take control
  Waiting,
  /// Evicting caches of other versions
  Activating,
  /// Serving requests
  Active,
  /// Install or activation failed; the previous version stays in charge
  Redundant,
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      LifecycleState::Installing => "installing",
      LifecycleState::Waiting => "waiting",
      LifecycleState::Activating => "activating",
      LifecycleState::Active => "active",
      LifecycleState::Redundant => "redundant",
    };
    f.write_str(s)
  }
}

/// Serves static assets network-first, falling back to the cache and then to
/// the offline document.
///
/// Distinct requests are independent: handling one never waits on another.
///
/// Until this version activates, requests are served from the cache that was
/// in control before it (if any); a failed install or a waiting version never
/// takes that cache away.
pub struct CacheManager<S: CacheStorage> {
  storage: Arc<S>,
  network: Arc<dyn Network>,
  policy: CachePolicy,
  state: Mutex<LifecycleState>,
  /// Cache that serves requests until activation
  controlling: Mutex<Option<String>>,
}

impl<S: CacheStorage> CacheManager<S> {
  pub fn new(storage: S, network: Arc<dyn Network>, policy: CachePolicy) -> Self {
    Self {
      storage: Arc::new(storage),
      network,
      policy,
      state: Mutex::new(LifecycleState::Installing),
      controlling: Mutex::new(None),
    }
  }

  pub fn policy(&self) -> &CachePolicy {
    &self.policy
  }

  pub fn state(&self) -> LifecycleState {
    *self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn set_state(&self, next: LifecycleState) {
    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
    let prev = *state;
    debug!(from = %prev, to = %next, "Cache lifecycle transition");
    *state = next;
  }

  /// Fetch and store every precache asset. All or nothing.
  pub async fn install(&self) -> Result<()> {
    self.set_state(LifecycleState::Installing);
    let previous = self.newest_existing_cache();
    debug!(previous = ?previous, "Cache in control during install");
    *self.controlling.lock().unwrap_or_else(|e| e.into_inner()) = previous;

    match self.precache().await {
      Ok(count) => {
        info!(version = %self.policy.version, assets = count, "Installed cache version");
        self.set_state(LifecycleState::Waiting);
        Ok(())
      }
      Err(e) => {
        warn!(version = %self.policy.version, error = %e, "Cache install failed");
        self.set_state(LifecycleState::Redundant);
        Err(e)
      }
    }
  }

  async fn precache(&self) -> Result<usize> {
    let mut entries = Vec::with_capacity(self.policy.precache.len());

    for url in &self.policy.precache {
      let response = self
        .network
        .fetch(&AssetRequest::get(url.clone()))
        .await
        .map_err(|e| Error::Lifecycle(format!("failed to precache {}: {}", url, e)))?;

      if !response.is_success() {
        return Err(Error::Lifecycle(format!(
          "failed to precache {}: status {}",
          url, response.status
        )));
      }

      entries.push(CacheEntry::from_response(self.policy.cache_key(url), &response));
    }

    self
      .storage
      .put_all(&self.policy.version, &entries)
      .map_err(|e| Error::Lifecycle(format!("failed to store precached assets: {}", e)))?;

    Ok(entries.len())
  }

  /// Take control: evict every cache whose name differs from the current version.
  pub async fn activate(&self) -> Result<()> {
    let state = self.state();
    if state != LifecycleState::Waiting {
      return Err(Error::Lifecycle(format!("cannot activate from state {}", state)));
    }

    self.set_state(LifecycleState::Activating);

    match self.evict_stale_caches() {
      Ok(evicted) => {
        info!(version = %self.policy.version, evicted = ?evicted, "Activated cache version");
        *self.controlling.lock().unwrap_or_else(|e| e.into_inner()) =
          Some(self.policy.version.clone());
        self.set_state(LifecycleState::Active);
        Ok(())
      }
      Err(e) => {
        warn!(version = %self.policy.version, error = %e, "Cache activation failed");
        self.set_state(LifecycleState::Redundant);
        Err(e)
      }
    }
  }

  fn evict_stale_caches(&self) -> Result<Vec<String>> {
    let lifecycle = |e: StorageError| Error::Lifecycle(format!("failed to evict old caches: {}", e));

    let stale: Vec<String> = self
      .storage
      .cache_names()
      .map_err(lifecycle)?
      .into_iter()
      .filter(|name| *name != self.policy.version)
      .collect();

    for name in &stale {
      self.storage.delete_cache(name).map_err(lifecycle)?;
    }
    Ok(stale)
  }

  /// The current version's cache if it survives from an earlier run, else the
  /// most recently created other cache.
  fn newest_existing_cache(&self) -> Option<String> {
    let names = match self.storage.cache_names() {
      Ok(names) => names,
      Err(e) => {
        warn!(error = %e, "Could not list existing caches");
        return None;
      }
    };

    if names.iter().any(|name| *name == self.policy.version) {
      return Some(self.policy.version.clone());
    }
    names.into_iter().last()
  }

  /// Name of the cache requests are currently served from.
  pub fn controlling_cache(&self) -> Option<String> {
    if self.state() == LifecycleState::Active {
      return Some(self.policy.version.clone());
    }
    self.controlling.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  /// Activate right away if a version is waiting. Returns whether it did.
  pub async fn skip_waiting(&self) -> Result<bool> {
    if self.state() != LifecycleState::Waiting {
      return Ok(false);
    }
    self.activate().await?;
    Ok(true)
  }

  /// Handle an intercepted request.
  ///
  /// Non-GET requests and excluded paths go straight to the network and their
  /// failures are returned as-is. Every other request resolves to a response:
  /// network, cached copy, offline document, or a synthetic 503.
  pub async fn handle(&self, request: &AssetRequest) -> std::result::Result<AssetResponse, NetworkError> {
    if request.method != Method::GET || self.policy.is_excluded(&request.url) {
      return self.network.fetch(request).await;
    }

    let key = self.policy.cache_key(&request.url);

    match self.network.fetch(request).await {
      Ok(response) => {
        if response.is_success() && self.policy.is_static_asset(&request.url) {
          if let Some(cache) = self.controlling_cache() {
            let entry = CacheEntry::from_response(key, &response);
            if let Err(e) = self.storage.put(&cache, &entry) {
              warn!(url = %request.url, error = %e, "Failed to cache response");
            }
          }
        }
        Ok(response)
      }
      Err(e) => {
        debug!(url = %request.url, error = %e, "Network failed, trying cache");
        Ok(self.fallback(request, &key))
      }
    }
  }

  fn fallback(&self, request: &AssetRequest, key: &str) -> AssetResponse {
    if let Some(entry) = self.lookup(key) {
      return entry.into_response(ResponseSource::Cache);
    }

    if request.navigation {
      let offline_key = self.policy.cache_key(&self.policy.offline_document);
      if let Some(entry) = self.lookup(&offline_key) {
        return entry.into_response(ResponseSource::OfflineDocument);
      }
    }

    AssetResponse::unavailable()
  }

  fn lookup(&self, key: &str) -> Option<CacheEntry> {
    let cache = self.controlling_cache()?;
    match self.storage.lookup(&cache, key) {
      Ok(Some(hit)) => {
        debug!(key, cache = %cache, cached_at = %hit.cached_at, "Serving cached copy");
        Some(hit.entry)
      }
      Ok(None) => None,
      Err(e) => {
        warn!(key, error = %e, "Cache lookup failed");
        None
      }
    }
  }
}
