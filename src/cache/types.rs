//! Request, response, and entry types for the asset cache.

use chrono::{DateTime, Utc};
use reqwest::Method;
use url::Url;

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct AssetRequest {
  pub method: Method,
  pub url: Url,
  /// Top-level document load (as opposed to a subresource)
  pub navigation: bool,
  pub body: Option<Vec<u8>>,
}

impl AssetRequest {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      navigation: false,
      body: None,
    }
  }

  pub fn navigate(url: Url) -> Self {
    Self {
      navigation: true,
      ..Self::get(url)
    }
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }
}

/// Indicates where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  /// Fresh from the network
  Network,
  /// Network failed, served from the cache
  Cache,
  /// Network failed on a navigation with no cached copy
  OfflineDocument,
  /// Synthetic 503, nothing to serve
  Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
  pub source: ResponseSource,
}

impl AssetResponse {
  pub fn from_network(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
    Self {
      status,
      content_type,
      body,
      source: ResponseSource::Network,
    }
  }

  /// Terminal result for a non-navigation request that missed the cache.
  pub fn unavailable() -> Self {
    Self {
      status: 503,
      content_type: Some("text/plain".to_string()),
      body: b"Service Unavailable".to_vec(),
      source: ResponseSource::Unavailable,
    }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// One stored response, keyed by normalized URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
  pub key: String,
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl CacheEntry {
  pub fn from_response(key: String, response: &AssetResponse) -> Self {
    Self {
      key,
      status: response.status,
      content_type: response.content_type.clone(),
      body: response.body.clone(),
    }
  }

  pub fn into_response(self, source: ResponseSource) -> AssetResponse {
    AssetResponse {
      status: self.status,
      content_type: self.content_type,
      body: self.body,
      source,
    }
  }
}

/// A cache entry with its storage timestamp.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub entry: CacheEntry,
  pub cached_at: DateTime<Utc>,
}
