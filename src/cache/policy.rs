//! Which requests are cached, and under which key.

use url::Url;

use crate::config::{AppConfig, CacheConfig};

/// Resolved cache rules for one deployed version.
#[derive(Debug, Clone)]
pub struct CachePolicy {
  /// Cache name; also the version tag compared on activation
  pub version: String,
  pub origin: Url,
  pub precache: Vec<Url>,
  pub offline_document: Url,
  static_extensions: Vec<String>,
  excluded_prefixes: Vec<String>,
}

impl CachePolicy {
  pub fn from_config(app: &AppConfig, cache: &CacheConfig) -> Result<Self, url::ParseError> {
    let origin = Url::parse(&app.origin)?;
    let precache = cache
      .precache
      .iter()
      .map(|p| origin.join(p))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      version: cache.version.clone(),
      offline_document: origin.join(&cache.offline_document)?,
      origin,
      precache,
      static_extensions: cache.static_extensions.clone(),
      excluded_prefixes: cache.excluded_prefixes.clone(),
    })
  }

  /// Resolve a possibly relative URL against the app origin.
  pub fn resolve(&self, url: &str) -> Result<Url, url::ParseError> {
    self.origin.join(url)
  }

  /// Normalized cache key: absolute URL without fragment.
  pub fn cache_key(&self, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
  }

  /// Whether the URL's extension is in the static-asset allow-list.
  pub fn is_static_asset(&self, url: &Url) -> bool {
    let last = url.path().rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
      Some((stem, ext)) if !stem.is_empty() => {
        let ext = ext.to_lowercase();
        self.static_extensions.iter().any(|e| *e == ext)
      }
      _ => false,
    }
  }

  /// Whether the request must bypass the cache entirely. Prefixes match whole
  /// path segments, so `/ws` covers `/ws/updates` but not `/wsdl.js`.
  pub fn is_excluded(&self, url: &Url) -> bool {
    let path = url.path();
    self.excluded_prefixes.iter().any(|prefix| {
      let prefix = prefix.trim_end_matches('/');
      path == prefix
        || path
          .strip_prefix(prefix)
          .is_some_and(|rest| rest.starts_with('/'))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn policy() -> CachePolicy {
    CachePolicy::from_config(&AppConfig::default(), &CacheConfig::default()).unwrap()
  }

  #[test]
  fn test_precache_resolves_against_origin() {
    let policy = policy();
    assert_eq!(policy.precache[0].as_str(), "http://localhost:3000/");
    assert_eq!(
      policy.offline_document.as_str(),
      "http://localhost:3000/offline.html"
    );
  }

  #[test]
  fn test_cache_key_drops_fragment() {
    let policy = policy();
    let url = policy.resolve("/static/app.js?v=3#top").unwrap();
    assert_eq!(
      policy.cache_key(&url),
      "http://localhost:3000/static/app.js?v=3"
    );
  }

  #[test]
  fn test_static_asset_allow_list() {
    let policy = policy();
    let check = |p: &str| policy.is_static_asset(&policy.resolve(p).unwrap());

    assert!(check("/static/app.js"));
    assert!(check("/img/Logo.PNG"));
    assert!(check("/app.css?v=2"));
    assert!(!check("/recipes"));
    assert!(!check("/index.html"));
    assert!(!check("/.js"));
    assert!(!check("/api/shopping.list"));
  }

  #[test]
  fn test_excluded_prefixes() {
    let policy = policy();
    assert!(policy.is_excluded(&policy.resolve("/socket.io/?EIO=4").unwrap()));
    assert!(policy.is_excluded(&policy.resolve("/ws/updates.js").unwrap()));
    assert!(policy.is_excluded(&policy.resolve("/ws").unwrap()));
    assert!(!policy.is_excluded(&policy.resolve("/static/ws.js").unwrap()));
    assert!(!policy.is_excluded(&policy.resolve("/wsdl.js").unwrap()));
    assert!(!policy.is_excluded(&policy.resolve("/wsicon.png").unwrap()));
  }
}
