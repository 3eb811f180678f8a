//! Network access used by the cache manager.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use super::types::{AssetRequest, AssetResponse};
use crate::error::NetworkError;

/// Performs requests on behalf of the cache manager.
///
/// Any HTTP status is a response; only transport failures and timeouts are
/// errors.
#[async_trait]
pub trait Network: Send + Sync {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError>;
}

/// reqwest-backed network with a per-request timeout.
#[derive(Clone)]
pub struct HttpNetwork {
  client: reqwest::Client,
}

impl HttpNetwork {
  pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl Network for HttpNetwork {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
    let mut builder = self
      .client
      .request(request.method.clone(), request.url.clone());
    if let Some(body) = &request.body {
      builder = builder.body(body.clone());
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response.bytes().await?.to_vec();

    Ok(AssetResponse::from_network(status, content_type, body))
  }
}
