// crates/ckan-catalog/src/client.rs
//
// CKAN action API client.
// Uses reqwest to issue `package_show` / `resource_show` queries and unwraps
// the `{ "success": bool, "result": {...} }` envelope.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use ckan_core::traits::CatalogSource;
use ckan_core::{AdapterError, CatalogDatasetMetadata, CatalogResourceMetadata, DataSource};

/// Default per-request timeout. The catalog protocol itself has none; a hung
/// catalog would otherwise stall a resolution forever.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The two catalog operations the adapter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOperation {
    PackageShow,
    ResourceShow,
}

impl CatalogOperation {
    /// Path suffix appended to the API base.
    pub fn path(&self) -> &'static str {
        match self {
            CatalogOperation::PackageShow => "/package_show",
            CatalogOperation::ResourceShow => "/resource_show",
        }
    }
}

/// Response envelope of every CKAN action.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
}

/// Catalog client for a CKAN-compatible action API.
///
/// Stateless apart from the pooled HTTP client; the data source is passed
/// per call so one client serves every configured catalog.
#[derive(Debug, Clone)]
pub struct CkanClient {
    client: reqwest::Client,
}

impl CkanClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Build the query URL: `<api base><operation>?id=<id>`.
    pub fn query_url(
        source: &DataSource,
        operation: CatalogOperation,
        id: &str,
    ) -> Result<Url, AdapterError> {
        let base = source.endpoint()?;
        let mut url = Url::parse(&format!("{}{}", base, operation.path())).map_err(|e| {
            AdapterError::Configuration(format!("Invalid catalog query URL for '{}': {}", base, e))
        })?;
        url.query_pairs_mut().append_pair("id", id);
        Ok(url)
    }

    /// Issue one query and return the decorated `result` object.
    ///
    /// `Ok(None)` when the envelope reports `success: false`.
    async fn query(
        &self,
        source: &DataSource,
        operation: CatalogOperation,
        id: &str,
    ) -> Result<Option<Value>, AdapterError> {
        let url = Self::query_url(source, operation, id)?;
        tracing::info!("Querying {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                AdapterError::Transport(format!("Catalog request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AdapterError::Transport(format!("Catalog response body from {} unreadable: {}", url, e))
        })?;

        let envelope = serde_json::from_str::<Envelope>(&body).ok();

        match envelope {
            Some(Envelope { success: false, .. }) => {
                tracing::debug!("Catalog reports {} as not resolvable ({})", url, status);
                Ok(None)
            }
            _ if !status.is_success() => Err(AdapterError::Transport(format!(
                "Catalog query {} failed ({}): {}",
                url,
                status,
                snippet(&body)
            ))),
            Some(Envelope {
                success: true,
                result: Some(Value::Object(mut result)),
            }) => {
                result.insert("originalURL".to_string(), Value::String(url.to_string()));
                Ok(Some(Value::Object(result)))
            }
            Some(_) => Err(AdapterError::Serialization(format!(
                "Catalog response from {} has no result object",
                url
            ))),
            None => Err(AdapterError::Serialization(format!(
                "Catalog response from {} is not a CKAN envelope: {}",
                url,
                snippet(&body)
            ))),
        }
    }
}

impl Default for CkanClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl CatalogSource for CkanClient {
    async fn fetch_package(
        &self,
        source: &DataSource,
        id: &str,
    ) -> Result<Option<CatalogDatasetMetadata>, AdapterError> {
        match self.query(source, CatalogOperation::PackageShow, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn fetch_resource(
        &self,
        source: &DataSource,
        id: &str,
    ) -> Result<Option<CatalogResourceMetadata>, AdapterError> {
        match self.query(source, CatalogOperation::ResourceShow, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

/// First part of a response body for error messages.
fn snippet(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
