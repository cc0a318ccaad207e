// crates/ckan-core/src/source.rs
//
// Catalog addressing: the data source a request targets and the opaque
// reference that is looked up against it.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Connection parameters for one external catalog instance.
///
/// Owned by the caller; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Identifier of this source in the caller's registry.
    pub id: i64,
    /// Base action API URL, e.g. "https://cat.example/api/3/action".
    pub api_url: String,
    /// Optional port override applied on top of `api_url`.
    #[serde(default)]
    pub port: Option<u16>,
}

impl DataSource {
    pub fn new(id: i64, api_url: impl Into<String>) -> Self {
        Self {
            id,
            api_url: api_url.into(),
            port: None,
        }
    }

    /// Parse the API base into an absolute URL with the port override applied.
    ///
    /// The returned string never ends with `/` so operation suffixes can be
    /// appended directly.
    pub fn endpoint(&self) -> Result<String, AdapterError> {
        let trimmed = self.api_url.trim().trim_end_matches('/');
        let mut url = Url::parse(trimmed).map_err(|e| {
            AdapterError::Configuration(format!(
                "Invalid catalog API URL '{}': {}",
                self.api_url, e
            ))
        })?;

        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(AdapterError::Configuration(format!(
                "Catalog API URL '{}' is not an absolute http(s) URL",
                self.api_url
            )));
        }

        if let Some(port) = self.port {
            url.set_port(Some(port)).map_err(|_| {
                AdapterError::Configuration(format!(
                    "Cannot apply port {} to '{}'",
                    port, self.api_url
                ))
            })?;
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

/// An opaque catalog identifier plus the source it should be resolved against.
///
/// Whether it names a dataset or a single resource is unknown until looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReference {
    pub id: String,
    pub source: DataSource,
}

impl CatalogReference {
    pub fn new(id: impl Into<String>, source: DataSource) -> Result<Self, AdapterError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AdapterError::Configuration(
                "Catalog reference id must not be empty".to_string(),
            ));
        }
        Ok(Self { id, source })
    }
}
