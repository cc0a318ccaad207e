// crates/ckan-assets/src/file.rs
//
// File proxy: looks up a Distribution's access record and streams the
// upstream content without buffering it whole.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use ckan_core::{AdapterError, FileType};
use ckan_store::AccessRecordStore;

/// File types the adapter advertises as supported.
pub const SUPPORTED_TYPES: [FileType; 3] = [FileType::Json, FileType::Xml, FileType::Txt];

/// Serves the content behind persisted Distributions.
#[derive(Debug, Clone)]
pub struct FileService {
    records: AccessRecordStore,
    client: reqwest::Client,
}

impl FileService {
    pub fn new(records: AccessRecordStore, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { records, client }
    }

    pub fn supported_types(&self) -> Vec<FileType> {
        SUPPORTED_TYPES.to_vec()
    }

    /// Open the upstream content of `distribution_id` for streaming.
    pub async fn open(&self, distribution_id: Uuid) -> Result<RemoteFile, AdapterError> {
        let record = self
            .records
            .find_by_distribution(distribution_id)
            .await?
            .ok_or_else(|| {
                AdapterError::NotFound(format!(
                    "No access record for distribution {}",
                    distribution_id
                ))
            })?;

        tracing::info!("Proxying {} from {}", record.filename, record.url);

        let response = self
            .client
            .get(&record.url)
            .send()
            .await
            .map_err(|e| {
                AdapterError::Transport(format!("Fetching {} failed: {}", record.url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Transport(format!(
                "Upstream {} answered {}",
                record.url, status
            )));
        }

        let filetype = Path::new(&record.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| FileType::from_format(Some(ext)));

        Ok(RemoteFile {
            filename: record.filename,
            filetype,
            response,
        })
    }
}

/// An open upstream response.
#[derive(Debug)]
pub struct RemoteFile {
    pub filename: String,
    pub filetype: Option<FileType>,
    response: reqwest::Response,
}

impl RemoteFile {
    /// Length announced by the upstream, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Next body chunk, `None` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, AdapterError> {
        self.response
            .chunk()
            .await
            .map_err(|e| {
                AdapterError::Transport(format!("Reading {} failed: {}", self.filename, e))
            })
    }

    /// Stream the whole body into `sink`, returning the byte count.
    pub async fn copy_to<W>(mut self, sink: &mut W) -> Result<u64, AdapterError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }

    /// Collect the body as text, replacing invalid UTF-8.
    pub async fn read_to_string(self) -> Result<String, AdapterError> {
        let mut buf = Vec::new();
        self.copy_to(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
