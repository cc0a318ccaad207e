// crates/ckan-rpc/src/handlers/file.rs
//
// File handler: GetFile.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ckan_assets::FileService;
use ckan_core::FileType;

/// Request for the content behind a Distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFileRequest {
    pub distribution_id: Uuid,
}

/// Proxied file content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFileResponse {
    pub filename: String,
    pub filetype: Option<FileType>,
    /// Upstream body as text.
    pub result: String,
}

/// Handle a GetFile request.
///
/// The envelope carries JSON, so the streamed body is collected into a
/// string here; binary payloads come back lossily decoded.
pub async fn handle_get_file(
    service: &FileService,
    request: GetFileRequest,
) -> Result<GetFileResponse, String> {
    let file = service
        .open(request.distribution_id)
        .await
        .map_err(|e| e.to_string())?;

    let filename = file.filename.clone();
    let filetype = file.filetype.clone();
    let result = file.read_to_string().await.map_err(|e| e.to_string())?;

    Ok(GetFileResponse {
        filename,
        filetype,
        result,
    })
}
