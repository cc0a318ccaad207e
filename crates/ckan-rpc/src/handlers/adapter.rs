// crates/ckan-rpc/src/handlers/adapter.rs
//
// Adapter info handler: GetSupportedTypes.

use serde::{Deserialize, Serialize};

use ckan_assets::FileService;
use ckan_core::FileType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSupportedTypesRequest {}

/// Handle a GetSupportedTypes request.
pub async fn handle_get_supported_types(
    service: &FileService,
    _request: GetSupportedTypesRequest,
) -> Result<Vec<FileType>, String> {
    Ok(service.supported_types())
}
