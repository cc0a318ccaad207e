// crates/ckan-rpc/src/handlers/asset.rs
//
// Asset handlers: CreateAsset, DeleteAsset.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ckan_assets::AssetService;
use ckan_core::{CatalogReference, DataSource, Dataset};

// ---------------------------------------------------------------------------
// CreateAsset
// ---------------------------------------------------------------------------

/// Request to resolve a catalog reference into a Dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    /// Dataset id or resource id in the remote catalog.
    pub resource_id: String,
    /// The catalog to resolve against.
    pub data_source: DataSource,
}

/// Handle a CreateAsset request.
///
/// Resolution failures are reported as the bare `resolution failed`
/// message; stage and cause go to the log only.
pub async fn handle_create_asset(
    service: &AssetService,
    request: CreateAssetRequest,
) -> Result<Dataset, String> {
    let reference = CatalogReference::new(request.resource_id, request.data_source)
        .map_err(|e| e.to_string())?;

    service.create(&reference).await.map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// DeleteAsset
// ---------------------------------------------------------------------------

/// Request to drop the access records of a Dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAssetRequest {
    pub dataset_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAssetResponse {
    pub status: String,
}

pub async fn handle_delete_asset(
    service: &AssetService,
    request: DeleteAssetRequest,
) -> Result<DeleteAssetResponse, String> {
    service
        .delete(request.dataset_id)
        .await
        .map_err(|e| format!("Failed to delete dataset {}: {}", request.dataset_id, e))?;

    Ok(DeleteAssetResponse {
        status: "success".to_string(),
    })
}
