// crates/ckan-assets/src/service.rs
//
// AssetService: create and delete entry points used by the RPC layer.

use uuid::Uuid;

use ckan_core::{AdapterError, CatalogReference, Dataset, ResolutionError};
use ckan_store::AccessRecordStore;

use crate::pipeline::AssetResolutionPipeline;

#[derive(Debug, Clone)]
pub struct AssetService {
    pipeline: AssetResolutionPipeline,
}

impl AssetService {
    pub fn new(pipeline: AssetResolutionPipeline) -> Self {
        Self { pipeline }
    }

    fn records(&self) -> &AccessRecordStore {
        self.pipeline.records()
    }

    /// Resolve a catalog reference and persist its access records.
    pub async fn create(&self, reference: &CatalogReference) -> Result<Dataset, ResolutionError> {
        self.pipeline.resolve(reference).await
    }

    /// Drop every access record of `dataset_id`. Deleting an unknown
    /// dataset succeeds.
    pub async fn delete(&self, dataset_id: Uuid) -> Result<(), AdapterError> {
        self.records().delete_by_dataset(dataset_id).await?;
        tracing::info!("Removed access records of dataset {}", dataset_id);
        Ok(())
    }
}
