// crates/ckan-store/src/schema.rs
//
// Table bootstrap for the access-information store.

use ckan_core::traits::PersistenceGateway;
use ckan_core::PersistenceError;

/// One row per canonical Distribution.
pub const CREATE_ACCESS_TABLE: &str = "CREATE TABLE IF NOT EXISTS accessinformation (\
     created_at TEXT NOT NULL, \
     updated_at TEXT NOT NULL, \
     dataset_id TEXT NOT NULL, \
     distribution_id TEXT NOT NULL, \
     url TEXT NOT NULL, \
     filename TEXT NOT NULL)";

pub const CREATE_DATASET_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS accessinformation_dataset_idx ON accessinformation (dataset_id)";

pub const CREATE_DISTRIBUTION_INDEX: &str = "CREATE INDEX IF NOT EXISTS \
     accessinformation_distribution_idx ON accessinformation (distribution_id)";

/// Create the access-information table and its indexes if absent.
pub async fn init_schema(gateway: &dyn PersistenceGateway) -> Result<(), PersistenceError> {
    for statement in [
        CREATE_ACCESS_TABLE,
        CREATE_DATASET_INDEX,
        CREATE_DISTRIBUTION_INDEX,
    ] {
        gateway.update(statement, &[]).await.map_err(|e| {
            tracing::error!("Table creation failed: {}", e);
            e
        })?;
    }
    tracing::info!("Access information schema ready");
    Ok(())
}
