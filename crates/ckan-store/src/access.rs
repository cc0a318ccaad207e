// crates/ckan-store/src/access.rs
//
// AccessRecordStore: typed façade over the persistence gateway for the
// `accessinformation` table.
//
// Each operation is exactly one gateway call with a fixed statement shape.
// Untyped rows are mapped into `AccessRecord` here and never leave this
// module.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use ckan_core::traits::PersistenceGateway;
use ckan_core::{AccessRecord, PersistenceError, Row, SqlValue};

const INSERT_RECORD: &str = "INSERT INTO accessinformation \
     (created_at, updated_at, dataset_id, distribution_id, url, filename) \
     VALUES (?, ?, ?, ?, ?, ?)";

const DELETE_BY_DATASET: &str = "DELETE FROM accessinformation WHERE dataset_id = ?";

const SELECT_FILENAME: &str =
    "SELECT filename FROM accessinformation WHERE distribution_id = ? LIMIT 1";

const SELECT_BY_DISTRIBUTION: &str = "SELECT created_at, updated_at, dataset_id, \
     distribution_id, url, filename \
     FROM accessinformation WHERE distribution_id = ? LIMIT 1";

const SELECT_BY_DATASET: &str = "SELECT created_at, updated_at, dataset_id, \
     distribution_id, url, filename \
     FROM accessinformation WHERE dataset_id = ? ORDER BY created_at, distribution_id";

/// CRUD over access/provenance rows keyed by dataset and distribution id.
#[derive(Clone)]
pub struct AccessRecordStore {
    gateway: Arc<dyn PersistenceGateway>,
}

impl std::fmt::Debug for AccessRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessRecordStore").finish()
    }
}

impl AccessRecordStore {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Record that `distribution_id` of `dataset_id` is served from `url`.
    pub async fn insert(
        &self,
        dataset_id: Uuid,
        distribution_id: Uuid,
        url: &str,
        filename: &str,
    ) -> Result<(), PersistenceError> {
        let now = timestamp(Utc::now());
        self.gateway
            .update(
                INSERT_RECORD,
                &[
                    SqlValue::Text(now.clone()),
                    SqlValue::Text(now),
                    SqlValue::Text(dataset_id.to_string()),
                    SqlValue::Text(distribution_id.to_string()),
                    url.into(),
                    filename.into(),
                ],
            )
            .await
    }

    /// Remove every record of `dataset_id`. Succeeds when none exist.
    pub async fn delete_by_dataset(&self, dataset_id: Uuid) -> Result<(), PersistenceError> {
        self.gateway
            .update(DELETE_BY_DATASET, &[SqlValue::Text(dataset_id.to_string())])
            .await
    }

    /// Filename stored for the distribution (asset) `asset_id`.
    pub async fn find_filename_by_asset(
        &self,
        asset_id: Uuid,
    ) -> Result<Option<String>, PersistenceError> {
        let rows = self
            .gateway
            .query(SELECT_FILENAME, &[SqlValue::Text(asset_id.to_string())])
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get("filename"))
            .and_then(SqlValue::as_text)
            .map(str::to_string))
    }

    pub async fn find_by_distribution(
        &self,
        distribution_id: Uuid,
    ) -> Result<Option<AccessRecord>, PersistenceError> {
        let rows = self
            .gateway
            .query(
                SELECT_BY_DISTRIBUTION,
                &[SqlValue::Text(distribution_id.to_string())],
            )
            .await?;

        rows.first().map(record_from_row).transpose()
    }

    pub async fn list_by_dataset(
        &self,
        dataset_id: Uuid,
    ) -> Result<Vec<AccessRecord>, PersistenceError> {
        let rows = self
            .gateway
            .query(SELECT_BY_DATASET, &[SqlValue::Text(dataset_id.to_string())])
            .await?;

        rows.iter().map(record_from_row).collect()
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn record_from_row(row: &Row) -> Result<AccessRecord, PersistenceError> {
    Ok(AccessRecord {
        created_at: time_column(row, "created_at")?,
        updated_at: time_column(row, "updated_at")?,
        dataset_id: uuid_column(row, "dataset_id")?,
        distribution_id: uuid_column(row, "distribution_id")?,
        url: text_column(row, "url")?.to_string(),
        filename: text_column(row, "filename")?.to_string(),
    })
}

fn text_column<'a>(row: &'a Row, name: &str) -> Result<&'a str, PersistenceError> {
    row.get(name)
        .and_then(SqlValue::as_text)
        .ok_or_else(|| {
            PersistenceError::execution(format!("Access record column '{}' missing", name))
        })
}

fn uuid_column(row: &Row, name: &str) -> Result<Uuid, PersistenceError> {
    let raw = text_column(row, name)?;
    Uuid::parse_str(raw).map_err(|e| {
        PersistenceError::execution(format!("Access record column '{}' is not a UUID: {}", name, e))
    })
}

fn time_column(row: &Row, name: &str) -> Result<DateTime<Utc>, PersistenceError> {
    let raw = text_column(row, name)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            PersistenceError::execution(format!(
                "Access record column '{}' is not RFC 3339: {}",
                name, e
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::init_schema;
    use crate::sql::SqlGateway;

    async fn store() -> AccessRecordStore {
        let gateway = SqlGateway::in_memory().await.unwrap();
        init_schema(&gateway).await.unwrap();
        AccessRecordStore::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn insert_then_find_by_distribution() {
        let store = store().await;
        let dataset_id = Uuid::now_v7();
        let distribution_id = Uuid::now_v7();

        store
            .insert(dataset_id, distribution_id, "https://files.example/a.json", "a.json")
            .await
            .unwrap();

        let record = store
            .find_by_distribution(distribution_id)
            .await
            .unwrap()
            .expect("record should exist");
        assert_eq!(record.dataset_id, dataset_id);
        assert_eq!(record.url, "https://files.example/a.json");
        assert_eq!(record.filename, "a.json");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn find_filename_by_asset() {
        let store = store().await;
        let distribution_id = Uuid::now_v7();
        store
            .insert(Uuid::now_v7(), distribution_id, "https://files.example/b", "b.csv")
            .await
            .unwrap();

        assert_eq!(
            store.find_filename_by_asset(distribution_id).await.unwrap(),
            Some("b.csv".to_string())
        );
        assert_eq!(store.find_filename_by_asset(Uuid::now_v7()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_by_dataset_removes_all_and_is_idempotent() {
        let store = store().await;
        let dataset_id = Uuid::now_v7();
        let other_dataset = Uuid::now_v7();

        for _ in 0..3 {
            store
                .insert(dataset_id, Uuid::now_v7(), "https://files.example/x", "x")
                .await
                .unwrap();
        }
        store
            .insert(other_dataset, Uuid::now_v7(), "https://files.example/y", "y")
            .await
            .unwrap();
        assert_eq!(store.list_by_dataset(dataset_id).await.unwrap().len(), 3);

        store.delete_by_dataset(dataset_id).await.unwrap();
        assert!(store.list_by_dataset(dataset_id).await.unwrap().is_empty());
        assert_eq!(store.list_by_dataset(other_dataset).await.unwrap().len(), 1);

        // Second delete with nothing left still succeeds.
        store.delete_by_dataset(dataset_id).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_row_is_execution_error() {
        let gateway = SqlGateway::in_memory().await.unwrap();
        init_schema(&gateway).await.unwrap();
        gateway
            .update(
                "INSERT INTO accessinformation VALUES ('yesterday', 'yesterday', 'd', ?, 'u', 'f')",
                &[SqlValue::Text(Uuid::nil().to_string())],
            )
            .await
            .unwrap();

        let store = AccessRecordStore::new(Arc::new(gateway));
        let err = store.find_by_distribution(Uuid::nil()).await.unwrap_err();
        assert_eq!(err.phase, ckan_core::PersistencePhase::Execution);
    }
}
