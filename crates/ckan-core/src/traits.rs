// crates/ckan-core/src/traits.rs

use async_trait::async_trait;

use crate::catalog::{CatalogDatasetMetadata, CatalogResourceMetadata};
use crate::error::{AdapterError, PersistenceError};
use crate::persistence::{ExecuteMode, RowSet, SqlValue};
use crate::source::DataSource;

/// Read-only access to an external catalog's action API.
///
/// Implemented by ckan-catalog (`CkanClient`). One call is one network
/// round trip: no retries, no caching.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// `package_show` for `id`.
    ///
    /// `Ok(None)` means the catalog answered with `success: false`, i.e. the
    /// id does not name a package. That is a branch signal, not a failure.
    async fn fetch_package(
        &self,
        source: &DataSource,
        id: &str,
    ) -> Result<Option<CatalogDatasetMetadata>, AdapterError>;

    /// `resource_show` for `id`, with the same `Ok(None)` convention.
    async fn fetch_resource(
        &self,
        source: &DataSource,
        id: &str,
    ) -> Result<Option<CatalogResourceMetadata>, AdapterError>;
}

/// Parameterized statement execution against a relational store.
///
/// Implemented by ckan-store (`SqlGateway`). Every call acquires its own
/// connection, runs one statement as its own implicit transaction, and
/// releases the connection before returning.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Run `statement` with positional `params`.
    ///
    /// Read mode returns the result rows in order; write mode returns an
    /// empty row set.
    async fn execute(
        &self,
        statement: &str,
        params: &[SqlValue],
        mode: ExecuteMode,
    ) -> Result<RowSet, PersistenceError>;

    /// Shorthand for a read.
    async fn query(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<RowSet, PersistenceError> {
        self.execute(statement, params, ExecuteMode::Read).await
    }

    /// Shorthand for a write.
    async fn update(&self, statement: &str, params: &[SqlValue]) -> Result<(), PersistenceError> {
        self.execute(statement, params, ExecuteMode::Write).await.map(|_| ())
    }
}
