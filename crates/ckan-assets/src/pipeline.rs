// crates/ckan-assets/src/pipeline.rs
//
// Asset resolution pipeline.
//
// A catalog reference is either a dataset (package) id or a resource id.
// The pipeline tries `package_show` first; a hit resolves the whole
// dataset from that lookup, a miss falls back to `resource_show` and
// the owning package. Every Distribution built gets its access record
// written before the Dataset is returned.
//
// Per-resource build+persist units run concurrently on a JoinSet. The
// pipeline always waits for every unit, so no write is still in flight
// when it reports. Records committed before a failure are not rolled back.

use std::sync::Arc;

use tokio::task::JoinSet;
use uuid::Uuid;

use ckan_core::traits::CatalogSource;
use ckan_core::{
    AdapterError, CatalogDatasetMetadata, CatalogReference, CatalogResource, DataSource,
    Dataset, DatasetStatus, Distribution, FileType, ResolutionError, ResolutionStage,
};
use ckan_store::AccessRecordStore;

use crate::filename::derive_filename;

/// Resolves catalog references into canonical Datasets.
#[derive(Clone)]
pub struct AssetResolutionPipeline {
    catalog: Arc<dyn CatalogSource>,
    records: AccessRecordStore,
    strict_resource_lookup: bool,
}

impl std::fmt::Debug for AssetResolutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResolutionPipeline")
            .field("records", &self.records)
            .field("strict_resource_lookup", &self.strict_resource_lookup)
            .finish()
    }
}

impl AssetResolutionPipeline {
    pub fn new(catalog: Arc<dyn CatalogSource>, records: AccessRecordStore) -> Self {
        Self {
            catalog,
            records,
            strict_resource_lookup: true,
        }
    }

    /// When true (the default), a resource id that is missing from its
    /// owning package's resource list fails the resolution. When false the
    /// Dataset is returned with no distributions.
    pub fn with_strict_resource_lookup(mut self, strict: bool) -> Self {
        self.strict_resource_lookup = strict;
        self
    }

    pub fn records(&self) -> &AccessRecordStore {
        &self.records
    }

    /// Resolve `reference` into a Dataset and persist one access record per
    /// Distribution.
    pub async fn resolve(&self, reference: &CatalogReference) -> Result<Dataset, ResolutionError> {
        tracing::info!(
            "Resolving '{}' against source {}",
            reference.id,
            reference.source.id
        );

        let result = self.resolve_reference(reference).await;
        match &result {
            Ok(dataset) => tracing::info!(
                "Resolved '{}' into dataset {} with {} distribution(s)",
                reference.id,
                dataset.resource_id,
                dataset.distributions.len()
            ),
            Err(e) => tracing::error!("Resolution of '{}' failed: {}", reference.id, e.detail()),
        }
        result
    }

    async fn resolve_reference(
        &self,
        reference: &CatalogReference,
    ) -> Result<Dataset, ResolutionError> {
        let source = &reference.source;

        // The first lookup doubles as the dataset metadata.
        let lookup = self
            .catalog
            .fetch_package(source, &reference.id)
            .await
            .map_err(|e| ResolutionError::new(ResolutionStage::Disambiguation, e))?;

        match lookup {
            Some(package) => {
                tracing::debug!("'{}' is a dataset id", reference.id);
                self.resolve_dataset(source, package).await
            }
            None => {
                tracing::debug!("'{}' is not a dataset id, trying resource", reference.id);
                self.resolve_resource(source, &reference.id).await
            }
        }
    }

    async fn resolve_dataset(
        &self,
        source: &DataSource,
        mut package: CatalogDatasetMetadata,
    ) -> Result<Dataset, ResolutionError> {
        let descriptors = std::mem::take(&mut package.resources);
        let mut dataset = dataset_from_package(source, &package);
        dataset.distributions = self
            .build_distributions(dataset.resource_id, dataset.license.clone(), descriptors)
            .await?;
        Ok(dataset)
    }

    async fn resolve_resource(
        &self,
        source: &DataSource,
        resource_id: &str,
    ) -> Result<Dataset, ResolutionError> {
        let resource = self
            .catalog
            .fetch_resource(source, resource_id)
            .await
            .map_err(|e| ResolutionError::new(ResolutionStage::MetadataFetch, e))?
            .ok_or_else(|| {
                ResolutionError::new(
                    ResolutionStage::MetadataFetch,
                    AdapterError::NotResolvable(format!(
                        "'{}' is neither a dataset nor a resource",
                        resource_id
                    )),
                )
            })?;

        let mut package = self
            .catalog
            .fetch_package(source, &resource.package_id)
            .await
            .map_err(|e| ResolutionError::new(ResolutionStage::MetadataFetch, e))?
            .ok_or_else(|| {
                ResolutionError::new(
                    ResolutionStage::MetadataFetch,
                    AdapterError::NotResolvable(format!(
                        "Owning dataset '{}' of resource '{}' not found",
                        resource.package_id, resource_id
                    )),
                )
            })?;

        let descriptor = std::mem::take(&mut package.resources)
            .into_iter()
            .find(|r| r.id == resource_id);
        let mut dataset = dataset_from_package(source, &package);

        match descriptor {
            Some(descriptor) => {
                dataset.distributions = self
                    .build_distributions(
                        dataset.resource_id,
                        dataset.license.clone(),
                        vec![descriptor],
                    )
                    .await?;
            }
            None if self.strict_resource_lookup => {
                return Err(ResolutionError::new(
                    ResolutionStage::DistributionBuild,
                    AdapterError::NotFound(format!(
                        "Resource '{}' not listed in dataset '{}'",
                        resource_id, resource.package_id
                    )),
                ));
            }
            None => {
                tracing::warn!(
                    "Resource '{}' not listed in dataset '{}', returning it without distributions",
                    resource_id,
                    resource.package_id
                );
            }
        }

        Ok(dataset)
    }

    /// Build and persist one Distribution per descriptor, concurrently.
    ///
    /// Output order follows `descriptors`. On failure the first error
    /// observed is returned, after every unit has finished.
    async fn build_distributions(
        &self,
        dataset_id: Uuid,
        license: Option<String>,
        descriptors: Vec<CatalogResource>,
    ) -> Result<Vec<Distribution>, ResolutionError> {
        let total = descriptors.len();
        let mut tasks = JoinSet::new();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let records = self.records.clone();
            let license = license.clone();
            tasks.spawn(async move {
                let result = build_and_persist(&records, dataset_id, license, &descriptor).await;
                (index, result)
            });
        }

        let mut built = Vec::with_capacity(total);
        let mut first_error: Option<ResolutionError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(distribution))) => built.push((index, distribution)),
                Ok((index, Err(e))) => {
                    tracing::warn!(
                        "Distribution {} of dataset {} failed: {}",
                        index,
                        dataset_id,
                        e.detail()
                    );
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Distribution task of dataset {} aborted: {}", dataset_id, e);
                    first_error.get_or_insert(ResolutionError::new(
                        ResolutionStage::DistributionBuild,
                        AdapterError::Task(e.to_string()),
                    ));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        built.sort_by_key(|(index, _)| *index);
        Ok(built.into_iter().map(|(_, d)| d).collect())
    }
}

async fn build_and_persist(
    records: &AccessRecordStore,
    dataset_id: Uuid,
    license: Option<String>,
    descriptor: &CatalogResource,
) -> Result<Distribution, ResolutionError> {
    let distribution = build_distribution(descriptor, license)
        .map_err(|e| ResolutionError::new(ResolutionStage::DistributionBuild, e))?;

    records
        .insert(
            dataset_id,
            distribution.resource_id,
            &distribution.url,
            &distribution.filename,
        )
        .await
        .map_err(|e| ResolutionError::new(ResolutionStage::Persist, e.into()))?;

    Ok(distribution)
}

/// Map one raw resource descriptor into a Distribution with a fresh id.
///
/// Fails when the descriptor carries no content URL, since the access
/// record and the file proxy both need one.
pub fn build_distribution(
    descriptor: &CatalogResource,
    license: Option<String>,
) -> Result<Distribution, AdapterError> {
    let url = descriptor
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            AdapterError::NotFound(format!("Resource '{}' has no content URL", descriptor.id))
        })?;

    let format = descriptor.format.as_deref();

    Ok(Distribution {
        resource_id: Uuid::now_v7(),
        title: descriptor.name.clone(),
        description: descriptor.description.clone(),
        filetype: FileType::from_format(format),
        filename: derive_filename(url, format),
        license,
        url: url.to_string(),
    })
}

fn dataset_from_package(source: &DataSource, package: &CatalogDatasetMetadata) -> Dataset {
    Dataset {
        resource_id: Uuid::now_v7(),
        source_id: source.id,
        title: package.title.clone(),
        description: package.notes.clone(),
        license: package.license(),
        version: package.version.clone(),
        tags: package.tag_names().map(str::to_string).collect(),
        status: DatasetStatus::Approved,
        distributions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use ckan_core::traits::PersistenceGateway;
    use ckan_core::{
        CatalogResourceMetadata, CatalogTag, ExecuteMode, PersistenceError, RowSet, SqlValue,
    };
    use ckan_store::{init_schema, SqlGateway};

    /// Scripted catalog counting every call.
    #[derive(Default)]
    struct FakeCatalog {
        packages: HashMap<String, CatalogDatasetMetadata>,
        resources: HashMap<String, CatalogResourceMetadata>,
        unreachable: bool,
        calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_package(mut self, package: CatalogDatasetMetadata) -> Self {
            let id = package.id.clone().unwrap_or_default();
            self.packages.insert(id, package);
            self
        }

        fn with_resource(mut self, resource: CatalogResourceMetadata) -> Self {
            self.resources.insert(resource.id.clone(), resource);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn fetch_package(
            &self,
            _source: &DataSource,
            id: &str,
        ) -> Result<Option<CatalogDatasetMetadata>, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                return Err(AdapterError::Transport("connection refused".to_string()));
            }
            Ok(self.packages.get(id).cloned())
        }

        async fn fetch_resource(
            &self,
            _source: &DataSource,
            id: &str,
        ) -> Result<Option<CatalogResourceMetadata>, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                return Err(AdapterError::Transport("connection refused".to_string()));
            }
            Ok(self.resources.get(id).cloned())
        }
    }

    /// Gateway that fails writes carrying a given URL parameter.
    struct FlakyGateway {
        inner: SqlGateway,
        failing_url: String,
    }

    #[async_trait]
    impl PersistenceGateway for FlakyGateway {
        async fn execute(
            &self,
            statement: &str,
            params: &[SqlValue],
            mode: ExecuteMode,
        ) -> Result<RowSet, PersistenceError> {
            let hit = params
                .iter()
                .any(|p| p.as_text() == Some(self.failing_url.as_str()));
            if mode == ExecuteMode::Write && hit {
                return Err(PersistenceError::execution("disk I/O error"));
            }
            self.inner.execute(statement, params, mode).await
        }
    }

    fn resource(id: &str, url: Option<&str>, format: Option<&str>) -> CatalogResource {
        CatalogResource {
            id: id.to_string(),
            name: Some(format!("Resource {}", id)),
            url: url.map(str::to_string),
            format: format.map(str::to_string),
            description: None,
        }
    }

    fn package(id: &str, resources: Vec<CatalogResource>) -> CatalogDatasetMetadata {
        CatalogDatasetMetadata {
            id: Some(id.to_string()),
            title: Some("Air quality".to_string()),
            notes: Some("Hourly sensor readings".to_string()),
            license_title: Some("CC-BY-4.0".to_string()),
            version: Some("2".to_string()),
            tags: vec![
                CatalogTag {
                    display_name: Some("air".to_string()),
                    name: Some("air".to_string()),
                },
                CatalogTag {
                    display_name: Some("sensors".to_string()),
                    name: Some("sensors".to_string()),
                },
            ],
            resources,
            ..Default::default()
        }
    }

    fn resource_meta(id: &str, package_id: &str) -> CatalogResourceMetadata {
        CatalogResourceMetadata {
            id: id.to_string(),
            package_id: package_id.to_string(),
            ..Default::default()
        }
    }

    fn reference(id: &str) -> CatalogReference {
        CatalogReference::new(id, DataSource::new(7, "http://catalog.example/api/3/action"))
            .unwrap()
    }

    async fn store() -> AccessRecordStore {
        let gateway = SqlGateway::in_memory().await.unwrap();
        init_schema(&gateway).await.unwrap();
        AccessRecordStore::new(Arc::new(gateway))
    }

    fn two_file_package() -> CatalogDatasetMetadata {
        package(
            "pkg-1",
            vec![
                resource("r1", Some("http://files.example/a.json"), Some("JSON")),
                resource("r2", Some("http://files.example/b"), Some("csv")),
            ],
        )
    }

    #[tokio::test]
    async fn dataset_reference_resolves_every_resource() {
        let catalog = Arc::new(FakeCatalog::default().with_package(two_file_package()));
        let records = store().await;
        let pipeline = AssetResolutionPipeline::new(catalog.clone(), records.clone());

        let dataset = pipeline.resolve(&reference("pkg-1")).await.unwrap();

        assert_eq!(dataset.source_id, 7);
        assert_eq!(dataset.status, DatasetStatus::Approved);
        assert_eq!(dataset.title.as_deref(), Some("Air quality"));
        assert_eq!(dataset.description.as_deref(), Some("Hourly sensor readings"));
        assert_eq!(dataset.license.as_deref(), Some("CC-BY-4.0"));
        assert!(dataset.tags.contains("air") && dataset.tags.contains("sensors"));

        let filenames: Vec<&str> = dataset
            .distributions
            .iter()
            .map(|d| d.filename.as_str())
            .collect();
        assert_eq!(filenames, vec!["a.json", "b.csv"]);
        assert_eq!(dataset.distributions[0].filetype, Some(FileType::Json));
        assert_eq!(dataset.distributions[1].filetype, Some(FileType::Csv));
        assert!(dataset
            .distributions
            .iter()
            .all(|d| d.license.as_deref() == Some("CC-BY-4.0")));

        // The first package_show is reused; no second package query.
        assert_eq!(catalog.calls(), 1);

        let stored = records.list_by_dataset(dataset.resource_id).await.unwrap();
        assert_eq!(stored.len(), 2);
        for distribution in &dataset.distributions {
            let record = records
                .find_by_distribution(distribution.resource_id)
                .await
                .unwrap()
                .expect("record persisted");
            assert_eq!(record.url, distribution.url);
            assert_eq!(record.filename, distribution.filename);
        }
    }

    #[tokio::test]
    async fn resource_reference_resolves_single_distribution() {
        let catalog = Arc::new(
            FakeCatalog::default()
                .with_package(two_file_package())
                .with_resource(resource_meta("r2", "pkg-1")),
        );
        let records = store().await;
        let pipeline = AssetResolutionPipeline::new(catalog.clone(), records.clone());

        let dataset = pipeline.resolve(&reference("r2")).await.unwrap();

        assert_eq!(dataset.distributions.len(), 1);
        assert_eq!(dataset.distributions[0].filename, "b.csv");
        assert_eq!(dataset.distributions[0].url, "http://files.example/b");
        assert_eq!(dataset.title.as_deref(), Some("Air quality"));
        // dataset lookup, resource_show, owning package_show
        assert_eq!(catalog.calls(), 3);
        assert_eq!(records.list_by_dataset(dataset.resource_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_catalog_fails_at_disambiguation() {
        let catalog = Arc::new(FakeCatalog {
            unreachable: true,
            ..Default::default()
        });
        let pipeline = AssetResolutionPipeline::new(catalog.clone(), store().await);

        let err = pipeline.resolve(&reference("pkg-1")).await.unwrap_err();
        assert_eq!(err.stage, ResolutionStage::Disambiguation);
        assert!(matches!(err.cause, AdapterError::Transport(_)));
        assert_eq!(err.to_string(), "resolution failed");
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_reference_is_not_resolvable() {
        let catalog = Arc::new(FakeCatalog::default());
        let pipeline = AssetResolutionPipeline::new(catalog.clone(), store().await);

        let err = pipeline.resolve(&reference("nope")).await.unwrap_err();
        assert_eq!(err.stage, ResolutionStage::MetadataFetch);
        assert!(matches!(err.cause, AdapterError::NotResolvable(_)));
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test]
    async fn persist_failure_keeps_committed_records() {
        let gateway = SqlGateway::in_memory().await.unwrap();
        init_schema(&gateway).await.unwrap();
        let flaky = FlakyGateway {
            inner: gateway.clone(),
            failing_url: "http://files.example/broken.csv".to_string(),
        };
        let records = AccessRecordStore::new(Arc::new(flaky));

        let catalog = Arc::new(FakeCatalog::default().with_package(package(
            "pkg-1",
            vec![
                resource("r1", Some("http://files.example/a.json"), Some("json")),
                resource("r2", Some("http://files.example/broken.csv"), Some("csv")),
                resource("r3", Some("http://files.example/c.xml"), Some("xml")),
            ],
        )));
        let pipeline = AssetResolutionPipeline::new(catalog, records);

        let err = pipeline.resolve(&reference("pkg-1")).await.unwrap_err();
        assert_eq!(err.stage, ResolutionStage::Persist);

        // Every other unit ran to completion and its record stays.
        let rows = gateway
            .query("SELECT COUNT(*) AS n FROM accessinformation", &[])
            .await
            .unwrap();
        assert_eq!(rows[0]["n"], SqlValue::Integer(2));
    }

    #[tokio::test]
    async fn missing_url_fails_distribution_build() {
        let catalog = Arc::new(FakeCatalog::default().with_package(package(
            "pkg-1",
            vec![resource("r1", None, Some("csv"))],
        )));
        let pipeline = AssetResolutionPipeline::new(catalog, store().await);

        let err = pipeline.resolve(&reference("pkg-1")).await.unwrap_err();
        assert_eq!(err.stage, ResolutionStage::DistributionBuild);
    }

    #[tokio::test]
    async fn duplicate_resource_ids_get_distinct_distributions() {
        let catalog = Arc::new(FakeCatalog::default().with_package(package(
            "pkg-1",
            vec![
                resource("dup", Some("http://files.example/a.json"), Some("json")),
                resource("dup", Some("http://files.example/a.json"), Some("json")),
            ],
        )));
        let records = store().await;
        let pipeline = AssetResolutionPipeline::new(catalog, records.clone());

        let dataset = pipeline.resolve(&reference("pkg-1")).await.unwrap();
        assert_eq!(dataset.distributions.len(), 2);
        assert_ne!(
            dataset.distributions[0].resource_id,
            dataset.distributions[1].resource_id
        );
        assert_eq!(records.list_by_dataset(dataset.resource_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_dataset_resolves_without_distributions() {
        let catalog = Arc::new(FakeCatalog::default().with_package(package("pkg-1", vec![])));
        let pipeline = AssetResolutionPipeline::new(catalog, store().await);

        let dataset = pipeline.resolve(&reference("pkg-1")).await.unwrap();
        assert!(dataset.distributions.is_empty());
    }

    #[tokio::test]
    async fn resource_missing_from_owning_package() {
        let catalog = Arc::new(
            FakeCatalog::default()
                .with_package(two_file_package())
                .with_resource(resource_meta("r9", "pkg-1")),
        );
        let records = store().await;

        let strict = AssetResolutionPipeline::new(catalog.clone(), records.clone());
        let err = strict.resolve(&reference("r9")).await.unwrap_err();
        assert_eq!(err.stage, ResolutionStage::DistributionBuild);
        assert!(matches!(err.cause, AdapterError::NotFound(_)));

        let lenient = AssetResolutionPipeline::new(catalog, records.clone())
            .with_strict_resource_lookup(false);
        let dataset = lenient.resolve(&reference("r9")).await.unwrap();
        assert!(dataset.distributions.is_empty());
        assert!(records.list_by_dataset(dataset.resource_id).await.unwrap().is_empty());
    }

    #[test]
    fn build_distribution_without_format() {
        let distribution = build_distribution(
            &resource("r1", Some("http://files.example/data.csv"), None),
            None,
        )
        .unwrap();
        assert!(Uuid::parse_str(&distribution.filename).is_ok());
        assert_eq!(distribution.filetype, None);
        assert_eq!(distribution.title.as_deref(), Some("Resource r1"));
    }
}
