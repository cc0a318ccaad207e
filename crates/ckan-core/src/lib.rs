// crates/ckan-core/src/lib.rs
//
// ckan-core: Core types, error taxonomy, and seam traits for the CKAN adapter.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the raw catalog metadata shapes, the canonical Dataset /
// Distribution model handed back to callers, the persisted access record,
// the generic row abstraction used by the persistence gateway, and the
// trait interfaces the resolution pipeline is wired through.

pub mod access;
pub mod catalog;
pub mod dataset;
pub mod error;
pub mod persistence;
pub mod source;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use ckan_core::Dataset;`

// Raw catalog metadata
pub use catalog::{
    CatalogDatasetMetadata, CatalogOrganization, CatalogResource, CatalogResourceMetadata,
    CatalogTag,
};

// Canonical model
pub use dataset::{Dataset, DatasetStatus, Distribution, FileType};

// Persisted provenance
pub use access::AccessRecord;

// Catalog addressing
pub use source::{CatalogReference, DataSource};

// Persistence rows
pub use persistence::{ExecuteMode, Row, RowSet, SqlValue};

// Error types
pub use error::{
    AdapterError, PersistenceError, PersistencePhase, ResolutionError, ResolutionStage,
};

// Traits
pub use traits::{CatalogSource, PersistenceGateway};
