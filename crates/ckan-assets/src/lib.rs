// crates/ckan-assets/src/lib.rs
//
// ckan-assets: Turns catalog references into canonical Datasets and serves
// the content behind their Distributions.
//
// - `pipeline`: the asset resolution pipeline (lookup, fetch, build, persist).
// - `filename`: filename derivation from a resource URL and format.
// - `service`: create/delete entry points over the pipeline and the store.
// - `file`: streaming proxy for a Distribution's upstream content.

pub mod file;
pub mod filename;
pub mod pipeline;
pub mod service;

// Re-export key types for ergonomic access from downstream crates.
pub use file::{FileService, RemoteFile};
pub use filename::derive_filename;
pub use pipeline::{build_distribution, AssetResolutionPipeline};
pub use service::AssetService;
