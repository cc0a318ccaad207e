// crates/ckan-catalog/src/lib.rs
//
// ckan-catalog: read-only client for a CKAN-style catalog action API.
//
// Implements `ckan_core::CatalogSource` on top of reqwest. Each call is a
// single GET with no retries and no caching.

pub mod client;

pub use client::{CatalogOperation, CkanClient, DEFAULT_TIMEOUT};
