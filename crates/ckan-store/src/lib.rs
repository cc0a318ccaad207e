// crates/ckan-store/src/lib.rs
//
// ckan-store: Persistence layer for the CKAN adapter.
//
// Provides the sqlx-backed `PersistenceGateway` (one pooled connection per
// statement, generic column-name -> value rows), the table bootstrap, and
// the typed `AccessRecordStore` façade the pipeline writes through.

pub mod access;
pub mod schema;
pub mod sql;

// Re-export key types for ergonomic access from downstream crates.
pub use access::AccessRecordStore;
pub use schema::init_schema;
pub use sql::SqlGateway;
