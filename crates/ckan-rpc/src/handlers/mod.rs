// crates/ckan-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for one API group.

pub mod adapter;
pub mod asset;
pub mod file;
