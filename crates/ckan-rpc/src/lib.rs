// crates/ckan-rpc/src/lib.rs
//
// ckan-rpc: JSON-RPC server and handlers for the CKAN adapter.
//
// A single tonic service accepts `{method, params}` envelopes over HTTP/1.1
// or HTTP/2 and dispatches them to the asset, file, and adapter handlers.

pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server types for ergonomic access.
pub use server::{AdapterRpcServer, JsonRpcRequest, JsonRpcResponse, RpcConfig};
