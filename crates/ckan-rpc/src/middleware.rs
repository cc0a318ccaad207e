// crates/ckan-rpc/src/middleware.rs
//
// Request interceptor for the RPC server.

use tonic::{Request, Status};

/// Log the caller-visible metadata of each incoming request.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    let agent = req
        .metadata()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::debug!("Incoming RPC request from {}", agent);
    Ok(req)
}
