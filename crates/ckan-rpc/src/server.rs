// crates/ckan-rpc/src/server.rs
//
// RPC server setup: AdapterRpcServer and RpcConfig.
//
// A single tonic service accepts JSON-encoded requests with a method field,
// dispatches to the matching handler, and returns JSON-encoded responses.
// tonic provides the transport; no proto codegen is involved.

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;

use ckan_assets::{AssetService, FileService};

use crate::handlers;
use crate::middleware;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8091,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "asset/create", "file/get").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JsonRpcResponse {
    fn from_result(result: Result<serde_json::Value, String>) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                result: Some(value),
                error: None,
            },
            Err(err) => Self {
                success: false,
                result: None,
                error: Some(err),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// AdapterRpcServer
// ---------------------------------------------------------------------------

/// The adapter's RPC server.
#[derive(Debug, Clone)]
pub struct AdapterRpcServer {
    config: RpcConfig,
    service: AdapterServiceImpl,
}

impl AdapterRpcServer {
    pub fn new(config: RpcConfig, assets: AssetService, files: FileService) -> Self {
        Self {
            config,
            service: AdapterServiceImpl { assets, files },
        }
    }

    /// Dispatch one request in-process, bypassing the transport.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.service.dispatch(request).await
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Adapter RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                AdapterJsonRpcServer::new(self.service.clone()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Adapter RPC server stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct AdapterServiceImpl {
    assets: AssetService,
    files: FileService,
}

impl AdapterServiceImpl {
    /// Dispatch a JSON-RPC request to the handler named by its method.
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Dispatching {}", request.method);

        let result = match request.method.as_str() {
            // Assets
            "asset/create" => {
                dispatch_handler(request.params, |r| {
                    let assets = self.assets.clone();
                    async move { handlers::asset::handle_create_asset(&assets, r).await }
                })
                .await
            }
            "asset/delete" => {
                dispatch_handler(request.params, |r| {
                    let assets = self.assets.clone();
                    async move { handlers::asset::handle_delete_asset(&assets, r).await }
                })
                .await
            }

            // Files
            "file/get" => {
                dispatch_handler(request.params, |r| {
                    let files = self.files.clone();
                    async move { handlers::file::handle_get_file(&files, r).await }
                })
                .await
            }

            // Adapter
            "adapter/supported" => {
                dispatch_handler(request.params, |r| {
                    let files = self.files.clone();
                    async move { handlers::adapter::handle_get_supported_types(&files, r).await }
                })
                .await
            }

            _ => Err(format!("Unknown method: {}", request.method)),
        };

        if let Err(e) = &result {
            tracing::warn!("{} failed: {}", request.method, e);
        }
        JsonRpcResponse::from_result(result)
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, String>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Resp, String>>,
{
    let request: Req = serde_json::from_value(params)
        .map_err(|e| format!("Failed to deserialize request: {}", e))?;
    let response = handler(request).await?;
    serde_json::to_value(response).map_err(|e| format!("Failed to serialize response: {}", e))
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// One service, any path. The body is a JSON-encoded JsonRpcRequest and the
// reply a JSON-encoded JsonRpcResponse.

#[derive(Clone)]
pub struct AdapterJsonRpcServer {
    inner: AdapterServiceImpl,
}

impl std::fmt::Debug for AdapterJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterJsonRpcServer").finish()
    }
}

impl AdapterJsonRpcServer {
    fn new(inner: AdapterServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for AdapterJsonRpcServer {
    const NAME: &'static str = "ckan.adapter.AdapterService";
}

impl<B> tower_service::Service<http::Request<B>> for AdapterJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    return Ok(error_response(format!("Failed to read request body: {}", e)));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => return Ok(error_response(format!("Invalid JSON-RPC request: {}", e))),
            };

            let rpc_response = inner.dispatch(rpc_request).await;
            let json = serde_json::to_vec(&rpc_response).unwrap_or_default();
            Ok(build_response(json))
        })
    }
}

fn error_response(message: String) -> http::Response<tonic::body::BoxBody> {
    let resp = JsonRpcResponse::from_result(Err(message));
    build_response(serde_json::to_vec(&resp).unwrap_or_default())
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response with the given JSON body.
fn build_response(json: Vec<u8>) -> http::Response<tonic::body::BoxBody> {
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
