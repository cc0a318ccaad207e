// crates/ckan-daemon/src/main.rs
//
// Binary entrypoint for the CKAN adapter daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, opens the
// access-information database, wires the catalog client into the asset and
// file services, optionally registers with the configuration manager, and
// serves JSON-RPC until Ctrl-C.

mod config;
mod registration;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::DaemonConfig;
use registration::Registrar;

use ckan_assets::{AssetResolutionPipeline, AssetService, FileService};
use ckan_catalog::CkanClient;
use ckan_core::PersistenceGateway;
use ckan_rpc::{AdapterRpcServer, RpcConfig};
use ckan_store::{init_schema, AccessRecordStore, SqlGateway};

/// CKAN catalog adapter daemon.
#[derive(Parser, Debug)]
#[command(name = "ckan-daemon", version, about = "CKAN catalog adapter daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.ckan-adapter/config.toml")]
    config: String,

    /// Overrides `rpc_port` from the configuration file.
    #[arg(long)]
    rpc_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    if let Some(port) = args.rpc_port {
        daemon_config.rpc_port = port;
    }

    tracing::info!("CKAN Adapter Daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------
    let database_url = prepare_database_url(&daemon_config.database_url)?;
    let gateway = SqlGateway::connect(&database_url, daemon_config.max_db_connections).await?;
    init_schema(&gateway).await?;
    let gateway: Arc<dyn PersistenceGateway> = Arc::new(gateway);
    let records = AccessRecordStore::new(gateway);

    // ---------------------------------------------------------------
    // Services
    // ---------------------------------------------------------------
    let timeout = Duration::from_secs(daemon_config.request_timeout_secs);
    let catalog = Arc::new(CkanClient::new(timeout));
    let pipeline = AssetResolutionPipeline::new(catalog, records.clone())
        .with_strict_resource_lookup(daemon_config.strict_resource_lookup);
    let assets = AssetService::new(pipeline);
    let files = FileService::new(records, timeout);

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------
    match (&daemon_config.config_manager_url, &daemon_config.route_alias) {
        (Some(url), Some(alias)) => {
            let registrar = Registrar::new(
                url,
                alias,
                daemon_config.rpc_port,
                daemon_config.registration_attempts,
            )
            .with_retry_delay(Duration::from_secs(daemon_config.registration_retry_secs));
            tokio::spawn(async move {
                if let Err(e) = registrar.register().await {
                    tracing::error!("{}", e);
                }
            });
        }
        _ => tracing::info!("No config manager or route alias configured; skipping registration"),
    }

    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    AdapterRpcServer::new(rpc_config, assets, files).start().await?;

    Ok(())
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.display(), &path[1..]);
        }
    }
    path.to_string()
}

/// Expand `~` in a `sqlite://` URL and create the database's directory.
/// Other URLs pass through unchanged.
fn prepare_database_url(url: &str) -> Result<String, std::io::Error> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(url.to_string());
    };

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    let path = expand_tilde(path);

    if let Some(parent) = Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(match query {
        Some(query) => format!("sqlite://{}?{}", path, query),
        None => format!("sqlite://{}", path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_file_urls_pass_through() {
        assert_eq!(prepare_database_url("sqlite::memory:").unwrap(), "sqlite::memory:");
    }

    #[test]
    fn file_url_keeps_query_and_creates_directory() {
        let dir = std::env::temp_dir().join(format!("ckan_daemon_test_{}", uuid::Uuid::now_v7()));
        let url = format!("sqlite://{}/adapter.db?mode=rwc", dir.display());

        assert_eq!(prepare_database_url(&url).unwrap(), url);
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde("~/x/config.toml"),
                format!("{}/x/config.toml", home.display())
            );
        }
        assert_eq!(expand_tilde("/etc/adapter.toml"), "/etc/adapter.toml");
    }
}
