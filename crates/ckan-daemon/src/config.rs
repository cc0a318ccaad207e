// crates/ckan-daemon/src/config.rs
//
// Runtime configuration for the adapter daemon.
// Loaded from a TOML file or populated with defaults.

use serde::Deserialize;
use std::fs;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// sqlx connection string of the access-information database.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_db_connections")]
    pub max_db_connections: u32,

    /// Timeout for catalog queries and proxied file downloads, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fail resource-level resolutions whose resource is missing from the
    /// owning dataset's resource list.
    #[serde(default = "default_strict_resource_lookup")]
    pub strict_resource_lookup: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base URL of the configuration manager (e.g. "http://config-manager:8094").
    /// Registration is skipped when unset.
    #[serde(default)]
    pub config_manager_url: Option<String>,

    /// Name and host this adapter registers under.
    #[serde(default)]
    pub route_alias: Option<String>,

    #[serde(default = "default_registration_attempts")]
    pub registration_attempts: u32,

    /// Pause between registration attempts, in seconds.
    #[serde(default = "default_registration_retry_secs")]
    pub registration_retry_secs: u64,
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    8091
}

fn default_database_url() -> String {
    "sqlite://~/.ckan-adapter/adapter.db?mode=rwc".to_string()
}

fn default_max_db_connections() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_strict_resource_lookup() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_registration_attempts() -> u32 {
    3
}

fn default_registration_retry_secs() -> u64 {
    2
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            database_url: default_database_url(),
            max_db_connections: default_max_db_connections(),
            request_timeout_secs: default_request_timeout_secs(),
            strict_resource_lookup: default_strict_resource_lookup(),
            log_level: default_log_level(),
            config_manager_url: None,
            route_alias: None,
            registration_attempts: default_registration_attempts(),
            registration_retry_secs: default_registration_retry_secs(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
