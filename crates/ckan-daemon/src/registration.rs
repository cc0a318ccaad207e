// crates/ckan-daemon/src/registration.rs
//
// Self-registration with the configuration manager at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Body POSTed to `<config_manager_url>/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub address: RegistrationAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationAddress {
    pub host: String,
    pub port: u16,
}

/// Registers this adapter under its route alias, with bounded retries.
#[derive(Debug, Clone)]
pub struct Registrar {
    endpoint: String,
    request: RegistrationRequest,
    attempts: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl Registrar {
    pub fn new(config_manager_url: &str, route_alias: &str, port: u16, attempts: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: format!("{}/register", config_manager_url.trim_end_matches('/')),
            request: RegistrationRequest {
                name: route_alias.to_string(),
                address: RegistrationAddress {
                    host: route_alias.to_string(),
                    port,
                },
            },
            attempts: attempts.max(1),
            retry_delay: Duration::from_secs(2),
            client,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// POST the registration until one attempt gets a 2xx answer.
    ///
    /// Returns the number of attempts used, or the last failure.
    pub async fn register(&self) -> Result<u32, String> {
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            match self.try_once().await {
                Ok(()) => {
                    tracing::info!(
                        "Registered as '{}' with {} (attempt {})",
                        self.request.name,
                        self.endpoint,
                        attempt
                    );
                    return Ok(attempt);
                }
                Err(e) => {
                    tracing::warn!(
                        "Registration attempt {}/{} failed: {}",
                        attempt,
                        self.attempts,
                        e
                    );
                    last_error = e;
                }
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(format!(
            "Registration with {} failed after {} attempts: {}",
            self.endpoint, self.attempts, last_error
        ))
    }

    async fn try_once(&self) -> Result<(), String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&self.request)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(format!("Config manager answered {}", resp.status()))
        }
    }
}
