// crates/ckan-core/src/error.rs

use std::fmt;

use thiserror::Error;

/// Adapter-wide error types.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Malformed data source or reference (e.g., an unparsable API URL).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Catalog or upstream host unreachable, timed out, or answered non-2xx.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The catalog reported the reference invalid at the queried operation.
    #[error("Not resolvable: {0}")]
    NotResolvable(String),

    /// A record or descriptor the caller asked for does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Local I/O error (e.g., writing proxied bytes to a sink).
    #[error("I/O error: {0}")]
    Io(String),

    /// A spawned unit of work panicked or was cancelled.
    #[error("Task error: {0}")]
    Task(String),

    /// Connection or statement failure in the persistence gateway.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(e: std::io::Error) -> Self {
        AdapterError::Io(e.to_string())
    }
}

/// Where inside a gateway call a persistence failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistencePhase {
    /// No connection could be taken from the pool; the statement never ran.
    ConnectionAcquire,
    /// The statement ran (or tried to) and failed, or its rows could not be read.
    Execution,
}

impl fmt::Display for PersistencePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistencePhase::ConnectionAcquire => write!(f, "connection acquire"),
            PersistencePhase::Execution => write!(f, "execution"),
        }
    }
}

/// Failure of a single `PersistenceGateway::execute` call.
#[derive(Debug, Clone, Error)]
#[error("Persistence error during {phase}: {message}")]
pub struct PersistenceError {
    pub phase: PersistencePhase,
    pub message: String,
}

impl PersistenceError {
    pub fn acquire(message: impl Into<String>) -> Self {
        Self {
            phase: PersistencePhase::ConnectionAcquire,
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            phase: PersistencePhase::Execution,
            message: message.into(),
        }
    }
}

/// Pipeline stage at which a resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    /// The dataset lookup used to decide dataset- vs resource-level.
    Disambiguation,
    /// Follow-up resource / owning-package queries.
    MetadataFetch,
    /// Turning a raw resource descriptor into a Distribution.
    DistributionBuild,
    /// Writing the Distribution's access record.
    Persist,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStage::Disambiguation => write!(f, "Disambiguation"),
            ResolutionStage::MetadataFetch => write!(f, "MetadataFetch"),
            ResolutionStage::DistributionBuild => write!(f, "DistributionBuild"),
            ResolutionStage::Persist => write!(f, "Persist"),
        }
    }
}

/// Error returned by the asset resolution pipeline.
///
/// `Display` carries no stage detail; [`ResolutionError::detail`] does.
#[derive(Debug, Error)]
#[error("resolution failed")]
pub struct ResolutionError {
    pub stage: ResolutionStage,
    #[source]
    pub cause: AdapterError,
}

impl ResolutionError {
    pub fn new(stage: ResolutionStage, cause: AdapterError) -> Self {
        Self { stage, cause }
    }

    /// Internal rendering including stage and cause.
    pub fn detail(&self) -> String {
        format!("{}: {}", self.stage, self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_hides_stage_detail() {
        let err = ResolutionError::new(
            ResolutionStage::Persist,
            AdapterError::Persistence(PersistenceError::execution("disk full")),
        );
        assert_eq!(err.to_string(), "resolution failed");
        assert_eq!(
            err.detail(),
            "Persist: Persistence error during execution: disk full"
        );
    }

    #[test]
    fn persistence_error_keeps_phase() {
        let err: AdapterError = PersistenceError::acquire("pool closed").into();
        match err {
            AdapterError::Persistence(p) => {
                assert_eq!(p.phase, PersistencePhase::ConnectionAcquire)
            }
            other => panic!("Expected Persistence error, got: {:?}", other),
        }
    }
}
