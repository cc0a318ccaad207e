// crates/ckan-core/src/access.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted provenance row, one per Distribution.
///
/// Joins a canonical Distribution to the remote URL a downstream consumer
/// will eventually stream bytes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dataset_id: Uuid,
    pub distribution_id: Uuid,
    pub url: String,
    /// Derived filename of the distribution.
    pub filename: String,
}
