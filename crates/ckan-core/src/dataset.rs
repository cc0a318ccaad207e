// crates/ckan-core/src/dataset.rs

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of a canonical Dataset.
///
/// Only successfully built datasets are ever returned, so there is no
/// pending or partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetStatus {
    Approved,
}

/// Canonical form of a catalog package.
///
/// Constructed fresh per resolution and never mutated afterwards; a later
/// resolution of the same reference produces a new Dataset with new ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Generated id, independent of the catalog's own package id.
    pub resource_id: Uuid,
    /// Id of the DataSource this dataset was resolved against.
    pub source_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub version: Option<String>,
    pub tags: BTreeSet<String>,
    pub status: DatasetStatus,
    pub distributions: Vec<Distribution>,
}

/// Canonical form of one catalog resource, owned by its Dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Generated id, independent of the catalog's resource id.
    pub resource_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub filetype: Option<FileType>,
    pub filename: String,
    /// Inherited from the owning dataset.
    pub license: Option<String>,
    /// Resolved remote content URL.
    pub url: String,
}

/// File type derived from a resource's declared format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Json,
    Xml,
    Txt,
    Csv,
    /// Any other declared format, upper-cased.
    Other(String),
}

impl FileType {
    /// Map a catalog `format` string to a file type.
    ///
    /// Returns `None` for a missing or blank format.
    pub fn from_format(format: Option<&str>) -> Option<Self> {
        let format = format.map(str::trim).filter(|f| !f.is_empty())?;
        let normalized = format.trim_start_matches('.').to_ascii_uppercase();
        Some(match normalized.as_str() {
            "JSON" | "GEOJSON" => FileType::Json,
            "XML" => FileType::Xml,
            "TXT" | "TEXT" => FileType::Txt,
            "CSV" => FileType::Csv,
            _ => FileType::Other(normalized),
        })
    }

}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Json => write!(f, "JSON"),
            FileType::Xml => write!(f, "XML"),
            FileType::Txt => write!(f, "TXT"),
            FileType::Csv => write!(f, "CSV"),
            FileType::Other(label) => write!(f, "{}", label),
        }
    }
}
