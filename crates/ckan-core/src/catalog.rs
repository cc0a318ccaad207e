// crates/ckan-core/src/catalog.rs
//
// Raw metadata shapes returned by the catalog's action API.
//
// Only the fields the adapter consumes are modeled; everything else in the
// `result` object is ignored. Catalogs routinely send `null` for optional
// strings, so every scalar is an Option and every list defaults to empty.

use serde::{Deserialize, Serialize};

/// `result` of a `package_show` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDatasetMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Free-text description ("notes" in CKAN).
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub license_title: Option<String>,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<CatalogTag>,
    #[serde(default)]
    pub organization: Option<CatalogOrganization>,
    /// Resource descriptors in catalog order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<CatalogResource>,
    /// Request URL that produced this record, added by the client.
    #[serde(default, rename = "originalURL")]
    pub original_url: Option<String>,
}

impl CatalogDatasetMetadata {
    /// Tag display names, skipping tags that carry none.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(|t| t.display_name.as_deref())
    }

    /// Licence reference: the licence URL, falling back to its title.
    pub fn license(&self) -> Option<String> {
        non_empty(&self.license_url).or_else(|| non_empty(&self.license_title))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTag {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOrganization {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One resource descriptor embedded in a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `result` of a `resource_show` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResourceMetadata {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Id of the owning package.
    pub package_id: String,
    #[serde(default, rename = "originalURL")]
    pub original_url: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_metadata_tolerates_nulls_and_unknown_fields() {
        let json = serde_json::json!({
            "id": "pkg-1",
            "title": "Air quality",
            "notes": null,
            "license_url": null,
            "license_title": "CC-BY-4.0",
            "tags": null,
            "resources": [
                {"id": "r1", "url": "https://files.example/a.json", "format": "JSON", "extra": 1}
            ],
            "num_resources": 1,
            "originalURL": "https://cat.example/api/3/action/package_show?id=pkg-1"
        });

        let meta: CatalogDatasetMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Air quality"));
        assert!(meta.tags.is_empty());
        assert_eq!(meta.resources.len(), 1);
        assert_eq!(meta.resources[0].format.as_deref(), Some("JSON"));
        assert_eq!(meta.license().as_deref(), Some("CC-BY-4.0"));
        assert!(meta.original_url.unwrap().ends_with("id=pkg-1"));
    }

    #[test]
    fn tag_names_skip_missing_display_names() {
        let meta = CatalogDatasetMetadata {
            tags: vec![
                CatalogTag {
                    display_name: Some("air".to_string()),
                    name: Some("air".to_string()),
                },
                CatalogTag {
                    display_name: None,
                    name: Some("hidden".to_string()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(meta.tag_names().collect::<Vec<_>>(), vec!["air"]);
    }

    #[test]
    fn resource_metadata_requires_package_id() {
        let json = serde_json::json!({"id": "r1", "url": "https://files.example/a.csv"});
        assert!(serde_json::from_value::<CatalogResourceMetadata>(json).is_err());
    }
}
