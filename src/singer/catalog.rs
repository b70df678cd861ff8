use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub stream: String,
    pub schema: Value,
    #[serde(default)]
    pub key_properties: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataEntry {
    pub breadcrumb: Vec<String>,
    pub metadata: Map<String, Value>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid catalog '{}'", path.display()))
    }

    pub fn entry(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == tap_stream_id)
    }
}

impl CatalogEntry {
    /// Entry as produced by discovery: available and selected.
    pub fn discovered(name: &str, schema: Value, key_properties: Vec<String>) -> Self {
        let metadata = json!({
            "inclusion": "available",
            "selected": true,
            "table-key-properties": key_properties,
        });

        Self {
            tap_stream_id: name.to_owned(),
            stream: name.to_owned(),
            schema,
            key_properties,
            metadata: vec![MetadataEntry {
                breadcrumb: Vec::new(),
                metadata: metadata.as_object().cloned().unwrap_or_default(),
            }],
        }
    }

    /// Unselected only when the stream-level metadata says `"selected": false`.
    pub fn is_selected(&self) -> bool {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .and_then(|m| m.metadata.get("selected"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}
