//! MCP resources backed by the reference-data cache.
//!
//! Resources are addressed as `netbox://sites`, `netbox://device-types`,
//! `netbox://device-roles` and `netbox://manufacturers`.

use crate::cache::{ResourceCache, ResourceKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

const MIME_JSON: &str = "application/json";

/// Handler for `netbox://` resources.
pub struct ResourceHandler {
    cache: ResourceCache,
}

impl ResourceHandler {
    /// Creates a handler reading from `cache`.
    #[must_use]
    pub const fn new(cache: ResourceCache) -> Self {
        Self { cache }
    }

    /// Lists all available resources.
    #[must_use]
    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| ResourceDefinition {
                uri: kind.uri().to_string(),
                name: kind.as_str().to_string(),
                description: Some(describe(kind).to_string()),
                mime_type: Some(MIME_JSON.to_string()),
            })
            .collect()
    }

    /// Gets a resource by URI.
    ///
    /// A missing snapshot is not an error: the content is a JSON document
    /// with an `error` field and an empty `data` array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown URIs, and propagates
    /// failures to read an existing snapshot file.
    pub fn get_resource(&self, uri: &str) -> Result<ResourceContent> {
        let uri = uri.trim();
        let kind = ResourceKind::from_uri(uri)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown resource: {uri}")))?;

        let text = match self.cache.read_raw(kind)? {
            Some(text) => text,
            None => {
                tracing::warn!(resource = %kind, "Resource snapshot missing");
                json!({
                    "error": format!("{} not found", kind.file_name()),
                    "data": [],
                })
                .to_string()
            },
        };

        Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: Some(MIME_JSON.to_string()),
            text: Some(text),
        })
    }
}

const fn describe(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Sites => "Cached NetBox sites (name, slug, status, region)",
        ResourceKind::DeviceTypes => "Cached NetBox device types (model, manufacturer, part number)",
        ResourceKind::DeviceRoles => "Cached NetBox device roles (name, slug)",
        ResourceKind::Manufacturers => "Cached NetBox manufacturers (name, slug)",
    }
}

/// Definition of an MCP resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Resource URI.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// MIME type of the resource.
    pub mime_type: Option<String>,
}

/// Content of an MCP resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContent {
    /// Resource URI.
    pub uri: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Text content.
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;

    #[test]
    fn test_lists_four_resources() {
        let handler = ResourceHandler::new(ResourceCache::new("unused"));
        let uris: Vec<String> = handler.list_resources().into_iter().map(|r| r.uri).collect();
        assert_eq!(
            uris,
            vec![
                "netbox://sites",
                "netbox://device-types",
                "netbox://device-roles",
                "netbox://manufacturers"
            ]
        );
    }

    #[test]
    fn test_reads_snapshot_text() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::new(dir.path());
        cache
            .write(ResourceKind::DeviceRoles, vec![json!({"id": 1, "name": "Leaf", "slug": "leaf"})], Utc::now())
            .unwrap();
        let handler = ResourceHandler::new(cache);

        let content = handler.get_resource("netbox://device-roles").unwrap();
        let parsed: Value = serde_json::from_str(content.text.as_deref().unwrap()).unwrap();
        assert_eq!(parsed["data"][0]["slug"], "leaf");
        assert_eq!(parsed["metadata"]["count"], 1);
    }

    #[test]
    fn test_missing_snapshot_is_error_document() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ResourceHandler::new(ResourceCache::new(dir.path()));

        let content = handler.get_resource("netbox://sites").unwrap();
        let parsed: Value = serde_json::from_str(content.text.as_deref().unwrap()).unwrap();
        assert_eq!(parsed["error"], "sites.json not found");
        assert_eq!(parsed["data"], json!([]));
    }

    #[test]
    fn test_unknown_uri() {
        let handler = ResourceHandler::new(ResourceCache::new("unused"));
        assert!(matches!(
            handler.get_resource("netbox://racks"),
            Err(Error::InvalidInput(_))
        ));
    }
}
