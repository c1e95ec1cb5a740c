//! Reference-data cache.
//!
//! Slow-changing NetBox objects (sites, device types, device roles,
//! manufacturers) are kept as JSON snapshot files so agents can look up exact
//! names and slugs without hitting the API:
//!
//! ```json
//! {
//!   "metadata": { "count": 2, "last_updated": "2026-01-01T00:00:00+00:00", "resource_type": "sites" },
//!   "data": [ { "id": 1, "name": "DC1", "slug": "dc1", "status": "active", "region": "EU" } ]
//! }
//! ```

mod refresh;

pub use refresh::{RefreshReport, ResourceRefresher};

use crate::inventory::Endpoint;
use crate::inventory::models::{DeviceTypeRecord, SiteRecord, SluggedRecord, choice_value, decode};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Cached resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Sites.
    Sites,
    /// Device types.
    DeviceTypes,
    /// Device roles.
    DeviceRoles,
    /// Manufacturers.
    Manufacturers,
}

impl ResourceKind {
    /// All kinds, in refresh order.
    pub const ALL: [Self; 4] = [
        Self::Sites,
        Self::DeviceTypes,
        Self::DeviceRoles,
        Self::Manufacturers,
    ];

    /// Returns the name used in tool arguments and snapshot metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sites => "sites",
            Self::DeviceTypes => "device_types",
            Self::DeviceRoles => "device_roles",
            Self::Manufacturers => "manufacturers",
        }
    }

    /// Parses a resource type name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Returns the valid names, for error messages.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.as_str()).collect()
    }

    /// Returns the snapshot file name.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Returns the MCP resource URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Sites => "netbox://sites",
            Self::DeviceTypes => "netbox://device-types",
            Self::DeviceRoles => "netbox://device-roles",
            Self::Manufacturers => "netbox://manufacturers",
        }
    }

    /// Parses an MCP resource URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uri() == uri)
    }

    /// Returns the NetBox endpoint the data comes from.
    #[must_use]
    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Sites => Endpoint::Sites,
            Self::DeviceTypes => Endpoint::DeviceTypes,
            Self::DeviceRoles => Endpoint::DeviceRoles,
            Self::Manufacturers => Endpoint::Manufacturers,
        }
    }

    /// Reduces a raw NetBox record to the fields kept in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] if the record lacks required fields.
    pub fn project(self, record: Value) -> Result<Value> {
        Ok(match self {
            Self::Sites => {
                let site: SiteRecord = decode("site", record)?;
                json!({
                    "id": site.id,
                    "name": site.name,
                    "slug": site.slug,
                    "status": choice_value(site.status.as_ref()),
                    "region": site.region.and_then(|r| r.name),
                })
            },
            Self::DeviceTypes => {
                let device_type: DeviceTypeRecord = decode("device type", record)?;
                json!({
                    "id": device_type.id,
                    "model": device_type.model,
                    "manufacturer": device_type.manufacturer.and_then(|m| m.name),
                    "part_number": device_type.part_number,
                })
            },
            Self::DeviceRoles | Self::Manufacturers => {
                let object: SluggedRecord = decode(self.as_str(), record)?;
                json!({ "id": object.id, "name": object.name, "slug": object.slug })
            },
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Number of records.
    pub count: usize,
    /// When the snapshot was written.
    pub last_updated: String,
    /// Resource type name.
    pub resource_type: String,
}

impl SnapshotMetadata {
    /// Parses `last_updated`.
    ///
    /// Accepts RFC 3339 and offset-less ISO 8601 timestamps (read as UTC).
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_updated)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&self.last_updated, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            })
    }
}

/// A snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Metadata.
    pub metadata: SnapshotMetadata,
    /// Records.
    pub data: Vec<Value>,
}

/// Snapshot files in one directory.
#[derive(Debug, Clone)]
pub struct ResourceCache {
    dir: PathBuf,
}

impl ResourceCache {
    /// Creates a cache rooted at `dir`. The directory need not exist yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the snapshot path for `kind`.
    #[must_use]
    pub fn path(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Reads the raw snapshot text, `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read_raw(&self, kind: ResourceKind) -> Result<Option<String>> {
        let path = self.path(kind);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::OperationFailed {
                operation: "read_snapshot".to_string(),
                cause: format!("{}: {e}", path.display()),
            }),
        }
    }

    /// Loads a snapshot, `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a snapshot.
    pub fn load(&self, kind: ResourceKind) -> Result<Option<Snapshot>> {
        let Some(text) = self.read_raw(kind)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::OperationFailed {
                operation: "parse_snapshot".to_string(),
                cause: format!("{}: {e}", kind.file_name()),
            })
    }

    /// Writes a snapshot stamped with `updated_at`.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers never see a partial snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, kind: ResourceKind, data: Vec<Value>, updated_at: DateTime<Utc>) -> Result<Snapshot> {
        let io_error = |e: std::io::Error| Error::OperationFailed {
            operation: "write_snapshot".to_string(),
            cause: format!("{}: {e}", kind.file_name()),
        };

        std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        let snapshot = Snapshot {
            metadata: SnapshotMetadata {
                count: data.len(),
                last_updated: updated_at.to_rfc3339(),
                resource_type: kind.as_str().to_string(),
            },
            data,
        };
        let text = serde_json::to_string_pretty(&snapshot).map_err(|e| Error::OperationFailed {
            operation: "write_snapshot".to_string(),
            cause: e.to_string(),
        })?;

        let tmp = self.dir.join(format!(".{}.tmp", kind.file_name()));
        std::fs::write(&tmp, text).map_err(io_error)?;
        std::fs::rename(&tmp, self.path(kind)).map_err(io_error)?;
        Ok(snapshot)
    }

    /// Returns the newest `last_updated` across all readable snapshots.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        ResourceKind::ALL
            .into_iter()
            .filter_map(|kind| match self.load(kind) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(resource = %kind, error = %e, "Unreadable snapshot");
                    None
                },
            })
            .filter_map(|snapshot| snapshot.metadata.updated_at())
            .max()
    }
}

/// Builds the condensed summary of one resource type.
#[must_use]
pub fn summarize(kind: ResourceKind, data: &[Value]) -> Value {
    let field = |record: &Value, name: &str| record.get(name).cloned().unwrap_or(Value::Null);
    let distinct = |name: &str, limit: usize| -> Vec<Value> {
        data.iter()
            .filter_map(|record| record.get(name).and_then(Value::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(limit)
            .map(Value::from)
            .collect()
    };

    match kind {
        ResourceKind::Sites => json!({
            "count": data.len(),
            "sites": data.iter().take(10)
                .map(|s| json!({"name": field(s, "name"), "status": field(s, "status")}))
                .collect::<Vec<_>>(),
            "regions": distinct("region", 5),
        }),
        ResourceKind::DeviceTypes => json!({
            "count": data.len(),
            "manufacturers": distinct("manufacturer", 10),
            "models": data.iter().take(10)
                .map(|d| json!({"model": field(d, "model"), "manufacturer": field(d, "manufacturer")}))
                .collect::<Vec<_>>(),
        }),
        ResourceKind::DeviceRoles => json!({
            "count": data.len(),
            "roles": data.iter()
                .map(|r| json!({"name": field(r, "name"), "slug": field(r, "slug")}))
                .collect::<Vec<_>>(),
        }),
        ResourceKind::Manufacturers => json!({
            "count": data.len(),
            "manufacturers": data.iter().take(10)
                .map(|m| json!({"name": field(m, "name"), "slug": field(m, "slug")}))
                .collect::<Vec<_>>(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_and_uris() {
        assert_eq!(ResourceKind::parse("device_types"), Some(ResourceKind::DeviceTypes));
        assert_eq!(ResourceKind::parse("racks"), None);
        assert_eq!(ResourceKind::DeviceRoles.file_name(), "device_roles.json");
        assert_eq!(
            ResourceKind::from_uri("netbox://device-roles"),
            Some(ResourceKind::DeviceRoles)
        );
    }

    #[test]
    fn test_project_site() {
        let site = ResourceKind::Sites
            .project(json!({
                "id": 1,
                "name": "DC1",
                "slug": "dc1",
                "status": {"value": "active", "label": "Active"},
                "region": {"id": 3, "name": "EU"},
                "facility": "ignored",
            }))
            .unwrap();
        assert_eq!(
            site,
            json!({"id": 1, "name": "DC1", "slug": "dc1", "status": "active", "region": "EU"})
        );
    }

    #[test]
    fn test_project_rejects_malformed() {
        let err = ResourceKind::DeviceTypes.project(json!({"id": 1})).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn test_write_and_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::new(dir.path().join("resources"));
        let now = Utc::now();

        assert!(cache.load(ResourceKind::Sites).unwrap().is_none());
        cache
            .write(ResourceKind::Sites, vec![json!({"id": 1, "name": "DC1"})], now)
            .unwrap();

        let snapshot = cache.load(ResourceKind::Sites).unwrap().unwrap();
        assert_eq!(snapshot.metadata.count, 1);
        assert_eq!(snapshot.metadata.resource_type, "sites");
        assert_eq!(snapshot.metadata.updated_at(), Some(now));
        assert_eq!(cache.last_updated(), Some(now));
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let metadata = SnapshotMetadata {
            count: 0,
            last_updated: "2025-03-01T10:30:00.123456".to_string(),
            resource_type: "sites".to_string(),
        };
        let parsed = metadata.updated_at().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-01T10:30:00.123456+00:00");
    }

    #[test]
    fn test_summaries() {
        let sites: Vec<Value> = (0..12)
            .map(|i| json!({"name": format!("site-{i}"), "status": "active", "region": format!("r{}", i % 7)}))
            .collect();
        let summary = summarize(ResourceKind::Sites, &sites);
        assert_eq!(summary["count"], 12);
        assert_eq!(summary["sites"].as_array().unwrap().len(), 10);
        assert_eq!(summary["regions"].as_array().unwrap().len(), 5);

        let roles = vec![json!({"name": "Leaf", "slug": "leaf"})];
        let summary = summarize(ResourceKind::DeviceRoles, &roles);
        assert_eq!(summary["roles"][0]["slug"], "leaf");
    }
}
