//! Tool execution handlers.
//!
//! Organized into submodules by domain. Shared pieces live here: argument
//! parsing, the unavailable-inventory short circuit, and the filtered
//! listing pipeline used by every `get_*` listing tool.

mod cables;
mod cached;
mod dcim;
mod ipam;

pub use cables::{execute_get_cable, execute_trace_devices_connection, execute_trace_from_interface};
pub use cached::{
    execute_get_available_prompts, execute_get_cached_resources, execute_get_resource_summary,
};
pub use dcim::{
    execute_get_devices, execute_get_front_ports, execute_get_interfaces, execute_get_rear_ports,
    execute_get_sites,
};
pub use ipam::{
    execute_get_ip_addresses, execute_get_ip_prefixes, execute_get_ip_ranges, execute_get_vlans,
    execute_get_vrfs,
};

use super::{ToolContext, ToolResult};
use crate::inventory::{Endpoint, InventoryBackend, ListQuery, UNAVAILABLE_MESSAGE};
use crate::mcp::tool_types::{Filters, validate_limit};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::info_span;

/// Deserializes tool arguments.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Returns the backend, or the uniform "not available" result.
fn backend(ctx: &ToolContext) -> std::result::Result<&dyn InventoryBackend, ToolResult> {
    ctx.inventory.backend().map_err(|_| {
        tracing::error!("NetBox connection not available");
        ToolResult::error(UNAVAILABLE_MESSAGE)
    })
}

/// One filtered listing tool.
struct Listing {
    endpoint: Endpoint,
    /// Key of the item array in the result.
    items_key: &'static str,
    /// Singular noun for per-item error messages.
    noun: &'static str,
    /// Reduces a raw record to the fields the tool returns.
    project: fn(Value) -> Result<Value>,
    /// Adds a `{total, connected}` summary.
    with_summary: bool,
}

impl Listing {
    fn run(&self, ctx: &ToolContext, filters: &Filters, limit: Option<i64>) -> ToolResult {
        let backend = match backend(ctx) {
            Ok(backend) => backend,
            Err(result) => return result,
        };
        let limit = match validate_limit(limit) {
            Ok(limit) => limit,
            Err(message) => return ToolResult::error(message),
        };

        let span = info_span!("netbox_mcp.listing", endpoint = %self.endpoint, limit);
        let _enter = span.enter();

        let query = ListQuery {
            endpoint: self.endpoint,
            filters: filters.params().to_vec(),
            limit: Some(limit),
        };
        tracing::info!(filters = ?query.filters, "Querying {}", self.items_key);

        let records = match backend.list(&query) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Listing failed");
                let mut payload = Map::new();
                payload.insert(
                    "error".to_string(),
                    Value::from(format!(
                        "Failed to retrieve {}: {e}",
                        self.items_key.replace('_', " ")
                    )),
                );
                payload.insert(self.items_key.to_string(), json!([]));
                payload.insert("metadata".to_string(), json!({ "total_count": 0 }));
                return ToolResult::error_json(&Value::Object(payload));
            },
        };

        let fetched = records.len();
        let items: Vec<Value> = records.into_iter().map(|record| self.project_one(record)).collect();

        let mut payload = Map::new();
        if self.with_summary {
            let connected = items.iter().filter(|item| is_connected(item)).count();
            payload.insert(
                "summary".to_string(),
                json!({ "total": items.len(), "connected": connected }),
            );
        }
        payload.insert(
            "metadata".to_string(),
            json!({
                "total_count": items.len(),
                "filters_applied": filters.applied(),
                "limit": limit,
                "truncated": fetched == limit,
            }),
        );
        tracing::info!(count = items.len(), "Returning {}", self.items_key);
        payload.insert(self.items_key.to_string(), Value::Array(items));

        ToolResult::json(&Value::Object(payload))
    }

    fn project_one(&self, record: Value) -> Value {
        let id = record.get("id").cloned().unwrap_or(Value::Null);
        let name = record
            .get("name")
            .or_else(|| record.get("display"))
            .cloned()
            .unwrap_or_else(|| Value::from("unknown"));

        (self.project)(record).unwrap_or_else(|e| {
            tracing::warn!(id = %id, error = %e, "Error processing {}", self.noun);
            json!({
                "id": id,
                "name": name,
                "error": format!("Error processing {}: {e}", self.noun),
            })
        })
    }
}

fn is_connected(item: &Value) -> bool {
    item.get("connected").and_then(Value::as_bool).unwrap_or(false)
        || item.get("status").and_then(Value::as_str) == Some("connected")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResourceCache;
    use crate::config::TraceSettings;
    use crate::inventory::{InMemoryInventory, Inventory};

    fn context(inventory: Inventory) -> ToolContext {
        ToolContext {
            inventory,
            trace: TraceSettings::default(),
            cache: ResourceCache::new("unused"),
        }
    }

    fn sites() -> Listing {
        Listing {
            endpoint: Endpoint::Sites,
            items_key: "sites",
            noun: "site",
            project: |record| {
                let name = record
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::MalformedRecord {
                        kind: "site",
                        cause: "missing name".to_string(),
                    })?;
                Ok(json!({ "name": name }))
            },
            with_summary: false,
        }
    }

    #[test]
    fn test_unavailable_short_circuits() {
        let ctx = context(Inventory::Unavailable("unset".to_string()));
        let result = sites().run(&ctx, &Filters::new(), None);

        assert!(result.is_error);
        assert_eq!(result.payload().unwrap()["error"], UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_bad_limit() {
        let ctx = context(Inventory::new(InMemoryInventory::new()));
        let result = sites().run(&ctx, &Filters::new(), Some(5000));

        assert!(result.is_error);
        assert_eq!(result.payload().unwrap()["error"], "Limit must be between 1 and 1000");
    }

    #[test]
    fn test_malformed_item_is_embedded() {
        let inventory = InMemoryInventory::new();
        inventory.insert_raw(Endpoint::Sites, json!({"id": 1, "name": "DC1"}));
        inventory.insert_raw(Endpoint::Sites, json!({"id": 2}));
        let ctx = context(Inventory::new(inventory));

        let payload = sites().run(&ctx, &Filters::new(), Some(2)).payload().unwrap();
        assert_eq!(payload["sites"][0]["name"], "DC1");
        assert_eq!(payload["sites"][1]["id"], 2);
        assert!(payload["sites"][1]["error"].as_str().unwrap().starts_with("Error processing site"));
        assert_eq!(payload["metadata"]["total_count"], 2);
        assert_eq!(payload["metadata"]["truncated"], true);
    }

    #[test]
    fn test_listing_failure() {
        let inventory = InMemoryInventory::new();
        inventory.fail_listings();
        let ctx = context(Inventory::new(inventory));

        let result = sites().run(&ctx, &Filters::new(), None);
        let payload = result.payload().unwrap();
        assert!(result.is_error);
        assert!(payload["error"].as_str().unwrap().starts_with("Failed to retrieve sites"));
        assert_eq!(payload["sites"], json!([]));
    }
}
