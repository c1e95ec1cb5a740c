//! Argument types for MCP tools.
//!
//! All argument types use `#[serde(deny_unknown_fields)]` so a misspelled
//! filter is rejected instead of silently widening the query.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Default listing limit.
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest accepted listing limit.
pub const MAX_LIMIT: i64 = 1000;

/// Arguments for `trace_devices_connection`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceDevicesArgs {
    /// Device the path starts at.
    pub source_device: String,
    /// Device the path ends at.
    pub target_device: String,
    /// Search rounds (default and cap from configuration).
    pub max_iterations: Option<i64>,
}

/// Arguments for `trace_from_interface`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceInterfaceArgs {
    /// Device owning the start interface.
    pub device_name: String,
    /// Start interface.
    pub interface_name: String,
    /// Tree depth (default and cap from configuration).
    pub max_depth: Option<i64>,
}

/// Arguments for `get_cable`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetCableArgs {
    /// Cable ID.
    pub cable_id: u64,
}

/// Arguments for `get_devices`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevicesArgs {
    /// Site name or slug.
    pub site: Option<String>,
    /// Device role slug.
    pub device_role: Option<String>,
    /// Device type slug.
    pub device_type: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_sites`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitesArgs {
    /// Site ID.
    pub id: Option<u64>,
    /// Site slug.
    pub slug: Option<String>,
    /// Site status.
    pub status: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_interfaces`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfacesArgs {
    /// Device name.
    pub device: Option<String>,
    /// Device ID.
    pub device_id: Option<u64>,
    /// Interface name.
    pub name: Option<String>,
    /// Interface type, e.g. `1000base-t`.
    #[serde(rename = "type")]
    pub interface_type: Option<String>,
    /// Interface kind: physical, virtual, wireless.
    pub kind: Option<String>,
    /// Administrative state.
    pub enabled: Option<bool>,
    /// Has a cable attached.
    pub cabled: Option<bool>,
    /// Has a complete connection.
    pub connected: Option<bool>,
    /// Management-only interface.
    pub mgmt_only: Option<bool>,
    /// Parent LAG name.
    pub lag: Option<String>,
    /// 802.1Q mode.
    pub mode: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_front_ports`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontPortsArgs {
    /// Device name.
    pub device: Option<String>,
    /// Device ID.
    pub device_id: Option<u64>,
    /// Port name.
    pub name: Option<String>,
    /// Port type, e.g. `8p8c`, `lc`.
    #[serde(rename = "type")]
    pub port_type: Option<String>,
    /// Has a cable attached.
    pub cabled: Option<bool>,
    /// Paired rear port name.
    pub rear_port: Option<String>,
    /// Paired rear port ID.
    pub rear_port_id: Option<u64>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_rear_ports`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RearPortsArgs {
    /// Device name.
    pub device: Option<String>,
    /// Device ID.
    pub device_id: Option<u64>,
    /// Port name.
    pub name: Option<String>,
    /// Port type.
    #[serde(rename = "type")]
    pub port_type: Option<String>,
    /// Number of positions.
    pub positions: Option<u32>,
    /// Has a cable attached.
    pub cabled: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_ip_addresses`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpAddressesArgs {
    /// Device name.
    pub device: Option<String>,
    /// Interface name.
    pub interface: Option<String>,
    /// Interface ID.
    pub interface_id: Option<u64>,
    /// Exact address.
    pub address: Option<String>,
    /// Parent prefix.
    pub parent: Option<String>,
    /// Address family (4 or 6).
    pub family: Option<u8>,
    /// Status.
    pub status: Option<String>,
    /// Role.
    pub role: Option<String>,
    /// VRF name.
    pub vrf: Option<String>,
    /// VRF ID.
    pub vrf_id: Option<u64>,
    /// Assigned to an interface.
    pub assigned_to_interface: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_ip_prefixes`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefixesArgs {
    /// Exact prefix.
    pub prefix: Option<String>,
    /// Strictly within this prefix.
    pub within: Option<String>,
    /// Within or equal to this prefix.
    pub within_include: Option<String>,
    /// Contains this address or prefix.
    pub contains: Option<String>,
    /// Address family (4 or 6).
    pub family: Option<u8>,
    /// Status.
    pub status: Option<String>,
    /// Role.
    pub role: Option<String>,
    /// Site slug.
    pub site: Option<String>,
    /// VRF name.
    pub vrf: Option<String>,
    /// VRF ID.
    pub vrf_id: Option<u64>,
    /// Tenant slug.
    pub tenant: Option<String>,
    /// Pool flag.
    pub is_pool: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_ip_ranges`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpRangesArgs {
    /// First address.
    pub start_address: Option<String>,
    /// Last address.
    pub end_address: Option<String>,
    /// Address family (4 or 6).
    pub family: Option<u8>,
    /// Status.
    pub status: Option<String>,
    /// Role.
    pub role: Option<String>,
    /// VRF name.
    pub vrf: Option<String>,
    /// VRF ID.
    pub vrf_id: Option<u64>,
    /// Tenant slug.
    pub tenant: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_vrfs`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VrfsArgs {
    /// VRF name.
    pub name: Option<String>,
    /// Route distinguisher.
    pub rd: Option<String>,
    /// Tenant slug.
    pub tenant: Option<String>,
    /// Unique address space flag.
    pub enforce_unique: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_vlans`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlansArgs {
    /// 802.1Q VLAN ID.
    pub vid: Option<u16>,
    /// VLAN name.
    pub name: Option<String>,
    /// Site slug.
    pub site: Option<String>,
    /// VLAN group slug.
    pub group: Option<String>,
    /// Tenant slug.
    pub tenant: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// Role.
    pub role: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// Arguments for `get_cached_resources`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachedResourcesArgs {
    /// One resource type, or all when absent.
    pub resource_type: Option<String>,
    /// Include cache metadata (default: true).
    pub include_metadata: Option<bool>,
}

/// Arguments for `get_resource_summary`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSummaryArgs {
    /// One resource type, or all when absent.
    pub resource_type: Option<String>,
}

/// Arguments for `get_available_prompts`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvailablePromptsArgs {
    /// One prompt, or all when absent.
    pub prompt_type: Option<String>,
    /// Include example requests (default: true).
    pub include_examples: Option<bool>,
}

/// Filters of one listing call.
///
/// Tracks both the NetBox query parameters that are actually sent and the
/// `filters_applied` echo, which lists every filter the tool accepts (unset
/// ones as `null`).
#[derive(Debug, Default)]
pub struct Filters {
    applied: Map<String, Value>,
    params: Vec<(String, String)>,
}

impl Filters {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter whose NetBox parameter has the same name.
    #[must_use]
    pub fn with<T: Into<Value>>(self, name: &str, value: Option<T>) -> Self {
        self.with_param(name, name, value)
    }

    /// Adds a filter sent to NetBox as `param`.
    ///
    /// Empty strings count as unset.
    #[must_use]
    pub fn with_param<T: Into<Value>>(mut self, name: &str, param: &str, value: Option<T>) -> Self {
        let value = value.map(Into::into).unwrap_or(Value::Null);
        if let Some(rendered) = render_param(&value) {
            self.params.push((param.to_string(), rendered));
        }
        self.applied.insert(name.to_string(), value);
        self
    }

    /// Returns the NetBox query parameters.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the `filters_applied` echo.
    #[must_use]
    pub fn applied(&self) -> Value {
        Value::Object(self.applied.clone())
    }
}

fn render_param(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Validates a listing limit, applying the default when absent.
///
/// # Errors
///
/// Returns the caller-facing message when the limit is outside `1..=1000`.
pub fn validate_limit(limit: Option<i64>) -> std::result::Result<usize, &'static str> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if (1..=MAX_LIMIT).contains(&limit) {
        usize::try_from(limit).map_err(|_| LIMIT_MESSAGE)
    } else {
        Err(LIMIT_MESSAGE)
    }
}

const LIMIT_MESSAGE: &str = "Limit must be between 1 and 1000";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(None, Ok(100); "default")]
    #[test_case(Some(1), Ok(1); "lower bound")]
    #[test_case(Some(1000), Ok(1000); "upper bound")]
    #[test_case(Some(0), Err(LIMIT_MESSAGE); "zero")]
    #[test_case(Some(-5), Err(LIMIT_MESSAGE); "negative")]
    #[test_case(Some(1001), Err(LIMIT_MESSAGE); "too large")]
    fn test_validate_limit(limit: Option<i64>, expected: std::result::Result<usize, &'static str>) {
        assert_eq!(validate_limit(limit), expected);
    }

    #[test]
    fn test_filters_echo_and_params() {
        let filters = Filters::new()
            .with("site", Some("dc1"))
            .with_param("device_role", "role", Some("leaf"))
            .with("device_type", None::<String>)
            .with("cabled", Some(false))
            .with("device_id", Some(7_u64))
            .with("name", Some("  "));

        assert_eq!(
            filters.params(),
            &[
                ("site".to_string(), "dc1".to_string()),
                ("role".to_string(), "leaf".to_string()),
                ("cabled".to_string(), "false".to_string()),
                ("device_id".to_string(), "7".to_string()),
            ]
        );
        assert_eq!(filters.applied()["device_role"], "leaf");
        assert_eq!(filters.applied()["device_type"], Value::Null);
        assert_eq!(filters.applied()["cabled"], json!(false));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<DevicesArgs, _> =
            serde_json::from_value(json!({"site": "dc1", "rack": "r1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_type_field_renamed() {
        let args: InterfacesArgs =
            serde_json::from_value(json!({"type": "1000base-t", "enabled": true})).unwrap();
        assert_eq!(args.interface_type.as_deref(), Some("1000base-t"));
        assert_eq!(args.enabled, Some(true));
    }
}
