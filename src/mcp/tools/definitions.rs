//! Tool definitions for MCP tools.
//!
//! Contains the JSON Schema definitions for every tool.

use super::ToolDefinition;
use serde_json::{Map, Value, json};

const CACHE_HINT: &str = "Look up exact names and slugs with get_cached_resources first; NetBox filters match exactly.";

/// Returns every tool definition.
pub fn all_tools() -> Vec<ToolDefinition> {
    vec![
        trace_devices_connection_tool(),
        trace_from_interface_tool(),
        get_cable_tool(),
        get_devices_tool(),
        get_sites_tool(),
        get_interfaces_tool(),
        get_front_ports_tool(),
        get_rear_ports_tool(),
        get_ip_addresses_tool(),
        get_ip_prefixes_tool(),
        get_ip_ranges_tool(),
        get_vrfs_tool(),
        get_vlans_tool(),
        get_cached_resources_tool(),
        get_resource_summary_tool(),
        get_available_prompts_tool(),
    ]
}

/// Defines the device-to-device path tracer.
pub fn trace_devices_connection_tool() -> ToolDefinition {
    ToolDefinition {
        name: "trace_devices_connection".to_string(),
        description: "Find the shortest cable path between two devices. Searches outward from both devices at once, one round per iteration, passing through patch panels, until the searches meet. Returns every hop (device, interface, cable, next device, next interface), the meeting point and total_hops; or, if no path is found, how many devices each side explored.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "source_device": {
                    "type": "string",
                    "description": "Exact name of the device the path starts at"
                },
                "target_device": {
                    "type": "string",
                    "description": "Exact name of the device the path ends at"
                },
                "max_iterations": {
                    "type": "integer",
                    "description": "Search rounds before giving up (default: 10, max: 50)",
                    "minimum": 1
                }
            },
            "required": ["source_device", "target_device"]
        }),
    }
}

/// Defines the interface topology tree tracer.
pub fn trace_from_interface_tool() -> ToolDefinition {
    ToolDefinition {
        name: "trace_from_interface".to_string(),
        description: "Map everything reachable by cable from one interface, as a tree. Follows cables to the far end, crosses patch panels through their front/rear port pairing, and stops at max_depth or at terminations already visited. Returns the tree plus total_nodes, total_cables and max_depth; an uncabled interface yields a single node and an explanatory message.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "device_name": {
                    "type": "string",
                    "description": "Exact name of the device owning the interface"
                },
                "interface_name": {
                    "type": "string",
                    "description": "Exact interface name, e.g. Ethernet1/1"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum tree depth (default: 10, max: 64)",
                    "minimum": 1
                }
            },
            "required": ["device_name", "interface_name"]
        }),
    }
}

/// Defines the cable lookup.
pub fn get_cable_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_cable".to_string(),
        description: "Get one cable by ID: type, status and every termination on both ends (interfaces, front ports with their rear port, rear ports with their front ports).".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "cable_id": {
                    "type": "integer",
                    "description": "NetBox cable ID",
                    "minimum": 0
                }
            },
            "required": ["cable_id"]
        }),
    }
}

/// Defines the device listing.
pub fn get_devices_tool() -> ToolDefinition {
    listing_tool(
        "get_devices",
        "List devices, optionally filtered by site, role or device type. Returns id, name, type, role, rack and non-empty custom fields.",
        &[
            ("site", string("Site name or slug")),
            ("device_role", string("Device role slug")),
            ("device_type", string("Device type slug")),
        ],
    )
}

/// Defines the site listing.
pub fn get_sites_tool() -> ToolDefinition {
    listing_tool(
        "get_sites",
        "List sites, optionally filtered by ID, slug or status. Returns id, name, slug and status.",
        &[
            ("id", integer("Site ID")),
            ("slug", string("Site slug")),
            ("status", string("Status: active, planned, staged, decommissioned, ...")),
        ],
    )
}

/// Defines the interface listing.
pub fn get_interfaces_tool() -> ToolDefinition {
    listing_tool(
        "get_interfaces",
        "List interfaces with a compact view: id, name, device_name, type, status (connected, enabled or disabled), kind and VLANs (untagged:N or tagged:a,b). Includes a connected/total summary.",
        &[
            ("device", string("Device name")),
            ("device_id", integer("Device ID")),
            ("name", string("Interface name")),
            ("type", string("Interface type, e.g. 1000base-t, 10gbase-x-sfpp")),
            ("kind", string("physical, virtual or wireless")),
            ("enabled", boolean("Administrative state")),
            ("cabled", boolean("Has a cable attached")),
            ("connected", boolean("Has a complete connection")),
            ("mgmt_only", boolean("Management-only interfaces")),
            ("lag", string("Parent LAG name")),
            ("mode", string("802.1Q mode: access, tagged, tagged-all")),
        ],
    )
}

/// Defines the front port listing.
pub fn get_front_ports_tool() -> ToolDefinition {
    listing_tool(
        "get_front_ports",
        "List patch panel front ports: the side devices plug into. Each front port is wired internally to a rear port. Returns id, name, connected, device_name, type and rear_port, plus a connected/total summary.",
        &[
            ("device", string("Device name")),
            ("device_id", integer("Device ID")),
            ("name", string("Port name")),
            ("type", string("Port type, e.g. 8p8c, lc, sc")),
            ("cabled", boolean("Has a cable attached")),
            ("rear_port", string("Paired rear port name")),
            ("rear_port_id", integer("Paired rear port ID")),
        ],
    )
}

/// Defines the rear port listing.
pub fn get_rear_ports_tool() -> ToolDefinition {
    listing_tool(
        "get_rear_ports",
        "List patch panel rear ports: the trunk side, fanning out to one or more front ports. Returns id, name, connected, device_name, type and positions, plus a connected/total summary.",
        &[
            ("device", string("Device name")),
            ("device_id", integer("Device ID")),
            ("name", string("Port name")),
            ("type", string("Port type, e.g. 8p8c, lc, mpo")),
            ("positions", integer("Number of positions")),
            ("cabled", boolean("Has a cable attached")),
        ],
    )
}

/// Defines the IP address listing.
pub fn get_ip_addresses_tool() -> ToolDefinition {
    listing_tool(
        "get_ip_addresses",
        "List IP addresses by device, interface, parent prefix, VRF, family, status or role. Returns id, address, status, vrf and assigned object.",
        &[
            ("device", string("Device name")),
            ("interface", string("Interface name")),
            ("interface_id", integer("Interface ID")),
            ("address", string("Exact address, e.g. 10.0.0.1/24")),
            ("parent", string("Parent prefix, e.g. 10.0.0.0/16")),
            ("family", integer("Address family: 4 or 6")),
            ("status", string("active, reserved, deprecated, dhcp, slaac")),
            ("role", string("loopback, secondary, anycast, vip, ...")),
            ("vrf", string("VRF name")),
            ("vrf_id", integer("VRF ID")),
            ("assigned_to_interface", boolean("Assigned to an interface")),
        ],
    )
}

/// Defines the prefix listing.
pub fn get_ip_prefixes_tool() -> ToolDefinition {
    listing_tool(
        "get_ip_prefixes",
        "List IP prefixes by containment, site, VRF, tenant, status or role. Returns id, prefix, status, site, vrf and vlan.",
        &[
            ("prefix", string("Exact prefix")),
            ("within", string("Strictly inside this prefix")),
            ("within_include", string("Inside or equal to this prefix")),
            ("contains", string("Contains this address or prefix")),
            ("family", integer("Address family: 4 or 6")),
            ("status", string("container, active, reserved, deprecated")),
            ("role", string("Prefix role slug")),
            ("site", string("Site slug")),
            ("vrf", string("VRF name")),
            ("vrf_id", integer("VRF ID")),
            ("tenant", string("Tenant slug")),
            ("is_pool", boolean("Pool prefixes only")),
        ],
    )
}

/// Defines the IP range listing.
pub fn get_ip_ranges_tool() -> ToolDefinition {
    listing_tool(
        "get_ip_ranges",
        "List IP ranges by bounds, VRF, tenant, status or role. Returns id, start_address, end_address, status, vrf and utilization.",
        &[
            ("start_address", string("First address")),
            ("end_address", string("Last address")),
            ("family", integer("Address family: 4 or 6")),
            ("status", string("active, reserved, deprecated")),
            ("role", string("Range role slug")),
            ("vrf", string("VRF name")),
            ("vrf_id", integer("VRF ID")),
            ("tenant", string("Tenant slug")),
        ],
    )
}

/// Defines the VRF listing.
pub fn get_vrfs_tool() -> ToolDefinition {
    listing_tool(
        "get_vrfs",
        "List VRFs by name, route distinguisher or tenant. Returns id, name and rd.",
        &[
            ("name", string("VRF name")),
            ("rd", string("Route distinguisher")),
            ("tenant", string("Tenant slug")),
            ("enforce_unique", boolean("Enforces unique address space")),
        ],
    )
}

/// Defines the VLAN listing.
pub fn get_vlans_tool() -> ToolDefinition {
    listing_tool(
        "get_vlans",
        "List VLANs by VID, name, site, group, tenant, status or role. Returns id, vid, name, site and status.",
        &[
            ("vid", integer("802.1Q VLAN ID")),
            ("name", string("VLAN name")),
            ("site", string("Site slug")),
            ("group", string("VLAN group slug")),
            ("tenant", string("Tenant slug")),
            ("status", string("active, reserved, deprecated")),
            ("role", string("VLAN role slug")),
        ],
    )
}

/// Defines the cached reference-data lookup.
pub fn get_cached_resources_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_cached_resources".to_string(),
        description: "Read cached reference data (sites, device_types, device_roles, manufacturers) without calling NetBox. Use it to resolve the exact names and slugs other tools filter on.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "resource_type": {
                    "type": "string",
                    "description": "One resource type; all when omitted",
                    "enum": ["sites", "device_types", "device_roles", "manufacturers"]
                },
                "include_metadata": {
                    "type": "boolean",
                    "description": "Include cache status details (default: true)"
                }
            }
        }),
    }
}

/// Defines the cached reference-data summary.
pub fn get_resource_summary_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_resource_summary".to_string(),
        description: "Condensed overview of the cached reference data: counts, a sample of names, regions and manufacturers.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "resource_type": {
                    "type": "string",
                    "description": "One resource type; all when omitted",
                    "enum": ["sites", "device_types", "device_roles", "manufacturers"]
                }
            }
        }),
    }
}

/// Defines the prompt catalog.
pub fn get_available_prompts_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_available_prompts".to_string(),
        description: "List the analysis prompts (path tracing, interface analysis, site discovery, patch panels) with their parameters and use cases.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "prompt_type": {
                    "type": "string",
                    "description": "One prompt; all when omitted",
                    "enum": ["TraceNetworkPath", "DeviceInterfaces", "SiteNetworkInfrastructure", "PatchPanelAnalysis"]
                },
                "include_examples": {
                    "type": "boolean",
                    "description": "Include an example request per prompt (default: true)"
                }
            }
        }),
    }
}

fn listing_tool(name: &str, description: &str, filters: &[(&str, Value)]) -> ToolDefinition {
    let mut properties: Map<String, Value> = filters
        .iter()
        .map(|(key, schema)| ((*key).to_string(), schema.clone()))
        .collect();
    properties.insert(
        "limit".to_string(),
        json!({
            "type": "integer",
            "description": "Maximum number of results (default: 100)",
            "minimum": 1,
            "maximum": 1000
        }),
    );

    ToolDefinition {
        name: name.to_string(),
        description: format!("{description} {CACHE_HINT}"),
        input_schema: json!({
            "type": "object",
            "properties": properties,
        }),
    }
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn integer(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_unique() {
        let tools = all_tools();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_trace_tool_requires_both_devices() {
        let tool = trace_devices_connection_tool();
        assert_eq!(
            tool.input_schema["required"],
            json!(["source_device", "target_device"])
        );
    }

    #[test]
    fn test_listing_tools_carry_limit() {
        let tool = get_interfaces_tool();
        let properties = &tool.input_schema["properties"];
        assert_eq!(properties["limit"]["maximum"], 1000);
        assert_eq!(properties["cabled"]["type"], "boolean");
        assert!(tool.description.contains("get_cached_resources"));
    }
}
