//! MCP server end-to-end tests.
//!
//! Drives the JSON-RPC server over in-memory streams, focusing on:
//! - Handshake and discovery
//! - Tool calls against an in-memory inventory
//! - Cache-backed resources and tools
//! - The unavailable-inventory sentinel
//! - Error response format

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::Utc;
use netbox_mcp::cache::{ResourceCache, ResourceKind};
use netbox_mcp::config::TraceSettings;
use netbox_mcp::inventory::{EndpointRef, InMemoryInventory, Inventory, UNAVAILABLE_MESSAGE};
use netbox_mcp::mcp::{McpServer, ToolContext};
use serde_json::{Value, json};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn lab() -> InMemoryInventory {
    let inventory = InMemoryInventory::new();
    inventory.add_device("srv1", "server");
    inventory.add_device("pp1", "patch-panel");
    inventory.add_device("sw1", "access-switch");
    inventory.add_interface("srv1", "eth0");
    inventory.add_interface("sw1", "ge0");
    inventory.add_front_port("pp1", "front1", "rear1");
    inventory.connect(
        11,
        &[EndpointRef::interface("srv1", "eth0")],
        &[EndpointRef::front("pp1", "front1")],
    );
    inventory.connect(
        12,
        &[EndpointRef::rear("pp1", "rear1")],
        &[EndpointRef::interface("sw1", "ge0")],
    );
    inventory
}

fn server_with(inventory: Inventory, cache_dir: &TempDir) -> McpServer {
    McpServer::from_context(ToolContext {
        inventory,
        trace: TraceSettings::default(),
        cache: ResourceCache::new(cache_dir.path()),
    })
}

/// Feeds `requests` through the stdio loop and returns the parsed responses.
fn exchange(server: &McpServer, requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn call_tool(server: &McpServer, name: &str, arguments: Value) -> (bool, Value) {
    let responses = exchange(
        server,
        &[json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })],
    );
    let result = &responses[0]["result"];
    let text = result["content"][0]["text"].as_str().unwrap();
    let payload = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
    (result["isError"].as_bool().unwrap(), payload)
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn test_session_handshake_and_discovery() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::new(lab()), &dir);

    let responses = exchange(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05"}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "prompts/list"}),
            json!({"jsonrpc": "2.0", "id": 5, "method": "ping"}),
        ],
    );

    assert_eq!(responses.len(), 5, "notification must not be answered");
    let ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "netbox-mcp");
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 16);

    let uris: Vec<&str> = responses[2]["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(
        uris,
        vec![
            "netbox://sites",
            "netbox://device-types",
            "netbox://device-roles",
            "netbox://manufacturers"
        ]
    );
    assert_eq!(responses[3]["result"]["prompts"].as_array().unwrap().len(), 4);
    assert_eq!(responses[4]["result"], json!({}));
}

#[test]
fn test_tool_schemas_are_closed_objects() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::new(lab()), &dir);

    let responses = exchange(&server, &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})]);
    for tool in responses[0]["result"]["tools"].as_array().unwrap() {
        assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        assert!(!tool["description"].as_str().unwrap().is_empty());
    }
}

// ============================================================================
// Inventory tools
// ============================================================================

#[test]
fn test_trace_tools_over_the_wire() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::new(lab()), &dir);

    let (is_error, path) = call_tool(
        &server,
        "trace_devices_connection",
        json!({"source_device": "srv1", "target_device": "sw1"}),
    );
    assert!(!is_error);
    assert_eq!(path["total_hops"], 2);
    assert_eq!(path["path"][0]["next_device"], "pp1");

    let (is_error, tree) = call_tool(
        &server,
        "trace_from_interface",
        json!({"device_name": "srv1", "interface_name": "eth0"}),
    );
    assert!(!is_error);
    assert_eq!(tree["metadata"]["total_cables"], 2);
    assert_eq!(tree["metadata"]["max_depth"], 10);

    let (is_error, cable) = call_tool(&server, "get_cable", json!({"cable_id": 12}));
    assert!(!is_error);
    assert_eq!(cable["terminations"][0]["type"], "rear_port");
}

#[test]
fn test_listing_tools_over_the_wire() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::new(lab()), &dir);

    let (_, devices) = call_tool(&server, "get_devices", json!({"device_role": "server"}));
    assert_eq!(devices["devices"][0]["name"], "srv1");

    let (_, interfaces) = call_tool(&server, "get_interfaces", json!({"device": "sw1"}));
    assert_eq!(interfaces["interfaces"][0]["status"], "connected");
    assert_eq!(interfaces["summary"]["connected"], 1);

    let (_, rear) = call_tool(&server, "get_rear_ports", json!({"device": "pp1", "limit": 5}));
    assert_eq!(rear["rear_ports"][0]["name"], "rear1");
    assert_eq!(rear["metadata"]["limit"], 5);

    let (is_error, bad) = call_tool(&server, "get_sites", json!({"limit": 0}));
    assert!(is_error);
    assert_eq!(bad["error"], "Limit must be between 1 and 1000");
}

#[test]
fn test_bad_arguments_are_tool_errors() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::new(lab()), &dir);

    let (is_error, _) = call_tool(&server, "get_cable", json!({"cable_id": "eleven"}));
    assert!(is_error);

    let (is_error, _) = call_tool(&server, "trace_devices_connection", json!({"source_device": "srv1"}));
    assert!(is_error);
}

#[test]
fn test_unavailable_inventory_sentinel() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::Unavailable("NETBOX_URL not set".to_string()), &dir);

    for (name, arguments) in [
        ("trace_devices_connection", json!({"source_device": "a", "target_device": "b"})),
        ("get_cable", json!({"cable_id": 1})),
        ("get_vlans", json!({})),
    ] {
        let (is_error, payload) = call_tool(&server, name, arguments);
        assert!(is_error, "{name}");
        assert_eq!(payload["error"], UNAVAILABLE_MESSAGE, "{name}");
    }

    let (is_error, prompts) = call_tool(&server, "get_available_prompts", json!({}));
    assert!(!is_error);
    assert_eq!(prompts["metadata"]["total_count"], 4);
}

// ============================================================================
// Cache-backed resources and tools
// ============================================================================

#[test]
fn test_cached_resources_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = ResourceCache::new(dir.path());
    cache
        .write(
            ResourceKind::Sites,
            vec![json!({"id": 1, "name": "DC1", "slug": "dc1", "status": "active", "region": "EU"})],
            Utc::now(),
        )
        .unwrap();
    let server = server_with(Inventory::Unavailable("offline".to_string()), &dir);

    let responses = exchange(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "resources/read", "params": {"uri": "netbox://sites"}}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/read", "params": {"uri": "netbox://manufacturers"}}),
        ],
    );

    let sites: Value =
        serde_json::from_str(responses[0]["result"]["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(sites["metadata"]["count"], 1);
    assert_eq!(sites["data"][0]["name"], "DC1");

    let missing: Value =
        serde_json::from_str(responses[1]["result"]["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(missing["data"], json!([]));
    assert!(missing["error"].as_str().unwrap().contains("manufacturers.json"));

    let (_, summary) = call_tool(&server, "get_resource_summary", json!({"resource_type": "sites"}));
    assert_eq!(summary["summaries"]["sites"]["regions"], json!(["EU"]));
}

// ============================================================================
// Protocol errors
// ============================================================================

#[test]
fn test_protocol_errors() {
    let dir = TempDir::new().unwrap();
    let server = server_with(Inventory::new(lab()), &dir);

    let input = "{not json}\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"tools/destroy\"}\n";
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).unwrap();
    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[0].get("id").is_none());
    assert_eq!(responses[1]["error"]["code"], -32601);
    assert_eq!(responses[1]["id"], 9);
}
