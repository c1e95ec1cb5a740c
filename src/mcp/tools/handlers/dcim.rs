//! DCIM listing handlers: devices, sites, interfaces, front and rear ports.

use super::{Listing, ToolContext, ToolResult, parse_args};
use crate::Result;
use crate::inventory::models::{
    Device, FrontPortRecord, InterfaceRecord, RearPortRecord, SiteRecord, choice_value, decode,
};
use crate::inventory::{Endpoint, NestedRef};
use crate::mcp::tool_types::{
    DevicesArgs, Filters, FrontPortsArgs, InterfacesArgs, RearPortsArgs, SitesArgs,
};
use serde_json::{Map, Value, json};

const DEVICES: Listing = Listing {
    endpoint: Endpoint::Devices,
    items_key: "devices",
    noun: "device",
    project: project_device,
    with_summary: false,
};

const SITES: Listing = Listing {
    endpoint: Endpoint::Sites,
    items_key: "sites",
    noun: "site",
    project: project_site,
    with_summary: false,
};

const INTERFACES: Listing = Listing {
    endpoint: Endpoint::Interfaces,
    items_key: "interfaces",
    noun: "interface",
    project: project_interface,
    with_summary: true,
};

const FRONT_PORTS: Listing = Listing {
    endpoint: Endpoint::FrontPorts,
    items_key: "front_ports",
    noun: "front port",
    project: project_front_port,
    with_summary: true,
};

const REAR_PORTS: Listing = Listing {
    endpoint: Endpoint::RearPorts,
    items_key: "rear_ports",
    noun: "rear port",
    project: project_rear_port,
    with_summary: true,
};

/// Executes `get_devices`.
pub fn execute_get_devices(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: DevicesArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("site", args.site)
        .with_param("device_role", "role", args.device_role)
        .with("device_type", args.device_type);
    Ok(DEVICES.run(ctx, &filters, args.limit))
}

/// Executes `get_sites`.
pub fn execute_get_sites(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: SitesArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("id", args.id)
        .with("slug", args.slug)
        .with("status", args.status);
    Ok(SITES.run(ctx, &filters, args.limit))
}

/// Executes `get_interfaces`.
pub fn execute_get_interfaces(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: InterfacesArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("device", args.device)
        .with("device_id", args.device_id)
        .with("name", args.name)
        .with("type", args.interface_type)
        .with("kind", args.kind)
        .with("enabled", args.enabled)
        .with("cabled", args.cabled)
        .with("connected", args.connected)
        .with("mgmt_only", args.mgmt_only)
        .with("lag", args.lag)
        .with("mode", args.mode);
    Ok(INTERFACES.run(ctx, &filters, args.limit))
}

/// Executes `get_front_ports`.
pub fn execute_get_front_ports(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: FrontPortsArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("device", args.device)
        .with("device_id", args.device_id)
        .with("name", args.name)
        .with("type", args.port_type)
        .with("cabled", args.cabled)
        .with("rear_port", args.rear_port)
        .with("rear_port_id", args.rear_port_id);
    Ok(FRONT_PORTS.run(ctx, &filters, args.limit))
}

/// Executes `get_rear_ports`.
pub fn execute_get_rear_ports(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: RearPortsArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("device", args.device)
        .with("device_id", args.device_id)
        .with("name", args.name)
        .with("type", args.port_type)
        .with("positions", args.positions)
        .with("cabled", args.cabled);
    Ok(REAR_PORTS.run(ctx, &filters, args.limit))
}

fn name_of(nested: Option<&NestedRef>) -> Option<&str> {
    nested.and_then(|n| n.name.as_deref())
}

fn project_device(record: Value) -> Result<Value> {
    let device: Device = decode("device", record)?;

    let mut item = Map::new();
    item.insert("id".to_string(), json!(device.id));
    item.insert("name".to_string(), json!(device.name));
    item.insert(
        "type".to_string(),
        json!(device.device_type.as_ref().and_then(|t| t.model.as_deref())),
    );
    item.insert("role".to_string(), json!(name_of(device.role.as_ref())));
    item.insert("rack".to_string(), json!(name_of(device.rack.as_ref())));

    let custom_fields: Map<String, Value> = device
        .custom_fields
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    if !custom_fields.is_empty() {
        item.insert("custom_fields".to_string(), Value::Object(custom_fields));
    }
    Ok(Value::Object(item))
}

fn project_site(record: Value) -> Result<Value> {
    let site: SiteRecord = decode("site", record)?;
    Ok(json!({
        "id": site.id,
        "name": site.name,
        "slug": site.slug,
        "status": choice_value(site.status.as_ref()),
    }))
}

fn project_interface(record: Value) -> Result<Value> {
    let interface: InterfaceRecord = decode("interface", record)?;
    let enabled = interface.enabled.unwrap_or(false);
    let status = match (enabled, interface.cable.is_some()) {
        (true, true) => "connected",
        (true, false) => "enabled",
        (false, _) => "disabled",
    };

    let untagged = interface.untagged_vlan.as_ref().and_then(|v| v.vid);
    let tagged: Vec<String> = interface
        .tagged_vlans
        .iter()
        .flatten()
        .filter_map(|v| v.vid)
        .map(|vid| vid.to_string())
        .collect();
    let vlan = match untagged {
        Some(vid) => Some(format!("untagged:{vid}")),
        None if !tagged.is_empty() => Some(format!("tagged:{}", tagged.join(","))),
        None => None,
    };

    Ok(json!({
        "id": interface.id,
        "name": interface.name,
        "device_name": name_of(interface.device.as_ref()),
        "type": choice_value(interface.interface_type.as_ref()),
        "status": status,
        "kind": choice_value(interface.kind.as_ref()),
        "vlan": vlan,
    }))
}

fn project_front_port(record: Value) -> Result<Value> {
    let port: FrontPortRecord = decode("front port", record)?;
    Ok(json!({
        "id": port.id,
        "name": port.name,
        "connected": port.cable.is_some(),
        "device_name": name_of(port.device.as_ref()),
        "type": choice_value(port.port_type.as_ref()),
        "kind": "front_port",
        "rear_port": name_of(port.rear_port.as_ref()),
    }))
}

fn project_rear_port(record: Value) -> Result<Value> {
    let port: RearPortRecord = decode("rear port", record)?;
    Ok(json!({
        "id": port.id,
        "name": port.name,
        "connected": port.cable.is_some(),
        "device_name": name_of(port.device.as_ref()),
        "type": choice_value(port.port_type.as_ref()),
        "kind": "rear_port",
        "positions": port.positions,
    }))
}
