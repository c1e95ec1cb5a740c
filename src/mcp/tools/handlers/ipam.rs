//! IPAM listing handlers.

use super::{Listing, ToolContext, ToolResult, parse_args};
use crate::Result;
use crate::inventory::models::{
    IpAddressRecord, IpRangeRecord, PrefixRecord, VlanRecord, VrfRecord, choice_value, decode,
};
use crate::inventory::{Endpoint, NestedRef};
use crate::mcp::tool_types::{
    Filters, IpAddressesArgs, IpRangesArgs, PrefixesArgs, VlansArgs, VrfsArgs,
};
use serde_json::{Value, json};

const IP_ADDRESSES: Listing = Listing {
    endpoint: Endpoint::IpAddresses,
    items_key: "ip_addresses",
    noun: "IP address",
    project: project_ip_address,
    with_summary: false,
};

const PREFIXES: Listing = Listing {
    endpoint: Endpoint::Prefixes,
    items_key: "prefixes",
    noun: "prefix",
    project: project_prefix,
    with_summary: false,
};

const IP_RANGES: Listing = Listing {
    endpoint: Endpoint::IpRanges,
    items_key: "ip_ranges",
    noun: "IP range",
    project: project_ip_range,
    with_summary: false,
};

const VRFS: Listing = Listing {
    endpoint: Endpoint::Vrfs,
    items_key: "vrfs",
    noun: "VRF",
    project: project_vrf,
    with_summary: false,
};

const VLANS: Listing = Listing {
    endpoint: Endpoint::Vlans,
    items_key: "vlans",
    noun: "VLAN",
    project: project_vlan,
    with_summary: false,
};

/// Executes `get_ip_addresses`.
pub fn execute_get_ip_addresses(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: IpAddressesArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("device", args.device)
        .with("interface", args.interface)
        .with("interface_id", args.interface_id)
        .with("address", args.address)
        .with("parent", args.parent)
        .with("family", args.family)
        .with("status", args.status)
        .with("role", args.role)
        .with("vrf", args.vrf)
        .with("vrf_id", args.vrf_id)
        .with("assigned_to_interface", args.assigned_to_interface);
    Ok(IP_ADDRESSES.run(ctx, &filters, args.limit))
}

/// Executes `get_ip_prefixes`.
pub fn execute_get_ip_prefixes(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: PrefixesArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("prefix", args.prefix)
        .with("within", args.within)
        .with("within_include", args.within_include)
        .with("contains", args.contains)
        .with("family", args.family)
        .with("status", args.status)
        .with("role", args.role)
        .with("site", args.site)
        .with("vrf", args.vrf)
        .with("vrf_id", args.vrf_id)
        .with("tenant", args.tenant)
        .with("is_pool", args.is_pool);
    Ok(PREFIXES.run(ctx, &filters, args.limit))
}

/// Executes `get_ip_ranges`.
pub fn execute_get_ip_ranges(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: IpRangesArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("start_address", args.start_address)
        .with("end_address", args.end_address)
        .with("family", args.family)
        .with("status", args.status)
        .with("role", args.role)
        .with("vrf", args.vrf)
        .with("vrf_id", args.vrf_id)
        .with("tenant", args.tenant);
    Ok(IP_RANGES.run(ctx, &filters, args.limit))
}

/// Executes `get_vrfs`.
pub fn execute_get_vrfs(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: VrfsArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("name", args.name)
        .with("rd", args.rd)
        .with("tenant", args.tenant)
        .with("enforce_unique", args.enforce_unique);
    Ok(VRFS.run(ctx, &filters, args.limit))
}

/// Executes `get_vlans`.
pub fn execute_get_vlans(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: VlansArgs = parse_args(arguments)?;
    let filters = Filters::new()
        .with("vid", args.vid)
        .with("name", args.name)
        .with("site", args.site)
        .with("group", args.group)
        .with("tenant", args.tenant)
        .with("status", args.status)
        .with("role", args.role);
    Ok(VLANS.run(ctx, &filters, args.limit))
}

/// `{id, name}` of a nested object, or null.
fn id_name(nested: Option<&NestedRef>) -> Value {
    nested.map_or(Value::Null, |n| json!({ "id": n.id, "name": n.label() }))
}

fn project_ip_address(record: Value) -> Result<Value> {
    let ip: IpAddressRecord = decode("IP address", record)?;
    Ok(json!({
        "id": ip.id,
        "address": ip.address,
        "status": choice_value(ip.status.as_ref()),
        "vrf": id_name(ip.vrf.as_ref()),
        "assigned_object": id_name(ip.assigned_object.as_ref()),
    }))
}

fn project_prefix(record: Value) -> Result<Value> {
    let prefix: PrefixRecord = decode("prefix", record)?;
    Ok(json!({
        "id": prefix.id,
        "prefix": prefix.prefix,
        "status": choice_value(prefix.status.as_ref()),
        "site": id_name(prefix.site.as_ref()),
        "vrf": id_name(prefix.vrf.as_ref()),
        "vlan": prefix.vlan.map(|v| json!({ "id": v.id, "vid": v.vid, "name": v.name })),
    }))
}

fn project_ip_range(record: Value) -> Result<Value> {
    let range: IpRangeRecord = decode("IP range", record)?;
    Ok(json!({
        "id": range.id,
        "start_address": range.start_address,
        "end_address": range.end_address,
        "status": choice_value(range.status.as_ref()),
        "vrf": id_name(range.vrf.as_ref()),
        "utilization": range.utilization,
    }))
}

fn project_vrf(record: Value) -> Result<Value> {
    let vrf: VrfRecord = decode("VRF", record)?;
    Ok(json!({ "id": vrf.id, "name": vrf.name, "rd": vrf.rd }))
}

fn project_vlan(record: Value) -> Result<Value> {
    let vlan: VlanRecord = decode("VLAN", record)?;
    Ok(json!({
        "id": vlan.id,
        "vid": vlan.vid,
        "name": vlan.name,
        "site": id_name(vlan.site.as_ref()),
        "status": choice_value(vlan.status.as_ref()),
    }))
}
