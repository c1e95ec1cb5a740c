//! Cable lookup and tracing handlers.

use super::{ToolContext, ToolResult, backend, parse_args};
use crate::mcp::tool_types::{GetCableArgs, TraceDevicesArgs, TraceInterfaceArgs};
use crate::topology::{PathOutcome, PathTracer, Termination, TreeTracer};
use crate::{Error, Result};
use serde_json::{Value, json};

/// Executes `trace_devices_connection`.
pub fn execute_trace_devices_connection(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: TraceDevicesArgs = parse_args(arguments)?;
    let backend = match backend(ctx) {
        Ok(backend) => backend,
        Err(result) => return Ok(result),
    };
    let max_iterations = ctx.trace.iterations(args.max_iterations);

    let outcome = PathTracer::new(backend).trace(&args.source_device, &args.target_device, max_iterations);
    Ok(match outcome {
        Ok(found @ PathOutcome::Found { .. }) => ToolResult::json(&found.to_json()),
        Ok(exhausted) => {
            tracing::info!(
                source = %args.source_device,
                target = %args.target_device,
                max_iterations,
                "No path found"
            );
            ToolResult::error_json(&exhausted.to_json())
        },
        Err(e @ Error::NotFound { .. }) => ToolResult::error(e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Path trace failed");
            ToolResult::error(format!("Failed to trace connection: {e}"))
        },
    })
}

/// Executes `trace_from_interface`.
pub fn execute_trace_from_interface(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: TraceInterfaceArgs = parse_args(arguments)?;
    let backend = match backend(ctx) {
        Ok(backend) => backend,
        Err(result) => return Ok(result),
    };
    let max_depth = ctx.trace.depth(args.max_depth);

    let outcome = TreeTracer::new(backend).trace(&args.device_name, &args.interface_name, max_depth);
    Ok(match outcome {
        Ok(outcome) => ToolResult::json(&outcome.to_json()),
        Err(Error::NotFound { .. }) => ToolResult::error(format!(
            "Interface '{}' not found on device '{}'",
            args.interface_name, args.device_name
        )),
        Err(e) => {
            tracing::error!(error = %e, "Tree trace failed");
            ToolResult::error(format!("Failed to trace from interface: {e}"))
        },
    })
}

/// Executes `get_cable`.
pub fn execute_get_cable(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: GetCableArgs = parse_args(arguments)?;
    let backend = match backend(ctx) {
        Ok(backend) => backend,
        Err(result) => return Ok(result),
    };

    Ok(match backend.get_cable(args.cable_id) {
        Ok(Some(cable)) => {
            let terminations: Vec<Value> = cable
                .terminations()
                .map(|record| Termination::classify(record).describe())
                .collect();
            ToolResult::json(&json!({
                "cable_id": cable.id,
                "cable_type": cable.cable_type,
                "status": cable.status,
                "terminations": terminations,
            }))
        },
        Ok(None) => ToolResult::error(format!("Cable with ID {} not found", args.cable_id)),
        Err(e) => {
            tracing::error!(cable_id = args.cable_id, error = %e, "Cable lookup failed");
            ToolResult::error(format!("Failed to get cable: {e}"))
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResourceCache;
    use crate::config::TraceSettings;
    use crate::inventory::{EndpointRef, InMemoryInventory, Inventory, UNAVAILABLE_MESSAGE};

    fn context(inventory: InMemoryInventory) -> ToolContext {
        ToolContext {
            inventory: Inventory::new(inventory),
            trace: TraceSettings::default(),
            cache: ResourceCache::new("unused"),
        }
    }

    fn straight() -> InMemoryInventory {
        let inventory = InMemoryInventory::new();
        inventory.add_device("x", "server");
        inventory.add_device("y", "switch");
        inventory.connect_interfaces(7, ("x", "eth0"), ("y", "eth0"));
        inventory
    }

    #[test]
    fn test_trace_devices_found() {
        let ctx = context(straight());
        let result = execute_trace_devices_connection(
            &ctx,
            json!({"source_device": "x", "target_device": "y"}),
        )
        .unwrap();

        assert!(!result.is_error);
        let payload = result.payload().unwrap();
        assert_eq!(payload["total_hops"], 1);
        assert_eq!(payload["path"][0]["cable_id"], 7);
    }

    #[test]
    fn test_trace_devices_missing_source() {
        let ctx = context(straight());
        let result = execute_trace_devices_connection(
            &ctx,
            json!({"source_device": "ghost", "target_device": "y"}),
        )
        .unwrap();

        assert!(result.is_error);
        assert_eq!(result.payload().unwrap()["error"], "Source device 'ghost' not found");
    }

    #[test]
    fn test_trace_devices_rejects_unknown_argument() {
        let ctx = context(straight());
        let err = execute_trace_devices_connection(
            &ctx,
            json!({"source_device": "x", "target_device": "y", "depth": 3}),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_trace_from_interface_missing() {
        let ctx = context(straight());
        let result = execute_trace_from_interface(
            &ctx,
            json!({"device_name": "x", "interface_name": "eth9"}),
        )
        .unwrap();

        assert_eq!(
            result.payload().unwrap()["error"],
            "Interface 'eth9' not found on device 'x'"
        );
    }

    #[test]
    fn test_trace_from_interface_tree() {
        let ctx = context(straight());
        let result = execute_trace_from_interface(
            &ctx,
            json!({"device_name": "x", "interface_name": "eth0", "max_depth": 5}),
        )
        .unwrap();

        let payload = result.payload().unwrap();
        assert_eq!(payload["metadata"]["total_cables"], 1);
        assert_eq!(payload["metadata"]["max_depth"], 5);
        assert_eq!(payload["tree"]["children"][0]["device"], "y");
    }

    #[test]
    fn test_get_cable() {
        let inventory = straight();
        inventory.add_front_port("pp1", "front1", "rear1");
        inventory.connect(
            8,
            &[EndpointRef::interface("x", "eth1")],
            &[EndpointRef::front("pp1", "front1")],
        );
        let ctx = context(inventory);

        let payload = execute_get_cable(&ctx, json!({"cable_id": 8}))
            .unwrap()
            .payload()
            .unwrap();
        assert_eq!(payload["cable_id"], 8);
        assert_eq!(payload["status"], "connected");
        assert_eq!(payload["terminations"][0]["type"], "interface");
        assert_eq!(payload["terminations"][1]["type"], "front_port");
        assert_eq!(payload["terminations"][1]["rear_port"], "rear1");
    }

    #[test]
    fn test_get_cable_not_found_names_id() {
        let ctx = context(straight());
        let result = execute_get_cable(&ctx, json!({"cable_id": 404})).unwrap();

        assert!(result.is_error);
        assert_eq!(result.payload().unwrap()["error"], "Cable with ID 404 not found");
    }

    #[test]
    fn test_unavailable_inventory() {
        let ctx = ToolContext {
            inventory: Inventory::Unavailable("unset".to_string()),
            trace: TraceSettings::default(),
            cache: ResourceCache::new("unused"),
        };
        let result = execute_get_cable(&ctx, json!({"cable_id": 1})).unwrap();
        assert_eq!(result.payload().unwrap()["error"], UNAVAILABLE_MESSAGE);
    }
}
