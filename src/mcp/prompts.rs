//! Network analysis prompts.
//!
//! Each prompt renders a single user message that tells the agent which
//! tools to call, in which order, for a common investigation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registry of analysis prompts, in catalog order.
pub struct PromptRegistry {
    prompts: Vec<PromptDefinition>,
}

impl PromptRegistry {
    /// Creates the registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prompts: vec![
                trace_network_path_prompt(),
                device_interfaces_prompt(),
                site_infrastructure_prompt(),
                patch_panel_prompt(),
            ],
        }
    }

    /// Returns all prompt definitions.
    #[must_use]
    pub fn list_prompts(&self) -> Vec<&PromptDefinition> {
        self.prompts.iter().collect()
    }

    /// Gets a prompt definition by name.
    #[must_use]
    pub fn get_prompt(&self, name: &str) -> Option<&PromptDefinition> {
        self.prompts.iter().find(|p| p.name == name)
    }

    /// Returns the prompt names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.prompts.iter().map(|p| p.name.as_str()).collect()
    }

    /// Renders the messages of a prompt, `None` for unknown names.
    ///
    /// Missing optional arguments fall back to their defaults.
    #[must_use]
    pub fn get_prompt_messages(&self, name: &str, arguments: &Value) -> Option<Vec<PromptMessage>> {
        let text = match name {
            "TraceNetworkPath" => render_trace_network_path(
                argument(arguments, "source_device").unwrap_or("<source>"),
                argument(arguments, "destination_device").unwrap_or("<destination>"),
            ),
            "DeviceInterfaces" => render_device_interfaces(
                argument(arguments, "device_name").unwrap_or("<device>"),
                argument(arguments, "interface_type").unwrap_or("all"),
                argument(arguments, "connection_status").unwrap_or("connected"),
            ),
            "SiteNetworkInfrastructure" => render_site_infrastructure(
                argument(arguments, "site_name").unwrap_or("<site>"),
                argument(arguments, "device_role").unwrap_or("all"),
            ),
            "PatchPanelAnalysis" => render_patch_panel(
                argument(arguments, "site_name"),
                argument(arguments, "device_name"),
            ),
            _ => return None,
        };
        tracing::debug!(prompt = name, "Rendered prompt");
        Some(vec![PromptMessage::user(text)])
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Definition of an MCP prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Prompt name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Prompt arguments.
    pub arguments: Vec<PromptArgument>,
    /// Catalog category, as listed by `get_available_prompts`.
    pub category: String,
    /// What the prompt is for.
    pub use_case: String,
    /// Example request.
    pub example: String,
}

/// Argument for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether the argument is required.
    pub required: bool,
}

impl PromptArgument {
    fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: Some(description.to_string()),
            required: true,
        }
    }

    fn optional(name: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }
}

/// A message in a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Role: user or assistant.
    pub role: String,
    /// Message content.
    pub content: PromptContent,
}

impl PromptMessage {
    fn user(text: String) -> Self {
        Self {
            role: "user".to_string(),
            content: PromptContent::Text { text },
        }
    }
}

/// Content of a prompt message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

fn argument<'a>(arguments: &'a Value, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn trace_network_path_prompt() -> PromptDefinition {
    PromptDefinition {
        name: "TraceNetworkPath".to_string(),
        description: Some(
            "Builds a network path between two devices using bidirectional search".to_string(),
        ),
        arguments: vec![
            PromptArgument::required("source_device", "Device the path starts at"),
            PromptArgument::required("destination_device", "Device the path ends at"),
        ],
        category: "Network Analysis".to_string(),
        use_case: "Network troubleshooting and path analysis between devices".to_string(),
        example: "Trace the complete network path from server-01 to switch-core-01".to_string(),
    }
}

fn device_interfaces_prompt() -> PromptDefinition {
    PromptDefinition {
        name: "DeviceInterfaces".to_string(),
        description: Some(
            "Analyzes a device's interface types, utilization, and connectivity".to_string(),
        ),
        arguments: vec![
            PromptArgument::required("device_name", "Device to analyze"),
            PromptArgument::optional("interface_type", "Interface type filter (default: all)"),
            PromptArgument::optional(
                "connection_status",
                "Connection filter: connected or disconnected (default: connected)",
            ),
        ],
        category: "Device Analysis".to_string(),
        use_case: "Device interface monitoring and troubleshooting".to_string(),
        example: "Analyze all interfaces on core-switch-01 for connectivity issues".to_string(),
    }
}

fn site_infrastructure_prompt() -> PromptDefinition {
    PromptDefinition {
        name: "SiteNetworkInfrastructure".to_string(),
        description: Some(
            "Discovers the devices at a site and builds its network topology".to_string(),
        ),
        arguments: vec![
            PromptArgument::required("site_name", "Site to map"),
            PromptArgument::optional("device_role", "Device role filter (default: all)"),
        ],
        category: "Infrastructure Discovery".to_string(),
        use_case: "Site infrastructure documentation and planning".to_string(),
        example: "Map the complete network infrastructure at datacenter-1".to_string(),
    }
}

fn patch_panel_prompt() -> PromptDefinition {
    PromptDefinition {
        name: "PatchPanelAnalysis".to_string(),
        description: Some(
            "Analyzes patch panel connections and cable management".to_string(),
        ),
        arguments: vec![
            PromptArgument::optional("site_name", "Restrict to one site"),
            PromptArgument::optional("device_name", "Restrict to one patch panel"),
        ],
        category: "Cable Management".to_string(),
        use_case: "Patch panel documentation and cable management".to_string(),
        example: "Analyze patch panel connections at datacenter-1".to_string(),
    }
}

fn render_trace_network_path(source: &str, destination: &str) -> String {
    format!(
        r"Trace the network path from {source} to {destination}.

**Tools, in order:**
1. `trace_devices_connection` with source_device={source}, target_device={destination}.
   It searches from both ends at once and returns every hop, the meeting point and `total_hops`.
2. If no path is found, inspect each end: `get_interfaces` (device filter, cabled=true),
   then `trace_from_interface` on a cabled interface to see how far the cabling reaches.
3. `get_cable` for any cable ID in the path that needs type or status details.

**Report:**
- Every hop as device/interface, cable ID, next device/interface
- Patch panels crossed, with the front and rear ports used
- Total hop count and the meeting device
- Missing or unexpected segments"
    )
}

fn render_device_interfaces(device: &str, interface_type: &str, connection_status: &str) -> String {
    format!(
        r"Analyze the interfaces of {device}.

**Tools, in order:**
1. `get_devices` to confirm {device} exists and note its role and type.
2. `get_interfaces` with device={device}, type={interface_type}, connected={connection_status}.
   Omit the type filter when it is `all`.
3. `get_front_ports` and `get_rear_ports` with device={device} if it is a patch panel.
4. `trace_from_interface` on uplinks to see what sits behind them.

**Report:**
- Interface inventory with status (connected, enabled, disabled) and VLANs
- Connected versus unconnected counts
- Uplinks and downlinks, and the devices they reach
- Anything that looks misconfigured"
    )
}

fn render_site_infrastructure(site: &str, device_role: &str) -> String {
    format!(
        r"Map the network infrastructure at site {site}.

**Tools, in order:**
1. `get_cached_resources` for sites, device roles and device types, to resolve exact slugs.
2. `get_devices` with site={site} and role={device_role} (omit role when it is `all`).
3. `get_interfaces` per core and distribution device, cabled=true.
4. `get_front_ports` and `get_rear_ports` to inventory patch panels.
5. `trace_devices_connection` between core, distribution and access devices.

**Report:**
- Device inventory grouped by role
- Topology from core to access
- Patch panel locations and port assignments
- Gaps in the documented cabling"
    )
}

fn render_patch_panel(site: Option<&str>, device: Option<&str>) -> String {
    let scope = match (site, device) {
        (_, Some(device)) => format!("patch panel {device}"),
        (Some(site), None) => format!("patch panels at site {site}"),
        (None, None) => "all patch panels".to_string(),
    };
    format!(
        r"Analyze {scope}.

**Tools, in order:**
1. `get_devices` filtered to patch panel device types to list the panels.
2. `get_front_ports` for the front side (cables from devices).
3. `get_rear_ports` for the rear side (trunks to other panels or equipment).
4. `trace_from_interface` from a device interface to follow a path through the panels.
5. `get_cable` for details on individual cables.

**Report:**
- Front to rear port mapping per panel
- Port utilization (cabled versus free)
- Cable types and statuses
- Paths that end at a panel without reaching a device"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_order() {
        let registry = PromptRegistry::new();
        assert_eq!(
            registry.names(),
            vec![
                "TraceNetworkPath",
                "DeviceInterfaces",
                "SiteNetworkInfrastructure",
                "PatchPanelAnalysis"
            ]
        );
    }

    #[test]
    fn test_render_with_arguments() {
        let registry = PromptRegistry::new();
        let messages = registry
            .get_prompt_messages(
                "TraceNetworkPath",
                &json!({"source_device": "srv-01", "destination_device": "core-01"}),
            )
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        let PromptContent::Text { text } = &messages[0].content;
        assert!(text.contains("source_device=srv-01"));
        assert!(text.contains("trace_devices_connection"));
    }

    #[test]
    fn test_defaults_apply() {
        let registry = PromptRegistry::new();
        let messages = registry
            .get_prompt_messages("DeviceInterfaces", &json!({"device_name": "sw1"}))
            .unwrap();
        let PromptContent::Text { text } = &messages[0].content;
        assert!(text.contains("type=all"));
        assert!(text.contains("connected=connected"));
    }

    #[test]
    fn test_patch_panel_scope() {
        let registry = PromptRegistry::new();
        let messages = registry
            .get_prompt_messages("PatchPanelAnalysis", &json!({"site_name": "dc1"}))
            .unwrap();
        let PromptContent::Text { text } = &messages[0].content;
        assert!(text.starts_with("Analyze patch panels at site dc1."));
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(PromptRegistry::new().get_prompt_messages("nope", &json!({})).is_none());
    }
}
