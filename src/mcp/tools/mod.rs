//! MCP tool implementations.
//!
//! # Module Structure
//!
//! - [`definitions`]: tool names, descriptions and JSON Schemas
//! - [`handlers`]: tool execution
//!   - `cables`: cable lookup and the two tracers
//!   - `dcim`: devices, sites, interfaces, front and rear ports
//!   - `ipam`: addresses, prefixes, ranges, VRFs, VLANs
//!   - `cached`: reference-data cache and prompt catalog

mod definitions;
mod handlers;

use crate::cache::ResourceCache;
use crate::config::TraceSettings;
use crate::inventory::Inventory;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// What the tool handlers run against.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Inventory handle (possibly the unavailable sentinel).
    pub inventory: Inventory,
    /// Trace defaults and caps.
    pub trace: TraceSettings,
    /// Reference-data snapshots.
    pub cache: ResourceCache,
}

/// Registry of MCP tools.
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
    context: ToolContext,
}

impl ToolRegistry {
    /// Creates a registry with every tool, bound to `context`.
    #[must_use]
    pub fn new(context: ToolContext) -> Self {
        let tools = definitions::all_tools()
            .into_iter()
            .map(|tool| (tool.name.clone(), tool))
            .collect();
        Self { tools, context }
    }

    /// Returns all tool definitions, sorted by name.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<&ToolDefinition> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Returns the context the tools run against.
    #[must_use]
    pub const fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown tools and arguments that
    /// do not match the tool's schema. Inventory failures are reported inside
    /// the [`ToolResult`].
    pub fn execute(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let ctx = &self.context;
        match name {
            "trace_devices_connection" => handlers::execute_trace_devices_connection(ctx, arguments),
            "trace_from_interface" => handlers::execute_trace_from_interface(ctx, arguments),
            "get_cable" => handlers::execute_get_cable(ctx, arguments),
            "get_devices" => handlers::execute_get_devices(ctx, arguments),
            "get_sites" => handlers::execute_get_sites(ctx, arguments),
            "get_interfaces" => handlers::execute_get_interfaces(ctx, arguments),
            "get_front_ports" => handlers::execute_get_front_ports(ctx, arguments),
            "get_rear_ports" => handlers::execute_get_rear_ports(ctx, arguments),
            "get_ip_addresses" => handlers::execute_get_ip_addresses(ctx, arguments),
            "get_ip_prefixes" => handlers::execute_get_ip_prefixes(ctx, arguments),
            "get_ip_ranges" => handlers::execute_get_ip_ranges(ctx, arguments),
            "get_vrfs" => handlers::execute_get_vrfs(ctx, arguments),
            "get_vlans" => handlers::execute_get_vlans(ctx, arguments),
            "get_cached_resources" => handlers::execute_get_cached_resources(ctx, arguments),
            "get_resource_summary" => handlers::execute_get_resource_summary(ctx, arguments),
            "get_available_prompts" => handlers::execute_get_available_prompts(ctx, arguments),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Wraps a JSON payload as pretty-printed text.
    #[must_use]
    pub fn json(payload: &Value) -> Self {
        Self::render(payload, false)
    }

    /// Wraps an error payload (one carrying an `error` field).
    #[must_use]
    pub fn error_json(payload: &Value) -> Self {
        Self::render(payload, true)
    }

    /// Builds `{"error": message}`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::error_json(&serde_json::json!({ "error": message.into() }))
    }

    /// Returns the text of the first content item.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.iter().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        }).next()
    }

    /// Parses the first content item back into JSON.
    #[must_use]
    pub fn payload(&self) -> Option<Value> {
        self.text().and_then(|text| serde_json::from_str(text).ok())
    }

    fn render(payload: &Value, is_error: bool) -> Self {
        let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        Self {
            content: vec![ToolContent::Text { text }],
            is_error,
        }
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}
