//! MCP server implementation.
//!
//! Exposes the NetBox inventory to AI agents over the Model Context Protocol.
//!
//! ## Features
//!
//! - **Tools**: cable tracing (`trace_devices_connection`,
//!   `trace_from_interface`, `get_cable`), DCIM and IPAM listings, and the
//!   reference-data cache
//! - **Resources**: cached snapshots via `netbox://{sites,device-types,device-roles,manufacturers}`
//! - **Prompts**: path tracing, device interfaces, site infrastructure, patch panels
//!
//! ## Usage
//!
//! ```bash
//! netbox-mcp serve
//! ```
//!
//! ### Claude Desktop Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "netbox": {
//!       "command": "netbox-mcp",
//!       "args": ["serve"],
//!       "env": { "NETBOX_URL": "https://netbox.example.com", "NETBOX_API_TOKEN": "..." }
//!     }
//!   }
//! }
//! ```

mod dispatch;
mod prompts;
mod resources;
mod server;
pub mod tool_types;
mod tools;

pub use dispatch::McpMethod;
pub use prompts::{PromptArgument, PromptContent, PromptDefinition, PromptMessage, PromptRegistry};
pub use resources::{ResourceContent, ResourceDefinition, ResourceHandler};
pub use server::McpServer;
pub use tools::{ToolContent, ToolContext, ToolDefinition, ToolRegistry, ToolResult};
