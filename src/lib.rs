//! # netbox-mcp
//!
//! Model Context Protocol server over a NetBox DCIM/IPAM inventory.
//!
//! The server exposes filtered listing tools (devices, sites, interfaces,
//! patch-panel ports, IP space) and a cable-topology tracer that rebuilds
//! physical paths through interfaces, cables and patch panels.
//!
//! ## Features
//!
//! - Bidirectional device-to-device path search (`trace_devices_connection`)
//! - Cycle-safe topology tree from a single interface (`trace_from_interface`)
//! - Cached reference data (sites, device types, roles, manufacturers)
//! - Stdio JSON-RPC transport for AI agent clients
//!
//! ## Example
//!
//! ```rust,ignore
//! use netbox_mcp::inventory::InMemoryInventory;
//! use netbox_mcp::topology::PathTracer;
//!
//! let inventory = InMemoryInventory::new();
//! inventory.add_device("sw1", "leaf");
//! inventory.add_device("sw2", "leaf");
//! inventory.connect_interfaces(1, ("sw1", "eth0"), ("sw2", "eth0"));
//!
//! let outcome = PathTracer::new(&inventory).trace("sw1", "sw2", 10)?;
//! assert_eq!(outcome.total_hops(), Some(1));
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cache;
pub mod config;
pub mod inventory;
pub mod mcp;
pub mod observability;
pub mod topology;

pub use config::{NetboxMcpConfig, TraceSettings};
pub use inventory::{Inventory, InventoryBackend};
pub use topology::{PathOutcome, PathTracer, Termination, TreeTracer};

/// Error type for netbox-mcp operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed tool arguments, unknown filters, out-of-range limits |
/// | `NotFound` | A named device, interface, port or cable does not exist |
/// | `Unavailable` | NetBox is not configured, unreachable, or a call timed out |
/// | `MalformedRecord` | A NetBox record did not match its expected shape |
/// | `OperationFailed` | File I/O, config parsing, or other local failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A named inventory object does not exist.
    #[error("{kind} '{identifier}' not found")]
    NotFound {
        /// Kind of object that was looked up (device, interface, cable).
        kind: &'static str,
        /// The identifier that was requested.
        identifier: String,
    },

    /// The inventory cannot be reached.
    ///
    /// Raised when:
    /// - `NETBOX_URL` or `NETBOX_API_TOKEN` is missing
    /// - A request times out or the connection fails
    /// - The concurrency bulkhead rejects a call
    #[error("inventory unavailable: {0}")]
    Unavailable(String),

    /// A record could not be decoded into its typed model.
    #[error("malformed {kind} record: {cause}")]
    MalformedRecord {
        /// Kind of record (interface, front port, cable, ...).
        kind: &'static str,
        /// Decoder message.
        cause: String,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for netbox-mcp operations.
pub type Result<T> = std::result::Result<T, Error>;
