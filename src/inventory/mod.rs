//! Inventory access.
//!
//! The tracers and listing tools read NetBox through the [`InventoryBackend`]
//! trait. Two implementations ship with the crate:
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | [`NetboxClient`] | Live NetBox REST API |
//! | [`InMemoryInventory`] | Tests and offline fixtures |
//!
//! [`BulkheadInventory`] wraps either one to cap concurrent calls.
//!
//! # Error Modes
//!
//! A lookup that finds nothing returns `Ok(None)` or an empty list. Transport
//! failures and timeouts surface as [`crate::Error::Unavailable`]; callers that
//! walk the cable graph treat those exactly like a miss for the branch being
//! expanded.

mod bulkhead;
mod memory;
pub mod models;
mod netbox;
mod query;

pub use bulkhead::{BulkheadConfig, BulkheadInventory};
pub use memory::{EndpointRef, InMemoryInventory};
pub use models::{Cable, Device, NestedRef, TerminationRecord};
pub use netbox::NetboxClient;
pub use query::{Endpoint, ListQuery};

use crate::config::NetboxSettings;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Message returned by every inventory-backed tool when NetBox is not configured.
pub const UNAVAILABLE_MESSAGE: &str =
    "NetBox connection not available. Check NETBOX_URL and NETBOX_API_TOKEN environment variables.";

/// Patch-panel port side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Externally facing side.
    Front,
    /// Internally facing side.
    Rear,
}

impl PortKind {
    /// Returns the NetBox object type for this side.
    #[must_use]
    pub const fn object_type(self) -> &'static str {
        match self {
            Self::Front => "dcim.frontport",
            Self::Rear => "dcim.rearport",
        }
    }

    /// Returns the listing endpoint for this side.
    #[must_use]
    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Front => Endpoint::FrontPorts,
            Self::Rear => Endpoint::RearPorts,
        }
    }
}

/// Read-only access to DCIM/IPAM inventory.
///
/// All methods are lookups; none of them write.
pub trait InventoryBackend: Send + Sync {
    /// Returns the backend name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Finds a device by exact name.
    fn find_device(&self, name: &str) -> Result<Option<Device>>;

    /// Lists the interfaces of a device that have a cable attached.
    fn list_cabled_interfaces(&self, device_name: &str) -> Result<Vec<TerminationRecord>>;

    /// Lists the front and rear ports of a device that have a cable attached.
    ///
    /// Ports are returned with their pairing populated.
    fn list_cabled_ports(&self, device_name: &str) -> Result<Vec<TerminationRecord>>;

    /// Gets one interface by device and interface name.
    fn get_interface(
        &self,
        device_name: &str,
        interface_name: &str,
    ) -> Result<Option<TerminationRecord>>;

    /// Gets one front or rear port by device and port name, pairing populated.
    fn get_port(
        &self,
        kind: PortKind,
        device_name: &str,
        port_name: &str,
    ) -> Result<Option<TerminationRecord>>;

    /// Gets a cable with both sides resolved.
    fn get_cable(&self, id: u64) -> Result<Option<Cable>>;

    /// Runs a filtered listing and returns raw records.
    fn list(&self, query: &ListQuery) -> Result<Vec<Value>>;
}

impl<B: InventoryBackend + ?Sized> InventoryBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn find_device(&self, name: &str) -> Result<Option<Device>> {
        (**self).find_device(name)
    }

    fn list_cabled_interfaces(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        (**self).list_cabled_interfaces(device_name)
    }

    fn list_cabled_ports(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        (**self).list_cabled_ports(device_name)
    }

    fn get_interface(
        &self,
        device_name: &str,
        interface_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        (**self).get_interface(device_name, interface_name)
    }

    fn get_port(
        &self,
        kind: PortKind,
        device_name: &str,
        port_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        (**self).get_port(kind, device_name, port_name)
    }

    fn get_cable(&self, id: u64) -> Result<Option<Cable>> {
        (**self).get_cable(id)
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Value>> {
        (**self).list(query)
    }
}

/// Handle to the inventory, or a sentinel explaining why there is none.
///
/// Built once at startup and passed to every tool; there is no global client.
#[derive(Clone)]
pub enum Inventory {
    /// A usable backend.
    Connected(Arc<dyn InventoryBackend>),
    /// NetBox is not configured; the string says why.
    Unavailable(String),
}

impl Inventory {
    /// Wraps a backend.
    pub fn new(backend: impl InventoryBackend + 'static) -> Self {
        Self::Connected(Arc::new(backend))
    }

    /// Builds the NetBox client from settings.
    ///
    /// Missing URL or token yields the [`Inventory::Unavailable`] sentinel
    /// rather than an error, so the server still starts and answers the
    /// cache and prompt tools.
    #[must_use]
    pub fn connect(settings: &NetboxSettings) -> Self {
        let (Some(url), Some(token)) = (settings.url.as_deref(), settings.token.as_ref()) else {
            tracing::error!("NetBox configuration missing; set NETBOX_URL and NETBOX_API_TOKEN");
            return Self::Unavailable("NETBOX_URL or NETBOX_API_TOKEN is not set".to_string());
        };

        let client = NetboxClient::new(url, token.clone(), settings);
        tracing::info!(url = %url, "NetBox client configured");
        Self::new(BulkheadInventory::new(
            client,
            BulkheadConfig::from_settings(settings),
        ))
    }

    /// Returns true when a backend is present.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Returns the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] for the sentinel.
    pub fn backend(&self) -> Result<&dyn InventoryBackend> {
        match self {
            Self::Connected(backend) => Ok(backend.as_ref()),
            Self::Unavailable(_) => Err(Error::Unavailable(UNAVAILABLE_MESSAGE.to_string())),
        }
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(backend) => write!(f, "Inventory::Connected({})", backend.name()),
            Self::Unavailable(reason) => write!(f, "Inventory::Unavailable({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_sentinel() {
        let inventory = Inventory::connect(&NetboxSettings::default());
        assert!(!inventory.is_available());

        let err = inventory.backend().err().unwrap();
        assert!(err.to_string().contains("NetBox connection not available"));
    }

    #[test]
    fn test_connected_backend() {
        let inventory = Inventory::new(InMemoryInventory::new());
        assert!(inventory.is_available());
        assert_eq!(inventory.backend().unwrap().name(), "memory");
    }

    #[test]
    fn test_port_kind_mapping() {
        assert_eq!(PortKind::Front.object_type(), "dcim.frontport");
        assert_eq!(PortKind::Rear.endpoint(), Endpoint::RearPorts);
    }
}
