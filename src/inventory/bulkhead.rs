//! Concurrency limiting for inventory calls.
//!
//! A tool invocation can fan out into many NetBox requests (every frontier
//! device of a path search lists its interfaces and ports). The bulkhead caps
//! how many of those run at once against the NetBox instance.
//!
//! ```rust,ignore
//! use netbox_mcp::inventory::{BulkheadConfig, BulkheadInventory, InMemoryInventory};
//!
//! let inventory = BulkheadInventory::new(InMemoryInventory::new(), BulkheadConfig::default());
//! ```

use super::models::{Cable, Device, TerminationRecord};
use super::{InventoryBackend, ListQuery, PortKind};
use crate::config::NetboxSettings;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Ceiling applied when the acquire timeout is configured as zero.
const MAX_ACQUIRE_WAIT_MS: u64 = 60_000;

/// Bulkhead settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkheadConfig {
    /// Maximum concurrent inventory calls.
    pub max_concurrent: usize,
    /// Timeout for acquiring a permit in milliseconds (0 = wait up to a minute).
    pub acquire_timeout_ms: u64,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            acquire_timeout_ms: 5000,
        }
    }
}

impl BulkheadConfig {
    /// Takes the limits from the NetBox settings.
    #[must_use]
    pub const fn from_settings(settings: &NetboxSettings) -> Self {
        Self {
            max_concurrent: settings.max_concurrent_requests,
            acquire_timeout_ms: settings.acquire_timeout_ms,
        }
    }
}

/// Inventory backend wrapper that limits concurrent calls.
pub struct BulkheadInventory<B: InventoryBackend> {
    inner: B,
    config: BulkheadConfig,
    semaphore: Arc<Semaphore>,
}

impl<B: InventoryBackend> BulkheadInventory<B> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: B, config: BulkheadConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            inner,
            config,
            semaphore,
        }
    }

    /// Returns the number of free permits.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        let timeout_ms = match self.config.acquire_timeout_ms {
            0 => MAX_ACQUIRE_WAIT_MS,
            ms => ms,
        };
        let timeout = Duration::from_millis(timeout_ms);
        let start = Instant::now();

        loop {
            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                return Ok(permit);
            }

            if start.elapsed() >= timeout {
                metrics::counter!(
                    "inventory_bulkhead_rejections_total",
                    "backend" => self.inner.name()
                )
                .increment(1);
                return Err(Error::Unavailable(format!(
                    "too many concurrent NetBox requests (max {}), gave up after {timeout_ms}ms",
                    self.config.max_concurrent
                )));
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn execute<T>(&self, operation: &'static str, call: impl FnOnce() -> Result<T>) -> Result<T> {
        let _permit = self.acquire_permit()?;
        tracing::trace!(backend = self.inner.name(), operation, "Acquired inventory permit");
        call()
    }
}

impl<B: InventoryBackend> InventoryBackend for BulkheadInventory<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn find_device(&self, name: &str) -> Result<Option<Device>> {
        self.execute("find_device", || self.inner.find_device(name))
    }

    fn list_cabled_interfaces(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        self.execute("list_cabled_interfaces", || {
            self.inner.list_cabled_interfaces(device_name)
        })
    }

    fn list_cabled_ports(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        self.execute("list_cabled_ports", || self.inner.list_cabled_ports(device_name))
    }

    fn get_interface(
        &self,
        device_name: &str,
        interface_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        self.execute("get_interface", || {
            self.inner.get_interface(device_name, interface_name)
        })
    }

    fn get_port(
        &self,
        kind: PortKind,
        device_name: &str,
        port_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        self.execute("get_port", || self.inner.get_port(kind, device_name, port_name))
    }

    fn get_cable(&self, id: u64) -> Result<Option<Cable>> {
        self.execute("get_cable", || self.inner.get_cable(id))
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.execute("list", || self.inner.list(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;

    #[test]
    fn test_permit_released_after_call() {
        let memory = InMemoryInventory::new();
        memory.add_device("sw1", "leaf");
        let bulkhead = BulkheadInventory::new(
            memory,
            BulkheadConfig {
                max_concurrent: 2,
                acquire_timeout_ms: 100,
            },
        );

        assert!(bulkhead.find_device("sw1").unwrap().is_some());
        assert_eq!(bulkhead.available_permits(), 2);
        assert_eq!(bulkhead.name(), "memory");
    }

    #[test]
    fn test_full_bulkhead_times_out_as_unavailable() {
        let bulkhead = BulkheadInventory::new(
            InMemoryInventory::new(),
            BulkheadConfig {
                max_concurrent: 1,
                acquire_timeout_ms: 10,
            },
        );
        let _held = Arc::clone(&bulkhead.semaphore).try_acquire_owned().unwrap();

        let err = bulkhead.find_device("sw1").unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[test]
    fn test_zero_max_concurrent_still_allows_one() {
        let bulkhead = BulkheadInventory::new(
            InMemoryInventory::new(),
            BulkheadConfig {
                max_concurrent: 0,
                acquire_timeout_ms: 10,
            },
        );
        assert_eq!(bulkhead.available_permits(), 1);
    }
}
