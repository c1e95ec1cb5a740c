//! Filtered listing queries.

use std::fmt;

/// NetBox REST endpoints the server reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `dcim/devices`
    Devices,
    /// `dcim/sites`
    Sites,
    /// `dcim/interfaces`
    Interfaces,
    /// `dcim/front-ports`
    FrontPorts,
    /// `dcim/rear-ports`
    RearPorts,
    /// `dcim/cables`
    Cables,
    /// `dcim/device-types`
    DeviceTypes,
    /// `dcim/device-roles`
    DeviceRoles,
    /// `dcim/manufacturers`
    Manufacturers,
    /// `ipam/ip-addresses`
    IpAddresses,
    /// `ipam/prefixes`
    Prefixes,
    /// `ipam/ip-ranges`
    IpRanges,
    /// `ipam/vrfs`
    Vrfs,
    /// `ipam/vlans`
    Vlans,
}

impl Endpoint {
    /// Returns the API path below `/api/`.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Devices => "dcim/devices",
            Self::Sites => "dcim/sites",
            Self::Interfaces => "dcim/interfaces",
            Self::FrontPorts => "dcim/front-ports",
            Self::RearPorts => "dcim/rear-ports",
            Self::Cables => "dcim/cables",
            Self::DeviceTypes => "dcim/device-types",
            Self::DeviceRoles => "dcim/device-roles",
            Self::Manufacturers => "dcim/manufacturers",
            Self::IpAddresses => "ipam/ip-addresses",
            Self::Prefixes => "ipam/prefixes",
            Self::IpRanges => "ipam/ip-ranges",
            Self::Vrfs => "ipam/vrfs",
            Self::Vlans => "ipam/vlans",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A filtered listing against one endpoint.
///
/// Filters are NetBox query parameters and are passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Endpoint to list.
    pub endpoint: Endpoint,
    /// Query parameters, in insertion order.
    pub filters: Vec<(String, String)>,
    /// Maximum number of records to return (`None` for all pages).
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Creates an unfiltered, unlimited query.
    #[must_use]
    pub const fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Adds a filter parameter.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((name.into(), value.into()));
        self
    }

    /// Caps the number of returned records.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the value of a filter, if set.
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::FrontPorts.path(), "dcim/front-ports");
        assert_eq!(Endpoint::IpRanges.to_string(), "ipam/ip-ranges");
    }

    #[test]
    fn test_query_builder() {
        let query = ListQuery::new(Endpoint::Interfaces)
            .with_filter("device", "sw1")
            .with_filter("cabled", "true")
            .with_limit(5);

        assert_eq!(query.filter("device"), Some("sw1"));
        assert_eq!(query.filter("cabled"), Some("true"));
        assert_eq!(query.filter("name"), None);
        assert_eq!(query.limit, Some(5));
    }
}
