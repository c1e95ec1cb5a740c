//! In-memory inventory for tests and offline fixtures.
//!
//! Records are stored in the same JSON shape the NetBox API returns, so the
//! decoding path exercised here is the one the live client uses.

use super::models::{Cable, CableRecord, Device, NestedRef, TerminationRecord, decode};
use super::{Endpoint, InventoryBackend, ListQuery, PortKind};
use crate::{Error, Result};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Kind of cable endpoint in a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointKind {
    Interface,
    Port(PortKind),
}

impl EndpointKind {
    const fn endpoint(self) -> Endpoint {
        match self {
            Self::Interface => Endpoint::Interfaces,
            Self::Port(kind) => kind.endpoint(),
        }
    }

    const fn object_type(self) -> &'static str {
        match self {
            Self::Interface => "dcim.interface",
            Self::Port(kind) => kind.object_type(),
        }
    }
}

/// One end of a fixture cable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    kind: EndpointKind,
    device: String,
    name: String,
}

impl EndpointRef {
    /// A device interface.
    #[must_use]
    pub fn interface(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Interface,
            device: device.into(),
            name: name.into(),
        }
    }

    /// A patch-panel front port.
    #[must_use]
    pub fn front(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Port(PortKind::Front),
            device: device.into(),
            name: name.into(),
        }
    }

    /// A patch-panel rear port.
    #[must_use]
    pub fn rear(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Port(PortKind::Rear),
            device: device.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<Endpoint, Vec<Value>>,
    next_id: u64,
    failing_devices: HashSet<String>,
    failing_cables: HashSet<u64>,
    failing_listings: bool,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn records(&self, endpoint: Endpoint) -> &[Value] {
        self.records
            .get(&endpoint)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn device_ref(&self, device: &str) -> Value {
        self.records(Endpoint::Devices)
            .iter()
            .find(|d| d["name"] == device)
            .map_or_else(
                || json!({"id": null, "name": device}),
                |d| json!({"id": d["id"], "name": device}),
            )
    }

    fn find_index(&self, endpoint: Endpoint, device: &str, name: &str) -> Option<usize> {
        self.records(endpoint)
            .iter()
            .position(|r| r["device"]["name"] == device && r["name"] == name)
    }

    fn find(&self, endpoint: Endpoint, device: &str, name: &str) -> Option<&Value> {
        self.find_index(endpoint, device, name)
            .map(|i| &self.records(endpoint)[i])
    }

    fn find_by_id(&self, endpoint: Endpoint, id: u64) -> Option<&Value> {
        self.records(endpoint).iter().find(|r| r["id"] == id)
    }

    fn insert(&mut self, endpoint: Endpoint, value: Value) {
        self.records.entry(endpoint).or_default().push(value);
    }

    fn add_termination(&mut self, kind: EndpointKind, device: &str, name: &str, extra: Value) -> u64 {
        let id = self.allocate_id();
        let mut record = json!({
            "id": id,
            "name": name,
            "display": name,
            "device": self.device_ref(device),
            "cable": null,
        });
        if let (Some(target), Value::Object(fields)) = (record.as_object_mut(), extra) {
            target.extend(fields);
        }
        self.insert(kind.endpoint(), record);
        id
    }

    /// Returns the record for `endpoint`, creating a bare one when missing.
    fn ensure(&mut self, endpoint: &EndpointRef) -> usize {
        let collection = endpoint.kind.endpoint();
        if let Some(index) = self.find_index(collection, &endpoint.device, &endpoint.name) {
            return index;
        }
        self.add_termination(endpoint.kind, &endpoint.device, &endpoint.name, json!({}));
        self.records(collection).len() - 1
    }

    /// Fills in pairing for a port record.
    fn hydrate(&self, kind: PortKind, mut record: TerminationRecord) -> TerminationRecord {
        record.object_type = Some(kind.object_type().to_string());
        if kind == PortKind::Rear {
            let fronts = self
                .records(Endpoint::FrontPorts)
                .iter()
                .filter(|f| record.id.is_some() && f["rear_port"]["id"] == json!(record.id))
                .map(|f| NestedRef {
                    id: f["id"].as_u64(),
                    name: f["name"].as_str().map(str::to_string),
                    ..NestedRef::default()
                })
                .collect();
            record.front_ports = Some(fronts);
        }
        record
    }

    fn check_device(&self, device: &str) -> Result<()> {
        if self.failing_devices.contains(device) {
            return Err(Error::Unavailable(format!(
                "lookup for device '{device}' timed out"
            )));
        }
        Ok(())
    }

    fn cabled(&self, endpoint: Endpoint, device: &str) -> Vec<&Value> {
        self.records(endpoint)
            .iter()
            .filter(|r| r["device"]["name"] == device && !r["cable"].is_null())
            .collect()
    }
}

/// Fixture-backed [`InventoryBackend`].
///
/// IDs are allocated from one counter shared by every record kind, except
/// cables, whose IDs the caller picks.
///
/// ```rust,ignore
/// let inventory = InMemoryInventory::new();
/// inventory.add_device("sw1", "access");
/// inventory.add_device("pp1", "patch-panel");
/// inventory.add_rear_port("pp1", "R1");
/// inventory.add_front_port("pp1", "F1", "R1");
/// inventory.connect(10, &[EndpointRef::interface("sw1", "eth0")], &[EndpointRef::front("pp1", "F1")]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    state: RwLock<State>,
}

impl InMemoryInventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a device and returns its ID.
    pub fn add_device(&self, name: &str, role: &str) -> u64 {
        let mut state = self.write();
        let id = state.allocate_id();
        let slug = role.to_lowercase().replace(' ', "-");
        state.insert(
            Endpoint::Devices,
            json!({
                "id": id,
                "name": name,
                "display": name,
                "device_type": {"id": 1, "model": "Generic", "slug": "generic"},
                "role": {"id": 1, "name": role, "slug": slug},
                "site": null,
                "rack": null,
                "status": {"value": "active", "label": "Active"},
                "custom_fields": {},
            }),
        );
        id
    }

    /// Adds an uncabled interface and returns its ID.
    pub fn add_interface(&self, device: &str, name: &str) -> u64 {
        self.write().add_termination(
            EndpointKind::Interface,
            device,
            name,
            json!({
                "type": {"value": "1000base-t", "label": "1000BASE-T (1GE)"},
                "enabled": true,
                "kind": "physical",
            }),
        )
    }

    /// Adds an uncabled rear port and returns its ID.
    pub fn add_rear_port(&self, device: &str, name: &str) -> u64 {
        self.write().add_termination(
            EndpointKind::Port(PortKind::Rear),
            device,
            name,
            json!({"type": {"value": "8p8c", "label": "8P8C"}, "positions": 1}),
        )
    }

    /// Adds an uncabled front port paired with `rear_name` and returns its ID.
    ///
    /// The rear port is created if it does not exist yet.
    pub fn add_front_port(&self, device: &str, name: &str, rear_name: &str) -> u64 {
        let mut state = self.write();
        let rear_index = state.ensure(&EndpointRef::rear(device, rear_name));
        let rear_id = state.records(Endpoint::RearPorts)[rear_index]["id"].clone();
        state.add_termination(
            EndpointKind::Port(PortKind::Front),
            device,
            name,
            json!({
                "type": {"value": "8p8c", "label": "8P8C"},
                "rear_port": {"id": rear_id, "name": rear_name},
            }),
        )
    }

    /// Connects the given endpoints with cable `cable_id`.
    ///
    /// Endpoints that do not exist yet are created bare (a front port created
    /// this way has no rear port).
    pub fn connect(&self, cable_id: u64, a_side: &[EndpointRef], b_side: &[EndpointRef]) {
        let mut state = self.write();
        let mut side = |endpoints: &[EndpointRef]| -> Vec<Value> {
            endpoints
                .iter()
                .map(|endpoint| {
                    let index = state.ensure(endpoint);
                    let collection = endpoint.kind.endpoint();
                    let Some(record) = state
                        .records
                        .get_mut(&collection)
                        .and_then(|r| r.get_mut(index))
                    else {
                        return Value::Null;
                    };
                    record["cable"] = json!({"id": cable_id});
                    json!({
                        "object_type": endpoint.kind.object_type(),
                        "object_id": record["id"],
                        "object": record.clone(),
                    })
                })
                .collect()
        };
        let a_terminations = side(a_side);
        let b_terminations = side(b_side);
        state.insert(
            Endpoint::Cables,
            json!({
                "id": cable_id,
                "type": "cat6",
                "status": {"value": "connected", "label": "Connected"},
                "a_terminations": a_terminations,
                "b_terminations": b_terminations,
            }),
        );
    }

    /// Connects two interfaces with a point-to-point cable.
    pub fn connect_interfaces(&self, cable_id: u64, a: (&str, &str), b: (&str, &str)) {
        self.connect(
            cable_id,
            &[EndpointRef::interface(a.0, a.1)],
            &[EndpointRef::interface(b.0, b.1)],
        );
    }

    /// Inserts a raw record as-is.
    pub fn insert_raw(&self, endpoint: Endpoint, value: Value) {
        self.write().insert(endpoint, value);
    }

    /// Makes every lookup scoped to `device` fail as unavailable.
    pub fn fail_device(&self, device: &str) {
        self.write().failing_devices.insert(device.to_string());
    }

    /// Makes lookups of cable `id` fail as unavailable.
    pub fn fail_cable(&self, id: u64) {
        self.write().failing_cables.insert(id);
    }

    /// Makes every filtered listing fail as unavailable.
    pub fn fail_listings(&self) {
        self.write().failing_listings = true;
    }
}

impl InventoryBackend for InMemoryInventory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn find_device(&self, name: &str) -> Result<Option<Device>> {
        let state = self.read();
        state.check_device(name)?;
        state
            .records(Endpoint::Devices)
            .iter()
            .find(|d| d["name"] == name)
            .map(|d| decode("device", d.clone()))
            .transpose()
    }

    fn list_cabled_interfaces(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        let state = self.read();
        state.check_device(device_name)?;
        Ok(state
            .cabled(Endpoint::Interfaces, device_name)
            .into_iter()
            .filter_map(|r| match decode::<TerminationRecord>("interface", r.clone()) {
                Ok(mut record) => {
                    record.object_type = Some("dcim.interface".to_string());
                    Some(record)
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed interface record");
                    None
                },
            })
            .collect())
    }

    fn list_cabled_ports(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        let state = self.read();
        state.check_device(device_name)?;
        let mut ports = Vec::new();
        for kind in [PortKind::Front, PortKind::Rear] {
            for raw in state.cabled(kind.endpoint(), device_name) {
                match decode::<TerminationRecord>("port", raw.clone()) {
                    Ok(record) => ports.push(state.hydrate(kind, record)),
                    Err(e) => tracing::warn!(error = %e, "Skipping malformed port record"),
                }
            }
        }
        Ok(ports)
    }

    fn get_interface(
        &self,
        device_name: &str,
        interface_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        let state = self.read();
        state.check_device(device_name)?;
        let Some(raw) = state.find(Endpoint::Interfaces, device_name, interface_name) else {
            return Ok(None);
        };
        let mut record: TerminationRecord = decode("interface", raw.clone())?;
        record.object_type = Some("dcim.interface".to_string());
        Ok(Some(record))
    }

    fn get_port(
        &self,
        kind: PortKind,
        device_name: &str,
        port_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        let state = self.read();
        state.check_device(device_name)?;
        state
            .find(kind.endpoint(), device_name, port_name)
            .map(|raw| decode("port", raw.clone()).map(|record| state.hydrate(kind, record)))
            .transpose()
    }

    fn get_cable(&self, id: u64) -> Result<Option<Cable>> {
        let state = self.read();
        if state.failing_cables.contains(&id) {
            return Err(Error::Unavailable(format!("lookup for cable {id} timed out")));
        }
        let Some(raw) = state.find_by_id(Endpoint::Cables, id) else {
            return Ok(None);
        };
        let mut cable: Cable = decode::<CableRecord>("cable", raw.clone())?.into();

        // Serve the current state of each endpoint, not the snapshot taken at connect time.
        for record in cable
            .a_terminations
            .iter_mut()
            .chain(cable.b_terminations.iter_mut())
        {
            let kind = match record.object_type.as_deref() {
                Some("dcim.frontport") => PortKind::Front,
                Some("dcim.rearport") => PortKind::Rear,
                _ => continue,
            };
            let Some(current) = record.id.and_then(|pid| state.find_by_id(kind.endpoint(), pid)) else {
                continue;
            };
            *record = state.hydrate(kind, decode("port", current.clone())?);
        }

        Ok(Some(cable))
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Value>> {
        let state = self.read();
        if state.failing_listings {
            return Err(Error::Unavailable(format!("listing {} timed out", query.endpoint)));
        }
        if let Some(device) = query.filter("device") {
            state.check_device(device)?;
        }
        let matches = state
            .records(query.endpoint)
            .iter()
            .filter(|record| {
                query
                    .filters
                    .iter()
                    .all(|(name, value)| filter_matches(record, name, value))
            })
            .cloned();
        Ok(match query.limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        })
    }
}

/// Approximates NetBox's filter semantics for fixture data.
///
/// Filters on fields the record does not carry are ignored.
fn filter_matches(record: &Value, name: &str, expected: &str) -> bool {
    match name {
        "cabled" => (!record["cable"].is_null()).to_string() == expected,
        _ => {
            if let Some(field) = record.get(name) {
                return value_matches(field, expected);
            }
            match name.strip_suffix("_id").and_then(|base| record.get(base)) {
                Some(nested) => nested["id"].to_string() == expected,
                None => true,
            }
        },
    }
}

fn value_matches(field: &Value, expected: &str) -> bool {
    match field {
        Value::Null => false,
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        Value::Array(items) => items.iter().any(|item| value_matches(item, expected)),
        Value::Object(fields) => ["id", "name", "slug", "value", "model"]
            .iter()
            .filter_map(|key| fields.get(*key))
            .any(|v| value_matches(v, expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch_panel_fixture() -> InMemoryInventory {
        let inventory = InMemoryInventory::new();
        inventory.add_device("sw1", "access");
        inventory.add_device("pp1", "patch-panel");
        inventory.add_device("sw2", "access");
        inventory.add_interface("sw1", "eth0");
        inventory.add_interface("sw2", "eth0");
        inventory.add_front_port("pp1", "F1", "R1");
        inventory.connect(
            10,
            &[EndpointRef::interface("sw1", "eth0")],
            &[EndpointRef::front("pp1", "F1")],
        );
        inventory.connect(
            11,
            &[EndpointRef::rear("pp1", "R1")],
            &[EndpointRef::interface("sw2", "eth0")],
        );
        inventory
    }

    #[test]
    fn test_find_device() {
        let inventory = patch_panel_fixture();
        let device = inventory.find_device("sw1").unwrap().unwrap();
        assert_eq!(device.name.as_deref(), Some("sw1"));
        assert!(inventory.find_device("missing").unwrap().is_none());
    }

    #[test]
    fn test_cabled_interfaces_only() {
        let inventory = patch_panel_fixture();
        inventory.add_interface("sw1", "eth1");

        let cabled = inventory.list_cabled_interfaces("sw1").unwrap();
        assert_eq!(cabled.len(), 1);
        assert_eq!(cabled[0].name.as_deref(), Some("eth0"));
        assert_eq!(cabled[0].cable_id(), Some(10));
    }

    #[test]
    fn test_ports_are_hydrated() {
        let inventory = patch_panel_fixture();
        let rear = inventory
            .get_port(PortKind::Rear, "pp1", "R1")
            .unwrap()
            .unwrap();
        let fronts = rear.front_ports.unwrap();
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0].name.as_deref(), Some("F1"));

        let front = inventory
            .get_port(PortKind::Front, "pp1", "F1")
            .unwrap()
            .unwrap();
        assert_eq!(front.rear_port.and_then(|r| r.name).as_deref(), Some("R1"));
        assert_eq!(inventory.list_cabled_ports("pp1").unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_port_is_skipped() {
        let inventory = patch_panel_fixture();
        inventory.insert_raw(
            Endpoint::RearPorts,
            json!({"id": 900, "name": 42, "device": {"name": "pp1"}, "cable": {"id": 99}}),
        );

        let names: Vec<Option<String>> = inventory
            .list_cabled_ports("pp1")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec![Some("F1".to_string()), Some("R1".to_string())]);
    }

    #[test]
    fn test_get_cable_reflects_current_state() {
        let inventory = patch_panel_fixture();
        let cable = inventory.get_cable(10).unwrap().unwrap();
        assert_eq!(cable.a_terminations[0].device_name(), Some("sw1"));

        let b = &cable.b_terminations[0];
        assert_eq!(b.object_type.as_deref(), Some("dcim.frontport"));
        assert_eq!(b.cable_id(), Some(10));
        assert!(b.rear_port.is_some());

        assert!(inventory.get_cable(99).unwrap().is_none());
    }

    #[test]
    fn test_failures_are_unavailable() {
        let inventory = patch_panel_fixture();
        inventory.fail_device("sw2");
        inventory.fail_cable(11);

        assert!(matches!(
            inventory.list_cabled_interfaces("sw2"),
            Err(Error::Unavailable(_))
        ));
        assert!(matches!(inventory.get_cable(11), Err(Error::Unavailable(_))));
        assert!(inventory.list_cabled_interfaces("sw1").is_ok());
    }

    #[test]
    fn test_list_filters() {
        let inventory = patch_panel_fixture();
        inventory.add_interface("sw1", "eth1");

        let all = inventory
            .list(&ListQuery::new(Endpoint::Interfaces).with_filter("device", "sw1"))
            .unwrap();
        assert_eq!(all.len(), 2);

        let cabled = inventory
            .list(
                &ListQuery::new(Endpoint::Interfaces)
                    .with_filter("device", "sw1")
                    .with_filter("cabled", "true"),
            )
            .unwrap();
        assert_eq!(cabled.len(), 1);

        let by_role = inventory
            .list(&ListQuery::new(Endpoint::Devices).with_filter("role", "patch-panel"))
            .unwrap();
        assert_eq!(by_role.len(), 1);

        let limited = inventory
            .list(&ListQuery::new(Endpoint::Devices).with_limit(2))
            .unwrap();
        assert_eq!(limited.len(), 2);
    }
}
