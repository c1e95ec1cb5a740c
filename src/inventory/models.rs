//! Typed NetBox records.
//!
//! Records mirror the shape of the NetBox REST API closely enough to decode
//! its JSON directly. Every relation is optional: NetBox omits or nulls
//! relations freely, and classification downstream relies on which of them
//! are populated.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A nested reference to another object (`{"id": 1, "name": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRef {
    /// Object ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// Object name.
    #[serde(default)]
    pub name: Option<String>,
    /// Display string rendered by NetBox.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Slug, when the object has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl NestedRef {
    /// Creates a reference carrying only an ID and a name.
    #[must_use]
    pub fn named(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Returns the name, falling back to the display string.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().or(self.display.as_deref())
    }
}

/// A nested VLAN reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRef {
    /// VLAN object ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// VLAN name.
    #[serde(default)]
    pub name: Option<String>,
    /// 802.1Q VLAN ID.
    #[serde(default)]
    pub vid: Option<u16>,
}

/// A NetBox choice field.
///
/// Most choice fields are serialized as `{"value": "...", "label": "..."}`;
/// a few (cable `type`) are plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    /// Object form.
    Choice {
        /// Machine value.
        #[serde(default)]
        value: Option<String>,
        /// Human label.
        #[serde(default)]
        label: Option<String>,
    },
    /// Plain string form.
    Plain(String),
}

impl ChoiceValue {
    /// Returns the machine value, treating empty strings as absent.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        let value = match self {
            Self::Choice { value, .. } => value.as_deref(),
            Self::Plain(value) => Some(value.as_str()),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Convenience accessor for optional choice fields.
pub(crate) fn choice_value(choice: Option<&ChoiceValue>) -> Option<String> {
    choice.and_then(ChoiceValue::value).map(str::to_string)
}

/// Device type reference as nested under a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypeRef {
    /// Device type ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// Model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Slug.
    #[serde(default)]
    pub slug: Option<String>,
}

/// A device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device ID.
    pub id: u64,
    /// Device name. Unnamed devices exist in NetBox but cannot be traced.
    #[serde(default)]
    pub name: Option<String>,
    /// Device type.
    #[serde(default)]
    pub device_type: Option<DeviceTypeRef>,
    /// Device role (NetBox 4 field name).
    #[serde(default, alias = "device_role")]
    pub role: Option<NestedRef>,
    /// Site.
    #[serde(default)]
    pub site: Option<NestedRef>,
    /// Rack.
    #[serde(default)]
    pub rack: Option<NestedRef>,
    /// Operational status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
    /// Custom field values.
    #[serde(default)]
    pub custom_fields: Option<Map<String, Value>>,
}

/// A cable endpoint as returned by interface and port endpoints.
///
/// One record type covers interfaces, front ports and rear ports; which
/// relations are populated decides the termination kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRecord {
    /// Object ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// NetBox object type (`dcim.interface`, `dcim.frontport`, ...), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Interface or port name.
    #[serde(default)]
    pub name: Option<String>,
    /// Display string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Owning device.
    #[serde(default)]
    pub device: Option<NestedRef>,
    /// Attached cable.
    #[serde(default)]
    pub cable: Option<NestedRef>,
    /// Paired rear port (front ports only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rear_port: Option<NestedRef>,
    /// Paired front ports (rear ports only, filled in by the backend).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_ports: Option<Vec<NestedRef>>,
}

impl TerminationRecord {
    /// Returns the attached cable ID, if any.
    #[must_use]
    pub fn cable_id(&self) -> Option<u64> {
        self.cable.as_ref().and_then(|c| c.id)
    }

    /// Returns the owning device name, if any.
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.device.as_ref().and_then(NestedRef::label)
    }
}

/// One side entry of a cable as serialized by NetBox.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CableEndpoint {
    /// Object type of the terminating object.
    #[serde(default)]
    pub object_type: Option<String>,
    /// ID of the terminating object.
    #[serde(default)]
    pub object_id: Option<u64>,
    /// Nested terminating object.
    #[serde(default)]
    pub object: Option<TerminationRecord>,
}

impl CableEndpoint {
    /// Flattens the endpoint into a termination record on cable `cable_id`.
    #[must_use]
    pub fn into_record(self, cable_id: u64) -> TerminationRecord {
        let mut record = self.object.unwrap_or_default();
        if record.id.is_none() {
            record.id = self.object_id;
        }
        if self.object_type.is_some() {
            record.object_type = self.object_type;
        }
        if record.cable.is_none() {
            record.cable = Some(NestedRef {
                id: Some(cable_id),
                ..NestedRef::default()
            });
        }
        record
    }
}

/// Cable as serialized by `/api/dcim/cables/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CableRecord {
    /// Cable ID.
    pub id: u64,
    /// Cable type (plain string, possibly empty).
    #[serde(default, rename = "type")]
    pub cable_type: Option<ChoiceValue>,
    /// Status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
    /// A-side endpoints.
    #[serde(default)]
    pub a_terminations: Vec<CableEndpoint>,
    /// B-side endpoints.
    #[serde(default)]
    pub b_terminations: Vec<CableEndpoint>,
}

/// A cable with both sides flattened into termination records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cable {
    /// Cable ID.
    pub id: u64,
    /// Cable type (`cat6`, `smf`, ...).
    pub cable_type: Option<String>,
    /// Status (`connected`, `planned`, ...).
    pub status: Option<String>,
    /// A-side terminations.
    pub a_terminations: Vec<TerminationRecord>,
    /// B-side terminations.
    pub b_terminations: Vec<TerminationRecord>,
}

impl Cable {
    /// Iterates both sides, A side first.
    pub fn terminations(&self) -> impl Iterator<Item = &TerminationRecord> {
        self.a_terminations.iter().chain(self.b_terminations.iter())
    }
}

impl From<CableRecord> for Cable {
    fn from(record: CableRecord) -> Self {
        let id = record.id;
        Self {
            id,
            cable_type: choice_value(record.cable_type.as_ref()),
            status: choice_value(record.status.as_ref()),
            a_terminations: record
                .a_terminations
                .into_iter()
                .map(|e| e.into_record(id))
                .collect(),
            b_terminations: record
                .b_terminations
                .into_iter()
                .map(|e| e.into_record(id))
                .collect(),
        }
    }
}

/// Interface as returned by `/api/dcim/interfaces/`.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceRecord {
    /// Interface ID.
    pub id: u64,
    /// Interface name.
    pub name: String,
    /// Owning device.
    #[serde(default)]
    pub device: Option<NestedRef>,
    /// Interface type.
    #[serde(default, rename = "type")]
    pub interface_type: Option<ChoiceValue>,
    /// Administrative state.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Interface kind (physical, virtual, wireless).
    #[serde(default)]
    pub kind: Option<ChoiceValue>,
    /// Attached cable.
    #[serde(default)]
    pub cable: Option<NestedRef>,
    /// Untagged (access) VLAN.
    #[serde(default)]
    pub untagged_vlan: Option<VlanRef>,
    /// Tagged VLANs.
    #[serde(default)]
    pub tagged_vlans: Option<Vec<VlanRef>>,
}

/// Front port as returned by `/api/dcim/front-ports/`.
#[derive(Debug, Clone, Deserialize)]
pub struct FrontPortRecord {
    /// Port ID.
    pub id: u64,
    /// Port name.
    pub name: String,
    /// Owning device.
    #[serde(default)]
    pub device: Option<NestedRef>,
    /// Connector type.
    #[serde(default, rename = "type")]
    pub port_type: Option<ChoiceValue>,
    /// Attached cable.
    #[serde(default)]
    pub cable: Option<NestedRef>,
    /// Paired rear port.
    #[serde(default)]
    pub rear_port: Option<NestedRef>,
}

/// Rear port as returned by `/api/dcim/rear-ports/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RearPortRecord {
    /// Port ID.
    pub id: u64,
    /// Port name.
    pub name: String,
    /// Owning device.
    #[serde(default)]
    pub device: Option<NestedRef>,
    /// Connector type.
    #[serde(default, rename = "type")]
    pub port_type: Option<ChoiceValue>,
    /// Attached cable.
    #[serde(default)]
    pub cable: Option<NestedRef>,
    /// Number of front-port positions.
    #[serde(default)]
    pub positions: Option<u32>,
}

/// Site.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteRecord {
    /// Site ID.
    pub id: u64,
    /// Site name.
    pub name: String,
    /// Slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
    /// Region.
    #[serde(default)]
    pub region: Option<NestedRef>,
}

/// Device type.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTypeRecord {
    /// Device type ID.
    pub id: u64,
    /// Model name.
    pub model: String,
    /// Manufacturer.
    #[serde(default)]
    pub manufacturer: Option<NestedRef>,
    /// Part number.
    #[serde(default)]
    pub part_number: Option<String>,
}

/// Any object reduced to `id`, `name` and `slug` (roles, manufacturers).
#[derive(Debug, Clone, Deserialize)]
pub struct SluggedRecord {
    /// Object ID.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Slug.
    #[serde(default)]
    pub slug: Option<String>,
}

/// IP address.
#[derive(Debug, Clone, Deserialize)]
pub struct IpAddressRecord {
    /// Address ID.
    pub id: u64,
    /// Address in CIDR notation.
    pub address: String,
    /// Status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
    /// VRF.
    #[serde(default)]
    pub vrf: Option<NestedRef>,
    /// Object the address is assigned to (usually an interface).
    #[serde(default)]
    pub assigned_object: Option<NestedRef>,
}

/// IP prefix.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefixRecord {
    /// Prefix ID.
    pub id: u64,
    /// Prefix in CIDR notation.
    pub prefix: String,
    /// Status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
    /// Site.
    #[serde(default)]
    pub site: Option<NestedRef>,
    /// VRF.
    #[serde(default)]
    pub vrf: Option<NestedRef>,
    /// VLAN.
    #[serde(default)]
    pub vlan: Option<VlanRef>,
}

/// IP range.
#[derive(Debug, Clone, Deserialize)]
pub struct IpRangeRecord {
    /// Range ID.
    pub id: u64,
    /// First address.
    pub start_address: String,
    /// Last address.
    pub end_address: String,
    /// Status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
    /// VRF.
    #[serde(default)]
    pub vrf: Option<NestedRef>,
    /// Utilization as reported by NetBox.
    #[serde(default)]
    pub utilization: Option<Value>,
}

/// VRF.
#[derive(Debug, Clone, Deserialize)]
pub struct VrfRecord {
    /// VRF ID.
    pub id: u64,
    /// VRF name.
    pub name: String,
    /// Route distinguisher.
    #[serde(default)]
    pub rd: Option<String>,
}

/// VLAN.
#[derive(Debug, Clone, Deserialize)]
pub struct VlanRecord {
    /// VLAN object ID.
    pub id: u64,
    /// 802.1Q VLAN ID.
    pub vid: u16,
    /// VLAN name.
    pub name: String,
    /// Site.
    #[serde(default)]
    pub site: Option<NestedRef>,
    /// Status.
    #[serde(default)]
    pub status: Option<ChoiceValue>,
}

/// Decodes a raw NetBox object into a typed record.
///
/// # Errors
///
/// Returns [`Error::MalformedRecord`] if the value does not match `T`.
pub fn decode<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::MalformedRecord {
        kind,
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_choice_value_forms() {
        let choice: ChoiceValue =
            serde_json::from_value(json!({"value": "active", "label": "Active"})).unwrap();
        assert_eq!(choice.value(), Some("active"));

        let plain: ChoiceValue = serde_json::from_value(json!("cat6")).unwrap();
        assert_eq!(plain.value(), Some("cat6"));

        let empty: ChoiceValue = serde_json::from_value(json!("")).unwrap();
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn test_cable_record_flattens_endpoints() {
        let raw = json!({
            "id": 7,
            "type": "cat6",
            "status": {"value": "connected", "label": "Connected"},
            "a_terminations": [{
                "object_type": "dcim.interface",
                "object_id": 11,
                "object": {"id": 11, "name": "eth0", "device": {"id": 1, "name": "sw1"}}
            }],
            "b_terminations": [{
                "object_type": "dcim.frontport",
                "object_id": 21,
                "object": {"id": 21, "name": "1", "device": {"id": 2, "name": "pp1"}, "cable": {"id": 7}}
            }]
        });

        let cable: Cable = decode::<CableRecord>("cable", raw).unwrap().into();
        assert_eq!(cable.id, 7);
        assert_eq!(cable.cable_type.as_deref(), Some("cat6"));
        assert_eq!(cable.status.as_deref(), Some("connected"));
        assert_eq!(cable.terminations().count(), 2);

        let a = &cable.a_terminations[0];
        assert_eq!(a.object_type.as_deref(), Some("dcim.interface"));
        assert_eq!(a.cable_id(), Some(7));
        assert_eq!(a.device_name(), Some("sw1"));
    }

    #[test]
    fn test_device_accepts_legacy_role_field() {
        let device: Device = decode(
            "device",
            json!({"id": 3, "name": "core-01", "device_role": {"id": 1, "name": "Core"}}),
        )
        .unwrap();
        assert_eq!(device.role.and_then(|r| r.name).as_deref(), Some("Core"));
    }

    #[test]
    fn test_decode_reports_malformed_record() {
        let err = decode::<InterfaceRecord>("interface", json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { kind: "interface", .. }));
    }
}
