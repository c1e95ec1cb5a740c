//! Cable endpoints.
//!
//! Every record a cable can terminate on is classified once into a
//! [`Termination`]. The tracers never look at raw records.

use crate::inventory::{PortKind, TerminationRecord};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// One physical endpoint of a cable or an internal port pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Termination {
    /// A device interface.
    Interface {
        /// Owning device.
        device_name: String,
        /// Interface name.
        interface_name: String,
        /// Attached cable.
        cable_id: Option<u64>,
    },
    /// A patch-panel front port.
    FrontPort {
        /// Owning device.
        device_name: String,
        /// Port name.
        port_name: String,
        /// Rear port this front port is wired to inside the panel.
        paired_rear_port_name: Option<String>,
        /// Attached cable.
        cable_id: Option<u64>,
    },
    /// A patch-panel rear port.
    RearPort {
        /// Owning device.
        device_name: String,
        /// Port name.
        port_name: String,
        /// Front ports wired to this rear port, in inventory order.
        paired_front_port_names: Vec<String>,
        /// Attached cable.
        cable_id: Option<u64>,
    },
    /// A record matching no known shape.
    Unknown {
        /// Whatever identified the record (display string, name, or ID).
        raw_identifier: String,
        /// Attached cable.
        cable_id: Option<u64>,
    },
}

/// Coarse kind of a termination as reported in tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationKind {
    /// Device interface.
    Interface,
    /// Front port.
    FrontPort,
    /// Rear port.
    RearPort,
    /// Unclassified.
    Unknown,
}

impl Termination {
    /// Classifies a record.
    ///
    /// An explicit NetBox object type wins. Otherwise the populated relations
    /// decide: a rear-port reference makes a front port, a front-ports
    /// collection makes a rear port, a device plus a name makes an
    /// interface. Anything else is [`Termination::Unknown`]; classification
    /// never fails.
    #[must_use]
    pub fn classify(record: &TerminationRecord) -> Self {
        let cable_id = record.cable_id();
        let device_name = record.device_name().map(str::to_string);
        let name = record.name.clone();

        let explicit = match record.object_type.as_deref() {
            Some("dcim.interface") => Some(TerminationKind::Interface),
            Some("dcim.frontport") => Some(TerminationKind::FrontPort),
            Some("dcim.rearport") => Some(TerminationKind::RearPort),
            _ => None,
        };
        let kind = explicit.unwrap_or(if record.rear_port.is_some() {
            TerminationKind::FrontPort
        } else if record.front_ports.is_some() {
            TerminationKind::RearPort
        } else if device_name.is_some() && name.is_some() {
            TerminationKind::Interface
        } else {
            TerminationKind::Unknown
        });

        let (Some(device_name), Some(name)) = (device_name, name) else {
            return Self::Unknown {
                raw_identifier: raw_identifier(record),
                cable_id,
            };
        };

        match kind {
            TerminationKind::Interface => Self::Interface {
                device_name,
                interface_name: name,
                cable_id,
            },
            TerminationKind::FrontPort => Self::FrontPort {
                device_name,
                port_name: name,
                paired_rear_port_name: record
                    .rear_port
                    .as_ref()
                    .and_then(|r| r.label())
                    .map(str::to_string),
                cable_id,
            },
            TerminationKind::RearPort => {
                let mut paired_front_port_names: Vec<String> = Vec::new();
                for front in record.front_ports.iter().flatten() {
                    if let Some(label) = front.label()
                        && !paired_front_port_names.iter().any(|n| n == label)
                    {
                        paired_front_port_names.push(label.to_string());
                    }
                }
                Self::RearPort {
                    device_name,
                    port_name: name,
                    paired_front_port_names,
                    cable_id,
                }
            },
            TerminationKind::Unknown => Self::Unknown {
                raw_identifier: raw_identifier(record),
                cable_id,
            },
        }
    }

    /// Returns the stable key used for cycle detection.
    ///
    /// Front and rear ports carry a side prefix because panels routinely
    /// reuse the same names on both sides.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Self::Interface {
                device_name,
                interface_name,
                ..
            } => format!("{device_name}/{interface_name}"),
            Self::FrontPort {
                device_name,
                port_name,
                ..
            } => format!("{device_name}/front:{port_name}"),
            Self::RearPort {
                device_name,
                port_name,
                ..
            } => format!("{device_name}/rear:{port_name}"),
            Self::Unknown { raw_identifier, .. } => raw_identifier.clone(),
        }
    }

    /// Returns the attached cable.
    #[must_use]
    pub const fn cable_id(&self) -> Option<u64> {
        match self {
            Self::Interface { cable_id, .. }
            | Self::FrontPort { cable_id, .. }
            | Self::RearPort { cable_id, .. }
            | Self::Unknown { cable_id, .. } => *cable_id,
        }
    }

    /// Returns the owning device, if known.
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        match self {
            Self::Interface { device_name, .. }
            | Self::FrontPort { device_name, .. }
            | Self::RearPort { device_name, .. } => Some(device_name),
            Self::Unknown { .. } => None,
        }
    }

    /// Returns the interface or port name, or the raw identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Interface { interface_name, .. } => interface_name,
            Self::FrontPort { port_name, .. } | Self::RearPort { port_name, .. } => port_name,
            Self::Unknown { raw_identifier, .. } => raw_identifier,
        }
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> TerminationKind {
        match self {
            Self::Interface { .. } => TerminationKind::Interface,
            Self::FrontPort { .. } => TerminationKind::FrontPort,
            Self::RearPort { .. } => TerminationKind::RearPort,
            Self::Unknown { .. } => TerminationKind::Unknown,
        }
    }

    /// Returns the patch-panel side, for ports.
    #[must_use]
    pub const fn port_kind(&self) -> Option<PortKind> {
        match self {
            Self::FrontPort { .. } => Some(PortKind::Front),
            Self::RearPort { .. } => Some(PortKind::Rear),
            Self::Interface { .. } | Self::Unknown { .. } => None,
        }
    }

    /// Describes the termination for cable output.
    #[must_use]
    pub fn describe(&self) -> Value {
        match self {
            Self::Interface {
                device_name,
                interface_name,
                cable_id,
            } => json!({
                "type": TerminationKind::Interface,
                "device": device_name,
                "interface": interface_name,
                "cable_id": cable_id,
            }),
            Self::FrontPort {
                device_name,
                port_name,
                paired_rear_port_name,
                cable_id,
            } => json!({
                "type": TerminationKind::FrontPort,
                "device": device_name,
                "port": port_name,
                "rear_port": paired_rear_port_name,
                "cable_id": cable_id,
            }),
            Self::RearPort {
                device_name,
                port_name,
                paired_front_port_names,
                cable_id,
            } => json!({
                "type": TerminationKind::RearPort,
                "device": device_name,
                "port": port_name,
                "front_ports": paired_front_port_names,
                "cable_id": cable_id,
            }),
            Self::Unknown {
                raw_identifier,
                cable_id,
            } => json!({
                "type": TerminationKind::Unknown,
                "name": raw_identifier,
                "cable_id": cable_id,
            }),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

fn raw_identifier(record: &TerminationRecord) -> String {
    record
        .display
        .clone()
        .or_else(|| record.name.clone())
        .or_else(|| record.id.map(|id| format!("#{id}")))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::NestedRef;
    use test_case::test_case;

    fn record(object_type: Option<&str>) -> TerminationRecord {
        TerminationRecord {
            id: Some(5),
            object_type: object_type.map(str::to_string),
            name: Some("1".to_string()),
            device: Some(NestedRef::named(1, "pp1")),
            cable: Some(NestedRef {
                id: Some(9),
                ..NestedRef::default()
            }),
            ..TerminationRecord::default()
        }
    }

    #[test_case(Some("dcim.interface"), TerminationKind::Interface ; "explicit interface")]
    #[test_case(Some("dcim.frontport"), TerminationKind::FrontPort ; "explicit front port")]
    #[test_case(Some("dcim.rearport"), TerminationKind::RearPort ; "explicit rear port")]
    #[test_case(Some("dcim.consoleport"), TerminationKind::Interface ; "other type falls back to shape")]
    #[test_case(None, TerminationKind::Interface ; "device and name")]
    fn test_classify_by_object_type(object_type: Option<&str>, expected: TerminationKind) {
        assert_eq!(Termination::classify(&record(object_type)).kind(), expected);
    }

    #[test]
    fn test_classify_by_shape() {
        let mut front = record(None);
        front.rear_port = Some(NestedRef::named(7, "R1"));
        let t = Termination::classify(&front);
        assert_eq!(
            t,
            Termination::FrontPort {
                device_name: "pp1".to_string(),
                port_name: "1".to_string(),
                paired_rear_port_name: Some("R1".to_string()),
                cable_id: Some(9),
            }
        );

        let mut rear = record(None);
        rear.front_ports = Some(vec![
            NestedRef::named(2, "F1"),
            NestedRef::named(3, "F2"),
            NestedRef::named(2, "F1"),
        ]);
        match Termination::classify(&rear) {
            Termination::RearPort {
                paired_front_port_names,
                ..
            } => assert_eq!(paired_front_port_names, vec!["F1", "F2"]),
            other => panic!("expected rear port, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_is_total() {
        let empty = TerminationRecord::default();
        assert_eq!(
            Termination::classify(&empty),
            Termination::Unknown {
                raw_identifier: "unknown".to_string(),
                cable_id: None,
            }
        );

        let mut nameless = record(Some("dcim.interface"));
        nameless.name = None;
        nameless.display = Some("Console 1".to_string());
        let t = Termination::classify(&nameless);
        assert_eq!(t.kind(), TerminationKind::Unknown);
        assert_eq!(t.identity(), "Console 1");
        assert_eq!(t.cable_id(), Some(9));
    }

    #[test]
    fn test_identity_distinguishes_port_sides() {
        let front = Termination::classify(&record(Some("dcim.frontport")));
        let rear = Termination::classify(&record(Some("dcim.rearport")));
        let iface = Termination::classify(&record(Some("dcim.interface")));

        assert_eq!(front.identity(), "pp1/front:1");
        assert_eq!(rear.identity(), "pp1/rear:1");
        assert_eq!(iface.identity(), "pp1/1");
        assert_ne!(front.identity(), rear.identity());
    }

    #[test]
    fn test_describe_shapes() {
        let mut front = record(Some("dcim.frontport"));
        front.rear_port = Some(NestedRef::named(7, "R1"));
        let info = Termination::classify(&front).describe();
        assert_eq!(info["type"], "front_port");
        assert_eq!(info["port"], "1");
        assert_eq!(info["rear_port"], "R1");
        assert_eq!(info["cable_id"], 9);

        let unknown = Termination::classify(&TerminationRecord::default()).describe();
        assert_eq!(unknown["type"], "unknown");
        assert!(unknown["cable_id"].is_null());
    }
}
