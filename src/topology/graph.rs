//! Cable graph edges.
//!
//! Vertices are [`Termination`]s. Edges are cables (from a termination to
//! every other termination on the same cable) plus the internal front/rear
//! pairing of patch-panel ports, which is not a cable and has no ID of its
//! own. Both tracers get their edges from [`CableGraph`] and nowhere else.

use super::Termination;
use crate::inventory::{Cable, InventoryBackend, PortKind};
use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;

/// Per-request view of the cable graph.
///
/// Cables are memoized for the lifetime of the view, so a cable seen from
/// both ends is fetched once. Lookup failures are not memoized.
pub struct CableGraph<'a> {
    inventory: &'a dyn InventoryBackend,
    cables: RefCell<HashMap<u64, Option<Cable>>>,
}

impl<'a> CableGraph<'a> {
    /// Creates a view over `inventory`.
    #[must_use]
    pub fn new(inventory: &'a dyn InventoryBackend) -> Self {
        Self {
            inventory,
            cables: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the underlying inventory.
    #[must_use]
    pub fn inventory(&self) -> &'a dyn InventoryBackend {
        self.inventory
    }

    /// Fetches a cable, memoized.
    ///
    /// # Errors
    ///
    /// Propagates inventory failures.
    pub fn cable(&self, id: u64) -> Result<Option<Cable>> {
        if let Some(cached) = self.cables.borrow().get(&id) {
            return Ok(cached.clone());
        }
        let cable = self.inventory.get_cable(id)?;
        self.cables.borrow_mut().insert(id, cable.clone());
        Ok(cable)
    }

    /// Returns every other termination on the cable attached to `t`.
    ///
    /// Empty when `t` has no cable or the cable no longer exists. Fan-out
    /// cables yield several terminations.
    ///
    /// # Errors
    ///
    /// Propagates inventory failures.
    pub fn connected(&self, t: &Termination) -> Result<Vec<Termination>> {
        let Some(cable_id) = t.cable_id() else {
            return Ok(Vec::new());
        };
        let Some(cable) = self.cable(cable_id)? else {
            tracing::warn!(cable_id, termination = %t, "Referenced cable not found");
            return Ok(Vec::new());
        };

        let own = t.identity();
        Ok(cable
            .terminations()
            .map(Termination::classify)
            .filter(|peer| peer.identity() != own)
            .collect())
    }

    /// Returns the ports paired with `t` inside its patch panel.
    ///
    /// A front port yields its rear port; a rear port yields all of its front
    /// ports. Interfaces and unknown terminations have no pairing.
    ///
    /// # Errors
    ///
    /// Propagates inventory failures.
    pub fn paired(&self, t: &Termination) -> Result<Vec<Termination>> {
        let (device, names, kind) = match t {
            Termination::FrontPort {
                device_name,
                paired_rear_port_name: Some(rear),
                ..
            } => (device_name, std::slice::from_ref(rear), PortKind::Rear),
            Termination::RearPort {
                device_name,
                paired_front_port_names,
                ..
            } => (device_name, paired_front_port_names.as_slice(), PortKind::Front),
            _ => return Ok(Vec::new()),
        };

        let mut paired = Vec::with_capacity(names.len());
        for name in names {
            match self.inventory.get_port(kind, device, name)? {
                Some(record) => paired.push(Termination::classify(&record)),
                None => {
                    tracing::warn!(device = %device, port = %name, "Paired port not found");
                },
            }
        }
        Ok(paired)
    }

    /// Expands `t` one cable away, peer by peer.
    ///
    /// Every termination on the attached cable is returned with the ports
    /// paired with it. A failed pairing lookup is kept on that peer's
    /// [`Expansion`] and does not affect its siblings.
    ///
    /// # Errors
    ///
    /// Propagates a failure to fetch the cable attached to `t`.
    pub fn expand(&self, t: &Termination) -> Result<Vec<Expansion>> {
        Ok(self
            .connected(t)?
            .into_iter()
            .map(|peer| match self.paired(&peer) {
                Ok(paired) => Expansion {
                    peer,
                    paired,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(termination = %peer, error = %e, "Pairing lookup failed");
                    Expansion {
                        peer,
                        paired: Vec::new(),
                        error: Some(e),
                    }
                },
            })
            .collect())
    }

    /// Returns the terminations one step away from `t`.
    ///
    /// Each connected termination is followed by the ports paired with it, so
    /// a walk passes through a patch panel in one step. Duplicates are
    /// dropped. A failed pairing lookup drops only that pairing.
    ///
    /// # Errors
    ///
    /// Propagates a failure to fetch the cable attached to `t`.
    pub fn next(&self, t: &Termination) -> Result<Vec<Termination>> {
        let mut next: Vec<Termination> = Vec::new();
        for expansion in self.expand(t)? {
            for candidate in expansion.into_terminations() {
                if !next.iter().any(|n| n.identity() == candidate.identity()) {
                    next.push(candidate);
                }
            }
        }
        Ok(next)
    }
}

/// One peer on a cable and what lies behind it inside its patch panel.
#[derive(Debug)]
pub struct Expansion {
    /// Termination on the far end of the cable.
    pub peer: Termination,
    /// Ports paired with `peer`; empty for interfaces or on failure.
    pub paired: Vec<Termination>,
    /// Why the pairing of `peer` could not be resolved.
    pub error: Option<Error>,
}

impl Expansion {
    /// The peer followed by its paired ports.
    pub fn into_terminations(self) -> impl Iterator<Item = Termination> {
        std::iter::once(self.peer).chain(self.paired)
    }
}
