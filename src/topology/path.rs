//! Bidirectional device-to-device path search.
//!
//! Two breadth-first searches run in alternating rounds, one from each end.
//! Each round expands every frontier device once: its cabled interfaces and
//! ports are walked one step through [`CableGraph::next`], and devices seen
//! for the first time form the next frontier. The search stops when a newly
//! discovered device has already been expanded by the other side.
//!
//! Checking new devices against the other side's *expanded* set (rather than
//! everything it has discovered) makes the first meeting a shortest path: a
//! path of length `2k` meets at the source check of round `k + 1`, a path of
//! length `2k + 1` at the target check of the same round.

use super::{CableGraph, Termination};
use crate::inventory::InventoryBackend;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

/// One cable segment of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathHop {
    /// Device the hop leaves from.
    pub device: String,
    /// Interface or port the hop leaves through.
    pub interface: String,
    /// Cable crossed.
    pub cable_id: Option<u64>,
    /// Device the hop arrives at.
    pub next_device: String,
    /// Interface or port the hop arrives at.
    pub next_interface: String,
}

impl PathHop {
    /// Returns the same hop walked in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            device: self.next_device.clone(),
            interface: self.next_interface.clone(),
            cable_id: self.cable_id,
            next_device: self.device.clone(),
            next_interface: self.interface.clone(),
        }
    }
}

/// Where the two searches met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingPoint {
    /// Meeting device.
    pub device: String,
    /// Hops from the source to the meeting device.
    pub source_hops: usize,
    /// Hops from the target to the meeting device.
    pub target_hops: usize,
}

/// Result of a path search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// A path was found. Every hop reads source to target.
    Found {
        /// Hops in order.
        path: Vec<PathHop>,
        /// Meeting device.
        meeting_point: MeetingPoint,
    },
    /// The searches did not meet.
    Exhausted {
        /// Source device.
        source: String,
        /// Target device.
        target: String,
        /// Round budget that was used up (or not needed, if both frontiers emptied).
        max_iterations: usize,
        /// Devices expanded from the source side.
        source_devices_explored: usize,
        /// Devices expanded from the target side.
        target_devices_explored: usize,
    },
}

impl PathOutcome {
    /// Returns the hop count of a found path.
    #[must_use]
    pub fn total_hops(&self) -> Option<usize> {
        match self {
            Self::Found { path, .. } => Some(path.len()),
            Self::Exhausted { .. } => None,
        }
    }

    /// Returns true when a path was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Renders the tool result.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Found {
                path,
                meeting_point,
            } => json!({
                "path": path,
                "meeting_point": meeting_point,
                "total_hops": path.len(),
            }),
            Self::Exhausted {
                source,
                target,
                max_iterations,
                source_devices_explored,
                target_devices_explored,
            } => json!({
                "error": format!(
                    "No path found between '{source}' and '{target}' after {max_iterations} iterations"
                ),
                "source_devices_explored": source_devices_explored,
                "target_devices_explored": target_devices_explored,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Source,
    Target,
}

impl Side {
    const fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

/// Search state for one direction.
struct Frontier {
    side: Side,
    /// Path from the origin to every discovered device.
    paths: HashMap<String, Vec<PathHop>>,
    /// Devices already expanded.
    visited: HashSet<String>,
    /// Devices discovered in the last round, in discovery order.
    frontier: Vec<String>,
}

impl Frontier {
    fn new(side: Side, origin: &str) -> Self {
        Self {
            side,
            paths: HashMap::from([(origin.to_string(), Vec::new())]),
            visited: HashSet::new(),
            frontier: vec![origin.to_string()],
        }
    }

    fn hops(&self, device: &str) -> usize {
        self.paths.get(device).map_or(0, Vec::len)
    }
}

/// Finds the shortest physical path between two devices.
pub struct PathTracer<'a> {
    graph: CableGraph<'a>,
}

impl<'a> PathTracer<'a> {
    /// Creates a tracer over `inventory`.
    #[must_use]
    pub fn new(inventory: &'a dyn InventoryBackend) -> Self {
        Self {
            graph: CableGraph::new(inventory),
        }
    }

    /// Searches for a path from `source` to `target` in at most
    /// `max_iterations` rounds (at least one round always runs).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if either device does not exist, and
    /// propagates inventory failures while resolving them. Failures during
    /// the search itself only prune the affected branch.
    pub fn trace(&self, source: &str, target: &str, max_iterations: usize) -> Result<PathOutcome> {
        let span = tracing::info_span!("trace_path", source, target, max_iterations);
        let _enter = span.enter();

        let inventory = self.graph.inventory();
        if inventory.find_device(source)?.is_none() {
            return Err(Error::NotFound {
                kind: "Source device",
                identifier: source.to_string(),
            });
        }
        if inventory.find_device(target)?.is_none() {
            return Err(Error::NotFound {
                kind: "Target device",
                identifier: target.to_string(),
            });
        }

        if source == target {
            return Ok(PathOutcome::Found {
                path: Vec::new(),
                meeting_point: MeetingPoint {
                    device: source.to_string(),
                    source_hops: 0,
                    target_hops: 0,
                },
            });
        }

        let mut from_source = Frontier::new(Side::Source, source);
        let mut from_target = Frontier::new(Side::Target, target);

        for round in 1..=max_iterations.max(1) {
            self.expand(&mut from_source);
            if let Some(found) = meet(&from_source, &from_target) {
                tracing::info!(round, meeting = %found.device, "Path found");
                return Ok(assemble(&from_source, &from_target, found));
            }

            self.expand(&mut from_target);
            if let Some(found) = meet(&from_target, &from_source) {
                tracing::info!(round, meeting = %found.device, "Path found");
                return Ok(assemble(&from_source, &from_target, found));
            }

            if from_source.frontier.is_empty() && from_target.frontier.is_empty() {
                tracing::debug!(round, "Both frontiers empty");
                break;
            }
        }

        tracing::info!(
            source_explored = from_source.visited.len(),
            target_explored = from_target.visited.len(),
            "No path found"
        );
        Ok(PathOutcome::Exhausted {
            source: source.to_string(),
            target: target.to_string(),
            max_iterations,
            source_devices_explored: from_source.visited.len(),
            target_devices_explored: from_target.visited.len(),
        })
    }

    /// Expands every frontier device once and replaces the frontier with the
    /// devices discovered.
    fn expand(&self, side: &mut Frontier) {
        let frontier = std::mem::take(&mut side.frontier);
        let mut discovered = Vec::new();

        for device in frontier {
            if !side.visited.insert(device.clone()) {
                continue;
            }
            metrics::counter!("trace_devices_expanded_total", "side" => side.side.label())
                .increment(1);

            let parent_path = side.paths.get(&device).cloned().unwrap_or_default();
            for start in self.cabled_terminations(&device) {
                let neighbors = match self.graph.next(&start) {
                    Ok(neighbors) => neighbors,
                    Err(e) => {
                        tracing::warn!(termination = %start, error = %e, "Skipping unreachable branch");
                        continue;
                    },
                };

                for neighbor in neighbors {
                    let Some(next_device) = neighbor.device_name() else {
                        continue;
                    };
                    if next_device == device || side.paths.contains_key(next_device) {
                        continue;
                    }

                    let mut path = parent_path.clone();
                    path.push(PathHop {
                        device: device.clone(),
                        interface: start.name().to_string(),
                        cable_id: start.cable_id(),
                        next_device: next_device.to_string(),
                        next_interface: neighbor.name().to_string(),
                    });
                    side.paths.insert(next_device.to_string(), path);
                    discovered.push(next_device.to_string());
                }
            }
        }

        tracing::debug!(
            side = side.side.label(),
            discovered = discovered.len(),
            "Expanded frontier"
        );
        side.frontier = discovered;
    }

    /// Returns the cabled interfaces and ports of a device.
    fn cabled_terminations(&self, device: &str) -> Vec<Termination> {
        let inventory = self.graph.inventory();
        let interfaces = inventory.list_cabled_interfaces(device).unwrap_or_else(|e| {
            tracing::warn!(device, error = %e, "Failed to list cabled interfaces");
            Vec::new()
        });
        let ports = inventory.list_cabled_ports(device).unwrap_or_else(|e| {
            tracing::warn!(device, error = %e, "Failed to list cabled ports");
            Vec::new()
        });

        interfaces
            .iter()
            .chain(ports.iter())
            .map(Termination::classify)
            .collect()
    }
}

/// Picks the meeting device among `side`'s new frontier.
///
/// Candidates are devices the other side has already expanded; the one with
/// the fewest combined hops wins, ties going to frontier order.
fn meet(side: &Frontier, other: &Frontier) -> Option<MeetingPoint> {
    let mut best: Option<(usize, &String)> = None;
    for device in side.frontier.iter().filter(|d| other.visited.contains(*d)) {
        let total = side.hops(device) + other.hops(device);
        if best.is_none_or(|(hops, _)| total < hops) {
            best = Some((total, device));
        }
    }

    best.map(|(_, device)| {
        let (source_hops, target_hops) = match side.side {
            Side::Source => (side.hops(device), other.hops(device)),
            Side::Target => (other.hops(device), side.hops(device)),
        };
        MeetingPoint {
            device: device.clone(),
            source_hops,
            target_hops,
        }
    })
}

/// Joins the two half-paths at the meeting device.
fn assemble(source: &Frontier, target: &Frontier, meeting_point: MeetingPoint) -> PathOutcome {
    let mut path = source
        .paths
        .get(&meeting_point.device)
        .cloned()
        .unwrap_or_default();
    if let Some(back) = target.paths.get(&meeting_point.device) {
        path.extend(back.iter().rev().map(PathHop::reversed));
    }
    PathOutcome::Found {
        path,
        meeting_point,
    }
}
