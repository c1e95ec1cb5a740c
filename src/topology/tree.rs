//! Topology tree from a single interface.
//!
//! The tree is built depth-first with an explicit stack. A termination is
//! emitted at most once per tree: the first occurrence wins and later ones
//! are pruned without notice, which is also what stops wiring loops. Depth is
//! capped by the caller's `max_depth`; deeper branches are cut silently.

use super::{CableGraph, Expansion, Termination, TerminationKind};
use crate::inventory::InventoryBackend;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;

/// One node of the topology tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Owning device, unknown for unclassified records.
    pub device: Option<String>,
    /// Interface or port name.
    pub interface: String,
    /// `interface` or `port`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Attached cable.
    pub cable_id: Option<u64>,
    /// Distance from the root.
    pub depth: usize,
    /// Nodes reached from this one.
    pub children: Vec<TreeNode>,
    /// Lookup failure while pairing or expanding this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TreeNode {
    fn new(t: &Termination, depth: usize) -> Self {
        Self {
            device: t.device_name().map(str::to_string),
            interface: t.name().to_string(),
            kind: match t.kind() {
                TerminationKind::Interface => "interface",
                TerminationKind::FrontPort
                | TerminationKind::RearPort
                | TerminationKind::Unknown => "port",
            },
            cable_id: t.cable_id(),
            depth,
            children: Vec::new(),
            error: None,
        }
    }

    /// Counts this node and all of its descendants.
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        1 + self.children.iter().map(Self::total_nodes).sum::<usize>()
    }

    /// Counts distinct cables across the subtree.
    #[must_use]
    pub fn total_cables(&self) -> usize {
        let mut cables = HashSet::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if let Some(id) = node.cable_id {
                cables.insert(id);
            }
            pending.extend(node.children.iter());
        }
        cables.len()
    }

    /// Iterates the subtree in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            pending.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Summary of a built tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeMetadata {
    /// Starting device.
    pub start_device: String,
    /// Starting interface.
    pub start_interface: String,
    /// Node count including the root.
    pub total_nodes: usize,
    /// Distinct cables in the tree.
    pub total_cables: usize,
    /// Depth limit applied.
    pub max_depth: usize,
}

/// Result of a tree trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOutcome {
    /// The start interface is cabled and the tree was built.
    Built {
        /// Root node.
        tree: TreeNode,
        /// Summary.
        metadata: TreeMetadata,
    },
    /// The start interface has no cable.
    Uncabled {
        /// Explanation for the caller.
        message: String,
        /// Single-node tree.
        tree: TreeNode,
    },
}

impl TreeOutcome {
    /// Returns the root node.
    #[must_use]
    pub const fn tree(&self) -> &TreeNode {
        match self {
            Self::Built { tree, .. } | Self::Uncabled { tree, .. } => tree,
        }
    }

    /// Renders the tool result.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Built { tree, metadata } => json!({ "tree": tree, "metadata": metadata }),
            Self::Uncabled { message, tree } => json!({ "message": message, "tree": tree }),
        }
    }
}

/// Pending work: where to attach, what to emit, at which depth.
struct Pending {
    parent: Option<usize>,
    termination: Termination,
    depth: usize,
    error: Option<String>,
}

/// Builds topology trees.
pub struct TreeTracer<'a> {
    graph: CableGraph<'a>,
}

impl<'a> TreeTracer<'a> {
    /// Creates a tracer over `inventory`.
    #[must_use]
    pub fn new(inventory: &'a dyn InventoryBackend) -> Self {
        Self {
            graph: CableGraph::new(inventory),
        }
    }

    /// Builds the tree reachable from one interface, at most `max_depth`
    /// levels deep (the root is always emitted).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the interface does not exist, and
    /// propagates inventory failures while resolving it. Failures below the
    /// root are recorded on the affected node.
    pub fn trace(&self, device_name: &str, interface_name: &str, max_depth: usize) -> Result<TreeOutcome> {
        let span = tracing::info_span!("trace_tree", device = device_name, interface = interface_name, max_depth);
        let _enter = span.enter();

        let Some(record) = self
            .graph
            .inventory()
            .get_interface(device_name, interface_name)?
        else {
            return Err(Error::NotFound {
                kind: "Interface",
                identifier: interface_name.to_string(),
            });
        };

        let root = Termination::classify(&record);
        if root.cable_id().is_none() {
            return Ok(TreeOutcome::Uncabled {
                message: format!(
                    "Interface '{interface_name}' on device '{device_name}' has no cable connected"
                ),
                tree: TreeNode {
                    device: Some(device_name.to_string()),
                    interface: interface_name.to_string(),
                    ..TreeNode::new(&root, 0)
                },
            });
        }

        let tree = self.build(root, max_depth.max(1));
        let metadata = TreeMetadata {
            start_device: device_name.to_string(),
            start_interface: interface_name.to_string(),
            total_nodes: tree.total_nodes(),
            total_cables: tree.total_cables(),
            max_depth,
        };
        tracing::info!(
            total_nodes = metadata.total_nodes,
            total_cables = metadata.total_cables,
            "Tree built"
        );
        Ok(TreeOutcome::Built { tree, metadata })
    }

    fn build(&self, root: Termination, max_depth: usize) -> TreeNode {
        let mut visited: HashSet<String> = HashSet::new();
        let mut nodes: Vec<(Option<usize>, TreeNode)> = Vec::new();
        let mut stack = vec![Pending {
            parent: None,
            termination: root,
            depth: 0,
            error: None,
        }];

        while let Some(Pending {
            parent,
            termination,
            depth,
            error,
        }) = stack.pop()
        {
            if depth >= max_depth || !visited.insert(termination.identity()) {
                continue;
            }

            let mut node = TreeNode::new(&termination, depth);
            node.error = error;
            let index = nodes.len();
            let mut children = Vec::new();
            if depth + 1 < max_depth {
                match self.graph.expand(&termination) {
                    Ok(expansions) => children = candidates(expansions),
                    Err(e) => {
                        tracing::warn!(termination = %termination, error = %e, "Failed to expand tree node");
                        if node.error.is_none() {
                            node.error = Some(e.to_string());
                        }
                    },
                }
            }
            nodes.push((parent, node));

            // Reverse so the first candidate is expanded first.
            stack.extend(children.into_iter().rev().map(|(termination, error)| Pending {
                parent: Some(index),
                termination,
                depth: depth + 1,
                error,
            }));
        }

        assemble(nodes)
    }
}

/// Flattens expansions into children, each peer carrying its own pairing error.
fn candidates(expansions: Vec<Expansion>) -> Vec<(Termination, Option<String>)> {
    let mut candidates = Vec::new();
    for expansion in expansions {
        let error = expansion.error.as_ref().map(ToString::to_string);
        candidates.push((expansion.peer, error));
        candidates.extend(expansion.paired.into_iter().map(|pair| (pair, None)));
    }
    candidates
}

/// Links arena nodes into a tree. Children always follow their parent.
fn assemble(nodes: Vec<(Option<usize>, TreeNode)>) -> TreeNode {
    let mut parents = Vec::with_capacity(nodes.len());
    let mut slots = Vec::with_capacity(nodes.len());
    for (parent, node) in nodes {
        parents.push(parent);
        slots.push(Some(node));
    }

    for index in (1..slots.len()).rev() {
        let Some(mut node) = slots[index].take() else {
            continue;
        };
        // Children were attached last-first.
        node.children.reverse();
        if let Some(Some(parent)) = parents[index].map(|p| slots.get_mut(p).and_then(Option::as_mut)) {
            parent.children.push(node);
        }
    }

    let mut root = slots
        .first_mut()
        .and_then(Option::take)
        .unwrap_or_else(|| TreeNode {
            device: None,
            interface: String::new(),
            kind: "interface",
            cable_id: None,
            depth: 0,
            children: Vec::new(),
            error: None,
        });
    root.children.reverse();
    root
}
