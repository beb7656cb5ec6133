//! Node layout arena built from a topology field.
//!
//! Nodes are addressed by id and relations are stored as id sets, so the graph
//! may be cyclic without any ownership cycles. Position order is kept because
//! it is the join key of the encoded field.

use crate::codec::{self, NodeTopology, TopologyError};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Coordinate every node receives when the topology field is unusable
pub const DEFAULT_COORDINATE: i32 = 1;

/// Errors from editing a layout
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The id is not part of the layout
    #[error("node {0} is not in the layout")]
    UnknownNode(u64),

    /// The id is already part of the layout
    #[error("node {0} is already in the layout")]
    DuplicateNode(u64),
}

/// Ordered arena of node placements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    nodes: Vec<NodeTopology>,
    index: HashMap<u64, usize>,
}

/// Layout statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStats {
    /// Number of nodes
    pub total_nodes: usize,
    /// Number of directed relations
    pub total_relations: usize,
}

impl Layout {
    /// Build a layout from parsed nodes.
    ///
    /// Ids are unique in a layout: a repeated id keeps its first occurrence.
    pub fn from_nodes(nodes: Vec<NodeTopology>) -> Self {
        let mut layout = Self {
            nodes: Vec::with_capacity(nodes.len()),
            index: HashMap::with_capacity(nodes.len()),
        };
        for node in nodes {
            if layout.index.contains_key(&node.id) {
                warn!("Ignoring repeated node {} in layout", node.id);
                continue;
            }
            layout.index.insert(node.id, layout.nodes.len());
            layout.nodes.push(node);
        }
        layout
    }

    /// Every known node at `(1,1,1)` with no relations
    pub fn default_for(known_ids: &[u64]) -> Self {
        Self::from_nodes(
            known_ids
                .iter()
                .map(|id| {
                    NodeTopology::new(*id, DEFAULT_COORDINATE, DEFAULT_COORDINATE, DEFAULT_COORDINATE)
                })
                .collect(),
        )
    }

    /// Parse a topology field, falling back to the default layout.
    ///
    /// The node list is authoritative; the topology field is advisory and the
    /// server may omit or corrupt it, so a structural error never escapes.
    pub fn from_field_or_default(field: &str, known_ids: &[u64]) -> Self {
        let known: HashSet<u64> = known_ids.iter().copied().collect();
        match Self::from_field(field, &known) {
            Ok(layout) => {
                debug!("Parsed topology with {} nodes", layout.len());
                layout
            }
            Err(e) => {
                warn!(
                    "Topology field rejected ({}), using default layout for {} nodes",
                    e,
                    known_ids.len()
                );
                Self::default_for(known_ids)
            }
        }
    }

    /// Parse a topology field without fallback
    pub fn from_field(field: &str, known_ids: &HashSet<u64>) -> Result<Self, TopologyError> {
        codec::parse(field, known_ids).map(Self::from_nodes)
    }

    /// Encode the layout as a topology field
    pub fn to_field(&self) -> String {
        codec::generate(&self.nodes)
    }

    /// Nodes in position order
    pub fn nodes(&self) -> &[NodeTopology] {
        &self.nodes
    }

    /// Node ids in position order
    pub fn ids(&self) -> Vec<u64> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Look up a node by id
    pub fn node(&self, id: u64) -> Option<&NodeTopology> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the layout has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_mut(&mut self, id: u64) -> Result<&mut NodeTopology, LayoutError> {
        match self.index.get(&id) {
            Some(&pos) => Ok(&mut self.nodes[pos]),
            None => Err(LayoutError::UnknownNode(id)),
        }
    }

    /// Append a node at the default coordinate
    pub fn add_node(&mut self, id: u64) -> Result<(), LayoutError> {
        if self.index.contains_key(&id) {
            return Err(LayoutError::DuplicateNode(id));
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(NodeTopology::new(
            id,
            DEFAULT_COORDINATE,
            DEFAULT_COORDINATE,
            DEFAULT_COORDINATE,
        ));
        Ok(())
    }

    /// Remove a node and every relation pointing at it
    pub fn remove_node(&mut self, id: u64) -> Result<NodeTopology, LayoutError> {
        let pos = self.index.remove(&id).ok_or(LayoutError::UnknownNode(id))?;
        let removed = self.nodes.remove(pos);
        for node in &mut self.nodes {
            node.relations.remove(&id);
        }
        for (i, node) in self.nodes.iter().enumerate().skip(pos) {
            self.index.insert(node.id, i);
        }
        Ok(removed)
    }

    /// Connect `from` to `to`; returns false if the relation already existed
    pub fn connect(&mut self, from: u64, to: u64) -> Result<bool, LayoutError> {
        if !self.index.contains_key(&to) {
            return Err(LayoutError::UnknownNode(to));
        }
        Ok(self.node_mut(from)?.relations.insert(to))
    }

    /// Disconnect `from` from `to`; returns false if there was no relation
    pub fn disconnect(&mut self, from: u64, to: u64) -> Result<bool, LayoutError> {
        Ok(self.node_mut(from)?.relations.remove(&to))
    }

    /// Move a node
    pub fn move_node(&mut self, id: u64, x: i32, y: i32, z: i32) -> Result<(), LayoutError> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        node.z = z;
        Ok(())
    }

    /// Get layout statistics
    pub fn stats(&self) -> LayoutStats {
        LayoutStats {
            total_nodes: self.nodes.len(),
            total_relations: self.nodes.iter().map(|n| n.relations.len()).sum(),
        }
    }
}
