//! arbor.rs
//! Rooted tree of one skeleton, stored as a dense arena.
//!
//! Node ids from the backend are mapped to `NodeIndex` slots in row order.
//! Topology is kept as a parent column plus a first-child / next-sibling
//! linked list, so every node costs a handful of `u32`s and traversals
//! never chase heap pointers.

use super::types::{NodeId, NodeIndex, Positions, Vec3};
use crate::error::{AnalysisError, Result};
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

const NONE: u32 = u32::MAX;

pub type Children = SmallVec<[NodeIndex; 4]>;

#[derive(Debug, Clone, Default)]
pub struct Arbor {
    ids: Vec<NodeId>,
    lookup: HashMap<NodeId, NodeIndex>,

    // Topology
    parent: Vec<u32>,
    first_child: Vec<u32>,
    next_sibling: Vec<u32>,
    child_count: Vec<u32>,
    root: Option<NodeIndex>,

    // Breadth-first from the root: every parent precedes its children.
    order: Vec<NodeIndex>,
}

impl Arbor {
    pub fn new() -> Self { Self::default() }

    /// Builds an arbor from `(node, parent)` rows; a row without parent declares the root.
    ///
    /// Fails with `MalformedTree` on a duplicate node, a parent that is never
    /// defined as a node, more than one root, no root at all, or a cycle.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NodeId, Option<NodeId>)>,
    {
        let rows: Vec<(NodeId, Option<NodeId>)> = rows.into_iter().collect();
        let count = rows.len();

        let mut arbor = Arbor {
            ids: Vec::with_capacity(count),
            lookup: HashMap::with_capacity(count),
            parent: vec![NONE; count],
            first_child: vec![NONE; count],
            next_sibling: vec![NONE; count],
            child_count: vec![0; count],
            root: None,
            order: Vec::with_capacity(count),
        };

        // 1. Register nodes
        for (i, &(id, _)) in rows.iter().enumerate() {
            if arbor.lookup.insert(id, NodeIndex::new(i)).is_some() {
                return Err(AnalysisError::malformed(format!("node {} is defined twice", id)));
            }
            arbor.ids.push(id);
        }

        // 2. Link parents and children
        for (i, &(id, parent)) in rows.iter().enumerate() {
            match parent {
                None => {
                    if let Some(existing) = arbor.root {
                        return Err(AnalysisError::malformed(format!(
                            "multiple roots: {} and {}",
                            arbor.ids[existing.index()],
                            id
                        )));
                    }
                    arbor.root = Some(NodeIndex::new(i));
                }
                Some(parent_id) => {
                    let p = *arbor.lookup.get(&parent_id).ok_or_else(|| {
                        AnalysisError::malformed(format!(
                            "node {} references undefined parent {}",
                            id, parent_id
                        ))
                    })?;
                    let p_idx = p.index();
                    arbor.parent[i] = p.0;
                    arbor.next_sibling[i] = arbor.first_child[p_idx];
                    arbor.first_child[p_idx] = i as u32;
                    arbor.child_count[p_idx] += 1;
                }
            }
        }

        // 3. Reachability from the root. With a single root and no dangling
        // parents, anything left unvisited sits on a cycle.
        match arbor.root {
            None if count > 0 => {
                return Err(AnalysisError::malformed("no root declared; parent edges form a cycle"));
            }
            None => {}
            Some(root) => {
                let mut queue = VecDeque::from([root]);
                while let Some(node) = queue.pop_front() {
                    arbor.order.push(node);
                    queue.extend(arbor.children_of(node));
                }
                if arbor.order.len() != count {
                    return Err(AnalysisError::malformed(format!(
                        "cycle detected: {} of {} nodes unreachable from root",
                        count - arbor.order.len(),
                        count
                    )));
                }
            }
        }

        debug!(nodes = count, root = ?arbor.root(), "Arbor constructed");
        Ok(arbor)
    }

    // --- Accessors ---

    pub fn root(&self) -> Option<NodeId> { self.root.map(|r| self.ids[r.index()]) }
    pub fn root_index(&self) -> Option<NodeIndex> { self.root }
    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Node ids in arena (row) order.
    pub fn nodes(&self) -> &[NodeId] { &self.ids }

    #[inline(always)]
    pub fn node_id(&self, idx: NodeIndex) -> NodeId { self.ids[idx.index()] }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> { self.lookup.get(&id).copied() }

    pub fn contains(&self, id: NodeId) -> bool { self.lookup.contains_key(&id) }

    #[inline(always)]
    pub fn parent_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        match self.parent[idx.index()] {
            NONE => None,
            p => Some(NodeIndex(p)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.index_of(id)
            .and_then(|idx| self.parent_of(idx))
            .map(|p| self.node_id(p))
    }

    #[inline(always)]
    pub fn child_count(&self, idx: NodeIndex) -> usize { self.child_count[idx.index()] as usize }

    /// Children of a slot, in reverse row order.
    pub fn children_of(&self, idx: NodeIndex) -> Children {
        let mut children = Children::new();
        let mut edge = self.first_child[idx.index()];
        while edge != NONE {
            children.push(NodeIndex(edge));
            edge = self.next_sibling[edge as usize];
        }
        children
    }

    /// Children of a node, ascending by id. Unknown nodes have none.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = match self.index_of(id) {
            Some(idx) => self.children_of(idx).iter().map(|&c| self.node_id(c)).collect(),
            None => Vec::new(),
        };
        children.sort_unstable();
        children
    }

    /// Every `(child, parent)` edge, as ids.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edge_indices().map(|(c, p)| (self.node_id(c), self.node_id(p)))
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.parent
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p != NONE)
            .map(|(i, &p)| (NodeIndex::new(i), NodeIndex(p)))
    }

    /// Slots ordered so that every parent precedes its children.
    pub fn traversal_order(&self) -> &[NodeIndex] { &self.order }

    // --- Shape queries ---

    /// Nodes without children, ascending by id.
    pub fn find_end_nodes(&self) -> Vec<NodeId> {
        self.collect_sorted(|count| count == 0)
    }

    /// Nodes with two or more children, ascending by id.
    pub fn find_branch_nodes(&self) -> Vec<NodeId> {
        self.collect_sorted(|count| count >= 2)
    }

    fn collect_sorted(&self, keep: impl Fn(u32) -> bool) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .child_count
            .iter()
            .enumerate()
            .filter(|&(_, &count)| keep(count))
            .map(|(i, _)| self.ids[i])
            .collect();
        nodes.sort_unstable();
        nodes
    }

    /// Walks downstream from `start` and returns the first strict descendant
    /// with two or more children, or `None` when a leaf comes first.
    ///
    /// If `start` itself branches, the walk continues into its child with
    /// the lowest node id.
    pub fn next_branch_node(&self, start: NodeId) -> Option<NodeId> {
        let start = self.index_of(start)?;
        let mut node = self.lowest_child(start)?;
        loop {
            match self.child_count(node) {
                0 => return None,
                1 => node = NodeIndex(self.first_child[node.index()]),
                _ => return Some(self.node_id(node)),
            }
        }
    }

    fn lowest_child(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.children_of(idx)
            .into_iter()
            .min_by_key(|&c| self.node_id(c))
    }

    /// Number of nodes in the subtree hanging from each slot, itself included.
    pub fn subtree_sizes(&self) -> Vec<u32> {
        let mut sizes = vec![1u32; self.len()];
        for &node in self.order.iter().rev() {
            if let Some(p) = self.parent_of(node) {
                sizes[p.index()] += sizes[node.index()];
            }
        }
        sizes
    }

    /// Sum of all edge lengths.
    pub fn cable_length(&self, positions: &Positions) -> Result<f64> {
        self.edges().try_fold(0.0, |total, (child, parent)| -> Result<f64> {
            Ok(total + position_of(positions, child)?.distance_to(position_of(positions, parent)?))
        })
    }
}

pub(crate) fn position_of(positions: &Positions, node: NodeId) -> Result<&Vec3> {
    positions.get(&node).ok_or(AnalysisError::MissingPosition { node })
}

/// Euclidean distance between a node's position and `center`.
pub fn distance_to_center(node: NodeId, center: &Vec3, positions: &Positions) -> Result<f64> {
    Ok(position_of(positions, node)?.distance_to(center))
}
