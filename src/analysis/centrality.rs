//! Betweenness and signal-flow centrality on an arbor.
//!
//! Paths in a tree are unique, so both measures reduce to sizes (or synapse
//! sums) of the components left behind when a node is removed: the subtree
//! under each child plus everything upstream of the node. One post-order
//! sweep yields all of them in O(n).

use crate::store::{Arbor, Connector, NodeId, SynapseRelation};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Per-node synapse counts, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynapseCounts {
    pub inputs: HashMap<NodeId, u32>,
    pub outputs: HashMap<NodeId, u32>,
}

impl SynapseCounts {
    pub fn from_connectors<'a>(connectors: impl IntoIterator<Item = &'a Connector>) -> Self {
        let mut counts = Self::default();
        for c in connectors {
            let side = match c.relation {
                SynapseRelation::Input => &mut counts.inputs,
                SynapseRelation::Output => &mut counts.outputs,
            };
            *side.entry(c.node).or_insert(0) += 1;
        }
        counts
    }
}

/// Number of node pairs whose connecting path runs through each node.
///
/// With `normalized`, values are divided by the number of pairs that do not
/// contain the node, `(n-1)(n-2)/2`, so they fall in `[0, 1]`.
pub fn betweenness_centrality(arbor: &Arbor, normalized: bool) -> HashMap<NodeId, f64> {
    to_node_map(arbor, betweenness_by_index(arbor, normalized))
}

pub(crate) fn betweenness_by_index(arbor: &Arbor, normalized: bool) -> Vec<f64> {
    let n = arbor.len() as u64;
    if n == 0 {
        return Vec::new();
    }
    let sizes = arbor.subtree_sizes();

    // Sum of squared component sizes, children first; upstream added below.
    let mut squares = vec![0u64; arbor.len()];
    for (child, parent) in arbor.edge_indices() {
        let s = sizes[child.index()] as u64;
        squares[parent.index()] += s * s;
    }

    let others = n - 1;
    let scale = if normalized && n > 2 { (others * (n - 2) / 2) as f64 } else { 1.0 };

    let values: Vec<f64> = sizes
        .iter()
        .zip(&squares)
        .map(|(&size, &sq)| {
            let upstream = n - size as u64;
            let pairs = (others * others - sq - upstream * upstream) / 2;
            pairs as f64 / scale
        })
        .collect();

    debug!(nodes = n, normalized, "Betweenness centrality computed");
    values
}

/// Bottleneck synapse flow through every node.
///
/// Removing node `v` splits the arbor into components `C`. With `A` and `B`
/// the inputs and outputs outside `v` itself, the flow is the largest number
/// of input-to-output paths that can be routed through `v` when no path may
/// start and end in the same component:
/// `min(A, B, min_C(A + B - in(C) - out(C)))`.
///
/// Swapping inputs and outputs leaves every value unchanged.
pub fn flow_centrality(
    arbor: &Arbor,
    inputs: &HashMap<NodeId, u32>,
    outputs: &HashMap<NodeId, u32>,
) -> HashMap<NodeId, f64> {
    to_node_map(arbor, flow_by_index(arbor, inputs, outputs))
}

pub(crate) fn flow_by_index(
    arbor: &Arbor,
    inputs: &HashMap<NodeId, u32>,
    outputs: &HashMap<NodeId, u32>,
) -> Vec<f64> {
    let own_in = per_index(arbor, inputs, "input");
    let own_out = per_index(arbor, outputs, "output");
    let total_in: u64 = own_in.iter().sum();
    let total_out: u64 = own_out.iter().sum();

    // Subtree sums, leaves towards root.
    let mut sub_in = own_in.clone();
    let mut sub_out = own_out.clone();
    // Heaviest component (by inputs + outputs) hanging off each node.
    let mut heaviest = vec![0u64; arbor.len()];
    for &node in arbor.traversal_order().iter().rev() {
        let i = node.index();
        if let Some(p) = arbor.parent_of(node) {
            sub_in[p.index()] += sub_in[i];
            sub_out[p.index()] += sub_out[i];
            heaviest[p.index()] = heaviest[p.index()].max(sub_in[i] + sub_out[i]);
        }
    }

    let values: Vec<f64> = (0..arbor.len())
        .map(|i| {
            let upstream = (total_in - sub_in[i]) + (total_out - sub_out[i]);
            let heaviest = heaviest[i].max(upstream);
            let a = total_in - own_in[i];
            let b = total_out - own_out[i];
            a.min(b).min(a + b - heaviest) as f64
        })
        .collect();

    debug!(nodes = arbor.len(), total_in, total_out, "Flow centrality computed");
    values
}

fn per_index(arbor: &Arbor, counts: &HashMap<NodeId, u32>, kind: &str) -> Vec<u64> {
    let mut dense = vec![0u64; arbor.len()];
    for (&node, &count) in counts {
        match arbor.index_of(node) {
            Some(idx) => dense[idx.index()] += count as u64,
            None => warn!(%node, kind, "Synapse on node outside the arbor ignored"),
        }
    }
    dense
}

fn to_node_map(arbor: &Arbor, values: Vec<f64>) -> HashMap<NodeId, f64> {
    arbor.nodes().iter().copied().zip(values).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::arbor::tests::arbor;
    use rstest::rstest;

    fn counts(pairs: &[(i64, u32)]) -> HashMap<NodeId, u32> {
        pairs.iter().map(|&(n, c)| (NodeId(n), c)).collect()
    }

    /// Counts pairs by walking every path explicitly.
    fn brute_force_betweenness(a: &Arbor) -> HashMap<NodeId, f64> {
        let ancestors = |id: NodeId| {
            let mut chain = vec![id];
            while let Some(p) = a.parent(*chain.last().unwrap()) {
                chain.push(p);
            }
            chain
        };
        let mut result: HashMap<NodeId, f64> = a.nodes().iter().map(|&n| (n, 0.0)).collect();
        let nodes = a.nodes();
        for (i, &x) in nodes.iter().enumerate() {
            for &y in &nodes[i + 1..] {
                let (ax, ay) = (ancestors(x), ancestors(y));
                let lca = *ax.iter().find(|n| ay.contains(*n)).unwrap();
                let path = ax.iter().take_while(|&&n| n != lca)
                    .chain(ay.iter().take_while(|&&n| n != lca))
                    .chain(std::iter::once(&lca));
                for &n in path {
                    if n != x && n != y {
                        *result.get_mut(&n).unwrap() += 1.0;
                    }
                }
            }
        }
        result
    }

    #[test]
    fn test_betweenness_root_with_two_leaves() {
        let a = arbor(&[(1, None), (2, Some(1)), (3, Some(1))]);
        let c = betweenness_centrality(&a, false);
        assert_eq!(c[&NodeId(1)], 1.0);
        assert_eq!(c[&NodeId(2)], 0.0);
        assert_eq!(c[&NodeId(3)], 0.0);
    }

    #[test]
    fn test_betweenness_balanced_subtrees() {
        // Root with two chains of k = 3 nodes each: 3 * 3 pairs cross the root.
        let a = arbor(&[
            (1, None),
            (2, Some(1)), (3, Some(2)), (4, Some(3)),
            (5, Some(1)), (6, Some(5)), (7, Some(6)),
        ]);
        assert_eq!(betweenness_centrality(&a, false)[&NodeId(1)], 9.0);
    }

    #[test]
    fn test_betweenness_matches_path_enumeration() {
        let a = arbor(&[
            (1, None), (2, Some(1)), (3, Some(2)), (4, Some(3)), (5, Some(1)),
            (6, Some(5)), (7, Some(3)), (8, Some(2)), (9, Some(8)), (10, Some(8)),
        ]);
        assert_eq!(betweenness_centrality(&a, false), brute_force_betweenness(&a));
    }

    #[test]
    fn test_betweenness_normalized() {
        // Path 1-2-3-4: node 2 carries pairs (1,3), (1,4) out of the 3 pairs without it.
        let a = arbor(&[(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3))]);
        let c = betweenness_centrality(&a, true);
        assert!((c[&NodeId(2)] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(c[&NodeId(4)], 0.0);
    }

    #[test]
    fn test_betweenness_trivial_arbors() {
        assert!(betweenness_centrality(&arbor(&[]), false).is_empty());
        assert_eq!(betweenness_centrality(&arbor(&[(5, None)]), true)[&NodeId(5)], 0.0);
    }

    #[rstest]
    #[case::rooted_at_input_leaf(&[(1, None), (2, Some(1)), (3, Some(2))])]
    #[case::rooted_at_middle(&[(2, None), (1, Some(2)), (3, Some(2))])]
    #[case::rooted_at_output_leaf(&[(3, None), (2, Some(3)), (1, Some(2))])]
    fn test_flow_three_node_path(#[case] pairs: &[(i64, Option<i64>)]) {
        let a = arbor(pairs);
        let inputs = counts(&[(1, 1)]);
        let outputs = counts(&[(3, 1)]);

        let c = flow_centrality(&a, &inputs, &outputs);
        assert_eq!(c[&NodeId(2)], 1.0);
        assert_eq!(c[&NodeId(1)], 0.0);
        assert_eq!(c[&NodeId(3)], 0.0);

        // Swapping directions leaves the flow unchanged.
        assert_eq!(flow_centrality(&a, &outputs, &inputs), c);
    }

    #[test]
    fn test_flow_is_bottlenecked_by_the_scarcer_side() {
        // 1(in x3) - 2 - 3 - 4(out x1), with a side branch 5(in x2) on node 3.
        let a = arbor(&[(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3)), (5, Some(3))]);
        let c = flow_centrality(&a, &counts(&[(1, 3), (5, 2)]), &counts(&[(4, 1)]));
        assert_eq!(c[&NodeId(2)], 1.0);
        assert_eq!(c[&NodeId(3)], 1.0);
        assert_eq!(c[&NodeId(5)], 0.0);
    }

    #[test]
    fn test_flow_ignores_synapses_on_the_node_itself() {
        let a = arbor(&[(1, None), (2, Some(1)), (3, Some(2))]);
        let c = flow_centrality(&a, &counts(&[(2, 4)]), &counts(&[(3, 4)]));
        assert_eq!(c[&NodeId(2)], 0.0);
    }

    #[test]
    fn test_flow_within_one_component_does_not_count() {
        // Inputs and outputs both sit under child 2 of the root.
        let a = arbor(&[(1, None), (2, Some(1)), (3, Some(2)), (4, Some(2)), (5, Some(1))]);
        let c = flow_centrality(&a, &counts(&[(3, 2)]), &counts(&[(4, 2)]));
        assert_eq!(c[&NodeId(1)], 0.0);
        assert_eq!(c[&NodeId(2)], 2.0);
    }

    #[test]
    fn test_synapse_counts_from_connectors() {
        let connectors = vec![Connector::input(1), Connector::input(1), Connector::output(2)];
        let s = SynapseCounts::from_connectors(&connectors);
        assert_eq!(s.inputs, counts(&[(1, 2)]));
        assert_eq!(s.outputs, counts(&[(2, 1)]));
    }
}
