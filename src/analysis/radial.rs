//! Sholl analysis and radial density around a reference point.
//!
//! Shell `k` is the sphere of radius `k * increment`. A distance `d` falls in
//! shell index `floor(d / increment)`, so a value exactly on a boundary
//! belongs to the outer shell: an edge crosses boundary `k` when
//! `min(d) < k * increment <= max(d)`.

use crate::error::{AnalysisError, Result};
use crate::store::arbor::position_of;
use crate::store::{Arbor, Connector, NodeId, Positions, RadialDensity, ShollResult, SynapseRelation, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the shell (or bin) index any node may fall in. Results are
/// dense, so the increment must resolve every distance within this many steps.
pub const MAX_SHELLS: usize = 1 << 20;

fn check_increment(radius_increment: f64) -> Result<()> {
    if radius_increment.is_finite() && radius_increment > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter(format!(
            "radius increment must be a positive number, got {}",
            radius_increment
        )))
    }
}

fn shell_index(node: NodeId, distance: f64, radius_increment: f64) -> Result<usize> {
    if !(distance.is_finite() && distance >= 0.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "distance of node {} must be a non-negative number, got {}",
            node, distance
        )));
    }
    let shell = (distance / radius_increment).floor();
    if shell >= MAX_SHELLS as f64 {
        return Err(AnalysisError::InvalidParameter(format!(
            "radius increment {} too small: node {} lies beyond shell {}",
            radius_increment, node, MAX_SHELLS
        )));
    }
    Ok(shell as usize)
}

/// Counts edge crossings of concentric shells.
///
/// `distance_fn` is evaluated once per node. Radii run from the increment
/// up to the outermost crossed shell; shells in between that nothing
/// crosses are reported with 0.
pub fn sholl<F>(arbor: &Arbor, radius_increment: f64, mut distance_fn: F) -> Result<ShollResult>
where
    F: FnMut(NodeId) -> Result<f64>,
{
    check_increment(radius_increment)?;

    let shells = arbor
        .nodes()
        .iter()
        .map(|&node| shell_index(node, distance_fn(node)?, radius_increment))
        .collect::<Result<Vec<usize>>>()?;

    let mut crossings: Vec<u32> = Vec::new();
    for (child, parent) in arbor.edge_indices() {
        let (a, b) = (shells[child.index()], shells[parent.index()]);
        let (lo, hi) = (a.min(b), a.max(b));
        if lo == hi {
            continue;
        }
        if crossings.len() <= hi {
            crossings.resize(hi + 1, 0);
        }
        for count in &mut crossings[lo + 1..=hi] {
            *count += 1;
        }
    }

    // Shell 0 is the center itself; nothing can cross it.
    let crossings: Vec<u32> = crossings.into_iter().skip(1).collect();
    let radius = (1..=crossings.len()).map(|k| k as f64 * radius_increment).collect();

    debug!(edges = arbor.len().saturating_sub(1), shells = crossings.len(), "Sholl analysis done");
    Ok(ShollResult { radius, crossings })
}

/// Sums `weight_fn` over `subset`, binned by distance from `center`.
///
/// Bins are labelled by their inner radius and run from 0 up to the
/// outermost occupied bin; empty bins in between are reported with 0.
/// Nodes are visited in ascending id order so float sums are reproducible.
pub fn radial_density<F>(
    center: &Vec3,
    radius_increment: f64,
    subset: &Positions,
    mut weight_fn: F,
) -> Result<RadialDensity>
where
    F: FnMut(NodeId) -> Result<f64>,
{
    check_increment(radius_increment)?;

    let mut nodes: Vec<(&NodeId, &Vec3)> = subset.iter().collect();
    nodes.sort_unstable_by_key(|(id, _)| **id);

    let mut counts: Vec<f64> = Vec::new();
    for (&node, position) in nodes {
        let bin = shell_index(node, center.distance_to(position), radius_increment)?;
        if counts.len() <= bin {
            counts.resize(bin + 1, 0.0);
        }
        counts[bin] += weight_fn(node)?;
    }

    let bins = (0..counts.len()).map(|k| k as f64 * radius_increment).collect();
    debug!(nodes = subset.len(), bins = counts.len(), "Radial density done");
    Ok(RadialDensity { bins, counts })
}

/// Which nodes a radial density is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSubset {
    All,
    EndNodes,
    BranchNodes,
    InputSynapses,
    OutputSynapses,
}

impl NodeSubset {
    /// Restricts `positions` to the subset. Synapse subsets keep each
    /// synapse-bearing node once, however many connectors it carries.
    pub fn select(&self, arbor: &Arbor, positions: &Positions, connectors: &[Connector]) -> Result<Positions> {
        let synapses = |relation: SynapseRelation| -> Vec<NodeId> {
            connectors.iter().filter(|c| c.relation == relation).map(|c| c.node).collect()
        };
        let nodes = match self {
            NodeSubset::All => return Ok(positions.clone()),
            NodeSubset::EndNodes => arbor.find_end_nodes(),
            NodeSubset::BranchNodes => arbor.find_branch_nodes(),
            NodeSubset::InputSynapses => synapses(SynapseRelation::Input),
            NodeSubset::OutputSynapses => synapses(SynapseRelation::Output),
        };
        nodes
            .into_iter()
            .map(|n| position_of(positions, n).map(|v| (n, *v)))
            .collect()
    }
}

/// What each node contributes to its bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityWeight {
    #[default]
    Count,
    /// Length of the edge to the parent, booked entirely in the child's bin.
    Cable,
}

impl DensityWeight {
    pub fn weigh(&self, node: NodeId, arbor: &Arbor, positions: &Positions) -> Result<f64> {
        match self {
            DensityWeight::Count => Ok(1.0),
            DensityWeight::Cable => match arbor.parent(node) {
                None => Ok(0.0),
                Some(parent) => Ok(position_of(positions, node)?.distance_to(position_of(positions, parent)?)),
            },
        }
    }
}
