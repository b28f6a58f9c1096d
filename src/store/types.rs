use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Skeleton node id as handed out by the annotation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self { Self(id) }
}

/// Dense slot of a node inside one `Arbor`'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }

    #[inline]
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self { Self::new(v[0], v[1], v[2]) }
}

/// Node coordinates, kept outside the arbor so one topology can be measured
/// against several coordinate sources.
pub type Positions = HashMap<NodeId, Vec3>;

/// Direction of a synapse relative to the skeleton it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynapseRelation {
    /// Postsynaptic site: the skeleton receives.
    Input,
    /// Presynaptic site: the skeleton sends.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connector {
    pub node: NodeId,
    pub relation: SynapseRelation,
}

impl Connector {
    pub fn input(node: impl Into<NodeId>) -> Self {
        Self { node: node.into(), relation: SynapseRelation::Input }
    }

    pub fn output(node: impl Into<NodeId>) -> Self {
        Self { node: node.into(), relation: SynapseRelation::Output }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShollResult {
    /// Shell radii, ascending, starting at the radius increment.
    pub radius: Vec<f64>,
    /// Edges crossing each shell.
    pub crossings: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadialDensity {
    /// Inner boundary of every bin.
    pub bins: Vec<f64>,
    pub counts: Vec<f64>,
}
