//! Data model of one skeleton: node ids, the rooted arbor, coordinates and synapses.
pub mod arbor;
pub mod skeleton;
pub mod types;

// Re-export key types for convenient access
pub use arbor::{distance_to_center, Arbor};
pub use skeleton::{CompactSkeleton, NodeRow};
pub use types::{Connector, NodeId, NodeIndex, Positions, RadialDensity, ShollResult, SynapseRelation, Vec3};
