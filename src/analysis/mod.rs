//! Centrality, center selection and the radial metrics built on top of an `Arbor`.
pub mod center;
pub mod centrality;
pub mod pipeline;
pub mod radial;

pub use center::{compute_center, CenterInput, CenterMode, CenterQuirks, TieBreak};
pub use centrality::{betweenness_centrality, flow_centrality, SynapseCounts};
pub use pipeline::{analyze, analyze_skeleton, AnalysisMode, Series};
pub use radial::{radial_density, sholl, DensityWeight, NodeSubset};
