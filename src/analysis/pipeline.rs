//! From one skeleton to one `(x, y)` series: pick a center, then run the
//! selected radial metric around it.

use super::center::{compute_center, CenterInput};
use super::radial::{radial_density, sholl, DensityWeight, NodeSubset};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::store::{distance_to_center, Arbor, CompactSkeleton, Connector, Positions, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// What a morphology plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnalysisMode {
    Sholl,
    RadialDensity { subset: NodeSubset, weight: DensityWeight },
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 7] = [
        AnalysisMode::Sholl,
        AnalysisMode::RadialDensity { subset: NodeSubset::All, weight: DensityWeight::Count },
        AnalysisMode::RadialDensity { subset: NodeSubset::All, weight: DensityWeight::Cable },
        AnalysisMode::RadialDensity { subset: NodeSubset::EndNodes, weight: DensityWeight::Count },
        AnalysisMode::RadialDensity { subset: NodeSubset::BranchNodes, weight: DensityWeight::Count },
        AnalysisMode::RadialDensity { subset: NodeSubset::InputSynapses, weight: DensityWeight::Count },
        AnalysisMode::RadialDensity { subset: NodeSubset::OutputSynapses, weight: DensityWeight::Count },
    ];

    /// Label used in the mode menu and as the first CSV header cell.
    pub fn name(&self) -> String {
        match self {
            AnalysisMode::Sholl => "Sholl analysis".to_string(),
            AnalysisMode::RadialDensity { subset, weight } => {
                let mut name = String::from("Radial density");
                if *weight == DensityWeight::Cable {
                    name.push_str(" of cable");
                }
                match subset {
                    NodeSubset::All => {}
                    NodeSubset::EndNodes => name.push_str(" of ends"),
                    NodeSubset::BranchNodes => name.push_str(" of branch nodes"),
                    NodeSubset::InputSynapses => name.push_str(" of input synapses"),
                    NodeSubset::OutputSynapses => name.push_str(" of output synapses"),
                }
                name
            }
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.name()) }
}

impl FromStr for AnalysisMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || AnalysisError::InvalidParameter(format!("unknown analysis mode '{}'", s));
        let s = s.trim();
        if s == "Sholl analysis" {
            return Ok(AnalysisMode::Sholl);
        }
        let rest = s.strip_prefix("Radial density").ok_or_else(unknown)?;
        let (weight, rest) = match rest.strip_prefix(" of cable") {
            Some(rest) => (DensityWeight::Cable, rest),
            None => (DensityWeight::Count, rest),
        };
        let subset = match rest {
            "" => NodeSubset::All,
            " of ends" => NodeSubset::EndNodes,
            " of branch nodes" => NodeSubset::BranchNodes,
            " of input synapses" => NodeSubset::InputSynapses,
            " of output synapses" => NodeSubset::OutputSynapses,
            _ => return Err(unknown()),
        };
        Ok(AnalysisMode::RadialDensity { subset, weight })
    }
}

impl TryFrom<String> for AnalysisMode {
    type Error = AnalysisError;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<AnalysisMode> for String {
    fn from(mode: AnalysisMode) -> Self { mode.name() }
}

/// One chart line before it is attached to a skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[instrument(skip_all, level = "debug", fields(mode = %config.mode, nodes = skeleton.nodes.len()))]
pub fn analyze_skeleton(
    skeleton: &CompactSkeleton,
    config: &AnalysisConfig,
    active_node: Option<Vec3>,
) -> Result<Series> {
    let arbor = skeleton.arbor()?;
    let positions = skeleton.positions();
    analyze(&arbor, &positions, &skeleton.connectors, config, active_node)
}

pub fn analyze(
    arbor: &Arbor,
    positions: &Positions,
    connectors: &[Connector],
    config: &AnalysisConfig,
    active_node: Option<Vec3>,
) -> Result<Series> {
    config.validate()?;

    let mut input = CenterInput::new(arbor, positions).with_connectors(connectors);
    if let Some(p) = active_node {
        input = input.with_active_node(p);
    }
    let center = compute_center(config.center_mode, &input, &config.quirks)?;
    let inc = config.radius_increment;

    let series = match config.mode {
        AnalysisMode::Sholl => {
            let s = sholl(arbor, inc, |n| distance_to_center(n, &center, positions))?;
            Series { x: s.radius, y: s.crossings.into_iter().map(f64::from).collect() }
        }
        AnalysisMode::RadialDensity { subset, weight } => {
            let subset = subset.select(arbor, positions, connectors)?;
            let d = radial_density(&center, inc, &subset, |n| weight.weigh(n, arbor, positions))?;
            Series { x: d.bins, y: d.counts }
        }
    };

    debug!(points = series.x.len(), "Series computed");
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::center::CenterMode;
    use rstest::rstest;

    const SKELETON: &str = r#"{
        "nodes": [
            [1, null, 0, 0, 0, 0],
            [2, 1, 0, 10, 0, 0],
            [3, 2, 0, 20, 0, 0],
            [4, 3, 0, 30, 0, 0],
            [5, 3, 0, 20, 15, 0]
        ],
        "connectors": [[4, 100, 1], [5, 101, 0]]
    }"#;

    fn config(mode: &str) -> AnalysisConfig {
        AnalysisConfig {
            mode: mode.parse().unwrap(),
            center_mode: CenterMode::RootNode,
            radius_increment: 10.0,
            ..Default::default()
        }
    }

    #[rstest]
    // Distances from the root: 0, 10, 20, 30 along the chain, 25 for node 5.
    #[case("Sholl analysis", vec![10.0, 20.0, 30.0], vec![1.0, 1.0, 1.0])]
    #[case("Radial density", vec![0.0, 10.0, 20.0, 30.0], vec![1.0, 1.0, 2.0, 1.0])]
    #[case("Radial density of cable", vec![0.0, 10.0, 20.0, 30.0], vec![0.0, 10.0, 25.0, 10.0])]
    #[case("Radial density of ends", vec![0.0, 10.0, 20.0, 30.0], vec![0.0, 0.0, 1.0, 1.0])]
    #[case("Radial density of branch nodes", vec![0.0, 10.0, 20.0], vec![0.0, 0.0, 1.0])]
    #[case("Radial density of input synapses", vec![0.0, 10.0, 20.0, 30.0], vec![0.0, 0.0, 0.0, 1.0])]
    #[case("Radial density of output synapses", vec![0.0, 10.0, 20.0], vec![0.0, 0.0, 1.0])]
    fn test_modes(#[case] mode: &str, #[case] x: Vec<f64>, #[case] y: Vec<f64>) {
        let skeleton = CompactSkeleton::from_json(SKELETON).unwrap();
        let series = analyze_skeleton(&skeleton, &config(mode), None).unwrap();
        assert_eq!(series, Series { x, y });
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in AnalysisMode::ALL {
            assert_eq!(mode.name().parse::<AnalysisMode>().unwrap(), mode);
        }
        assert!("Sholl".parse::<AnalysisMode>().is_err());
        assert!("Radial density of spines".parse::<AnalysisMode>().is_err());

        let cable_ends = AnalysisMode::RadialDensity { subset: NodeSubset::EndNodes, weight: DensityWeight::Cable };
        assert_eq!(cable_ends.name(), "Radial density of cable of ends");
        assert_eq!(cable_ends.name().parse::<AnalysisMode>().unwrap(), cable_ends);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_work() {
        let skeleton = CompactSkeleton::from_json(SKELETON).unwrap();
        let mut cfg = config("Sholl analysis");
        cfg.radius_increment = 0.0;
        assert!(matches!(
            analyze_skeleton(&skeleton, &cfg, None),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_active_node_center() {
        let skeleton = CompactSkeleton::from_json(SKELETON).unwrap();
        let mut cfg = config("Radial density of ends");
        cfg.center_mode = CenterMode::ActiveNode;
        // End 4 sits on the center, end 5 is ~18 away.
        let series = analyze_skeleton(&skeleton, &cfg, Some(Vec3::new(30.0, 0.0, 0.0))).unwrap();
        assert_eq!(series.y, vec![1.0, 1.0]);
        assert!(analyze_skeleton(&skeleton, &cfg, None).is_err());
    }
}
