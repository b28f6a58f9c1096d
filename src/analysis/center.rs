//! Strategies that reduce one arbor to a single reference point.
//!
//! Every strategy is a variant of the closed `CenterMode` enum and is
//! dispatched by `compute_center`. Alternative readings of three of them
//! are switched by `CenterQuirks`.

use super::centrality::{betweenness_by_index, flow_by_index, SynapseCounts};
use crate::error::{AnalysisError, Result};
use crate::store::arbor::position_of;
use crate::store::{Arbor, Connector, NodeIndex, Positions, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CenterMode {
    RootNode,
    /// The node focused in the tracing view, supplied by the caller.
    ActiveNode,
    FirstBranchNode,
    BoundingBoxCenter,
    AverageNodePosition,
    HighestCentrality,
    HighestFlowCentrality,
}

impl CenterMode {
    pub const ALL: [CenterMode; 7] = [
        CenterMode::RootNode,
        CenterMode::ActiveNode,
        CenterMode::FirstBranchNode,
        CenterMode::BoundingBoxCenter,
        CenterMode::AverageNodePosition,
        CenterMode::HighestCentrality,
        CenterMode::HighestFlowCentrality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CenterMode::RootNode => "Root node",
            CenterMode::ActiveNode => "Active node",
            CenterMode::FirstBranchNode => "First branch node",
            CenterMode::BoundingBoxCenter => "Bounding box center",
            CenterMode::AverageNodePosition => "Average node position",
            CenterMode::HighestCentrality => "Highest centrality node",
            CenterMode::HighestFlowCentrality => "Highest signal flow centrality",
        }
    }
}

impl fmt::Display for CenterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for CenterMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == s.trim())
            .ok_or_else(|| AnalysisError::InvalidParameter(format!("unknown center mode '{}'", s)))
    }
}

impl TryFrom<String> for CenterMode {
    type Error = AnalysisError;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<CenterMode> for String {
    fn from(mode: CenterMode) -> Self { mode.name().to_string() }
}

/// Which of several flow-centrality ties becomes the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Highest betweenness among the tied nodes.
    #[default]
    MostCentral,
    /// Lowest betweenness among the tied nodes.
    LeastCentral,
}

/// Variants of the box, centrality and flow strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterQuirks {
    /// Report `(max - min) / 2` per axis, with maxima starting at 0,
    /// instead of the geometric box center.
    pub extent_box_center: bool,
    /// Pick the node ranked `floor(n/2)` by ascending centrality instead of the maximum.
    pub median_centrality: bool,
    pub flow_tie_break: TieBreak,
}

impl Default for CenterQuirks {
    fn default() -> Self {
        Self {
            extent_box_center: false,
            median_centrality: true,
            flow_tie_break: TieBreak::MostCentral,
        }
    }
}

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct CenterInput<'a> {
    pub arbor: &'a Arbor,
    pub positions: &'a Positions,
    pub connectors: &'a [Connector],
    pub active_node: Option<Vec3>,
}

impl<'a> CenterInput<'a> {
    pub fn new(arbor: &'a Arbor, positions: &'a Positions) -> Self {
        Self { arbor, positions, connectors: &[], active_node: None }
    }

    pub fn with_connectors(mut self, connectors: &'a [Connector]) -> Self {
        self.connectors = connectors;
        self
    }

    pub fn with_active_node(mut self, position: Vec3) -> Self {
        self.active_node = Some(position);
        self
    }
}

pub fn compute_center(mode: CenterMode, input: &CenterInput<'_>, quirks: &CenterQuirks) -> Result<Vec3> {
    let center = match mode {
        CenterMode::RootNode => {
            let root = root_index(input.arbor)?;
            *position_of(input.positions, input.arbor.node_id(root))?
        }
        CenterMode::ActiveNode => input
            .active_node
            .ok_or_else(|| AnalysisError::InvalidParameter("no active node position supplied".into()))?,
        CenterMode::FirstBranchNode => {
            let root = input.arbor.node_id(root_index(input.arbor)?);
            let node = input.arbor.next_branch_node(root).unwrap_or(root);
            *position_of(input.positions, node)?
        }
        CenterMode::BoundingBoxCenter => bounding_box_center(input.positions, quirks.extent_box_center)?,
        CenterMode::AverageNodePosition => average_position(input.positions)?,
        CenterMode::HighestCentrality => {
            let values = betweenness_by_index(input.arbor, false);
            let node = select_ranked(input.arbor, &values, quirks.median_centrality)?;
            *position_of(input.positions, input.arbor.node_id(node))?
        }
        CenterMode::HighestFlowCentrality => {
            let node = highest_flow_node(input.arbor, input.connectors, quirks)?;
            *position_of(input.positions, input.arbor.node_id(node))?
        }
    };

    debug!(mode = %mode, x = center.x, y = center.y, z = center.z, "Center selected");
    Ok(center)
}

fn root_index(arbor: &Arbor) -> Result<NodeIndex> {
    arbor
        .root_index()
        .ok_or_else(|| AnalysisError::EmptyInput("arbor has no nodes".into()))
}

fn bounding_box_center(positions: &Positions, extent: bool) -> Result<Vec3> {
    if positions.is_empty() {
        return Err(AnalysisError::EmptyInput("bounding box over no positions".into()));
    }
    let floor = if extent { 0.0 } else { f64::NEG_INFINITY };
    let mut min = Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
    let mut max = Vec3::new(floor, floor, floor);
    for v in positions.values() {
        min = Vec3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z));
        max = Vec3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z));
    }

    let half = |lo: f64, hi: f64| if extent { (hi - lo) / 2.0 } else { lo + (hi - lo) / 2.0 };
    Ok(Vec3::new(half(min.x, max.x), half(min.y, max.y), half(min.z, max.z)))
}

fn average_position(positions: &Positions) -> Result<Vec3> {
    if positions.is_empty() {
        return Err(AnalysisError::EmptyInput("average over no positions".into()));
    }
    let n = positions.len() as f64;
    let sum = positions.values().fold(Vec3::default(), |acc, v| {
        Vec3::new(acc.x + v.x, acc.y + v.y, acc.z + v.z)
    });
    Ok(Vec3::new(sum.x / n, sum.y / n, sum.z / n))
}

/// Slots ordered by ascending value, ties by ascending node id.
fn rank(arbor: &Arbor, values: &[f64]) -> Vec<NodeIndex> {
    let mut ranked: Vec<NodeIndex> = (0..values.len()).map(NodeIndex::new).collect();
    ranked.sort_by(|a, b| {
        values[a.index()]
            .total_cmp(&values[b.index()])
            .then_with(|| arbor.node_id(*a).cmp(&arbor.node_id(*b)))
    });
    ranked
}

/// The median-ranked slot, or the highest-valued one (lowest id on ties).
fn select_ranked(arbor: &Arbor, values: &[f64], median: bool) -> Result<NodeIndex> {
    let ranked = rank(arbor, values);
    let Some(&last) = ranked.last() else {
        return Err(AnalysisError::EmptyInput("no nodes to rank by centrality".into()));
    };
    if median {
        return Ok(ranked[ranked.len() / 2]);
    }
    let top = values[last.index()];
    Ok(ranked
        .iter()
        .copied()
        .find(|n| values[n.index()] == top)
        .unwrap_or(last))
}

fn highest_flow_node(arbor: &Arbor, connectors: &[Connector], quirks: &CenterQuirks) -> Result<NodeIndex> {
    let counts = SynapseCounts::from_connectors(connectors);
    let flow = flow_by_index(arbor, &counts.inputs, &counts.outputs);
    let selected = select_ranked(arbor, &flow, quirks.median_centrality)?;

    let value = flow[selected.index()];
    let tied: Vec<NodeIndex> = rank(arbor, &flow)
        .into_iter()
        .filter(|n| flow[n.index()] == value)
        .collect();
    if tied.len() < 2 {
        return Ok(selected);
    }

    // Settle the tie on betweenness; `tied` is in ascending id order, so
    // `min_by`/`max_by` keep the lowest id among equals.
    let bc = betweenness_by_index(arbor, false);
    let by_bc = |a: &NodeIndex, b: &NodeIndex| bc[a.index()].total_cmp(&bc[b.index()]);
    let pick = match quirks.flow_tie_break {
        TieBreak::MostCentral => tied.iter().copied().rev().max_by(by_bc),
        TieBreak::LeastCentral => tied.iter().copied().min_by(by_bc),
    };
    debug!(tied = tied.len(), tie_break = ?quirks.flow_tie_break, "Flow centrality tie settled");
    Ok(pick.unwrap_or(selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::arbor::tests::arbor;
    use crate::store::NodeId;
    use rstest::rstest;

    //  1 (0,0,0) - 2 (10,0,0) - 3 (20,0,0) -+- 4 (30, 10, 0)
    //                                       +- 5 (30,-10, 0)
    fn fixture() -> (Arbor, Positions, Vec<Connector>) {
        let a = arbor(&[(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3)), (5, Some(3))]);
        let positions: Positions = [
            (1, [0.0, 0.0, 0.0]),
            (2, [10.0, 0.0, 0.0]),
            (3, [20.0, 0.0, 0.0]),
            (4, [30.0, 10.0, 0.0]),
            (5, [30.0, -10.0, 0.0]),
        ]
        .into_iter()
        .map(|(id, v)| (NodeId(id), Vec3::from(v)))
        .collect();
        let connectors = vec![Connector::input(1), Connector::input(1), Connector::output(4), Connector::output(5)];
        (a, positions, connectors)
    }

    fn center(mode: CenterMode, quirks: CenterQuirks) -> Result<Vec3> {
        let (a, positions, connectors) = fixture();
        let input = CenterInput::new(&a, &positions)
            .with_connectors(&connectors)
            .with_active_node(Vec3::new(1.0, 2.0, 3.0));
        compute_center(mode, &input, &quirks)
    }

    #[rstest]
    #[case(CenterMode::RootNode, [0.0, 0.0, 0.0])]
    #[case(CenterMode::ActiveNode, [1.0, 2.0, 3.0])]
    #[case(CenterMode::FirstBranchNode, [20.0, 0.0, 0.0])]
    #[case(CenterMode::BoundingBoxCenter, [15.0, 0.0, 0.0])]
    #[case(CenterMode::AverageNodePosition, [18.0, 0.0, 0.0])]
    // Betweenness ranks 1, 4, 5 (0), 2 (3), 3 (5); floor(5/2) picks node 5.
    #[case(CenterMode::HighestCentrality, [30.0, -10.0, 0.0])]
    // Flow ranks 1, 4, 5 (0), 2, 3 (2); node 5 ties with 1 and 4, all with betweenness 0.
    #[case(CenterMode::HighestFlowCentrality, [0.0, 0.0, 0.0])]
    fn test_default_quirks(#[case] mode: CenterMode, #[case] expected: [f64; 3]) {
        assert_eq!(center(mode, CenterQuirks::default()).unwrap(), Vec3::from(expected));
    }

    #[test]
    fn test_extent_box_center_uses_half_extent() {
        let quirks = CenterQuirks { extent_box_center: true, ..Default::default() };
        // y: max starts at 0 -> (10 - -10) / 2
        assert_eq!(center(CenterMode::BoundingBoxCenter, quirks).unwrap(), Vec3::new(15.0, 10.0, 0.0));
    }

    #[test]
    fn test_maximum_centrality() {
        let quirks = CenterQuirks { median_centrality: false, ..Default::default() };
        assert_eq!(center(CenterMode::HighestCentrality, quirks).unwrap(), Vec3::new(20.0, 0.0, 0.0));
    }

    #[rstest]
    #[case(TieBreak::MostCentral, [20.0, 0.0, 0.0])] // node 3, betweenness 5
    #[case(TieBreak::LeastCentral, [10.0, 0.0, 0.0])] // node 2, betweenness 3
    fn test_flow_tie_break(#[case] tie_break: TieBreak, #[case] expected: [f64; 3]) {
        let quirks = CenterQuirks { median_centrality: false, flow_tie_break: tie_break, ..Default::default() };
        assert_eq!(center(CenterMode::HighestFlowCentrality, quirks).unwrap(), Vec3::from(expected));
    }

    #[test]
    fn test_first_branch_node_falls_back_to_root() {
        let a = arbor(&[(1, None), (2, Some(1))]);
        let positions: Positions = [(NodeId(1), Vec3::new(5.0, 5.0, 5.0)), (NodeId(2), Vec3::default())].into();
        let c = compute_center(CenterMode::FirstBranchNode, &CenterInput::new(&a, &positions), &CenterQuirks::default());
        assert_eq!(c.unwrap(), Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_errors() {
        let (a, mut positions, _) = fixture();
        positions.remove(&NodeId(1));
        let quirks = CenterQuirks::default();

        let input = CenterInput::new(&a, &positions);
        assert_eq!(
            compute_center(CenterMode::RootNode, &input, &quirks),
            Err(AnalysisError::MissingPosition { node: NodeId(1) })
        );
        assert!(matches!(
            compute_center(CenterMode::ActiveNode, &input, &quirks),
            Err(AnalysisError::InvalidParameter(_))
        ));

        let empty = Arbor::new();
        let none = Positions::new();
        let input = CenterInput::new(&empty, &none);
        for mode in CenterMode::ALL.into_iter().filter(|m| *m != CenterMode::ActiveNode) {
            assert!(
                matches!(compute_center(mode, &input, &quirks), Err(AnalysisError::EmptyInput(_))),
                "{}",
                mode
            );
        }
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in CenterMode::ALL {
            assert_eq!(mode.name().parse::<CenterMode>().unwrap(), mode);
        }
        assert!(matches!("Centre".parse::<CenterMode>(), Err(AnalysisError::InvalidParameter(_))));
    }
}
