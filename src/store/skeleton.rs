//! Compact skeleton rows as delivered by the annotation backend.
//!
//! Node rows are `[id, parent|null, user, x, y, z, ...]` and connector rows
//! are `[node, connector, relation, ...]` where relation `0` is presynaptic
//! (an output of the skeleton) and `1` is postsynaptic (an input).
//! Trailing columns are ignored.

use super::arbor::Arbor;
use super::types::{Connector, NodeId, Positions, SynapseRelation, Vec3};
use crate::error::{AnalysisError, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub position: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactSkeleton {
    pub nodes: Vec<NodeRow>,
    pub connectors: Vec<Connector>,
}

#[derive(Deserialize)]
struct RawSkeleton {
    nodes: Vec<Vec<Value>>,
    #[serde(default)]
    connectors: Vec<Vec<Value>>,
}

impl CompactSkeleton {
    /// Parses `{"nodes": [...], "connectors": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSkeleton = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidParameter(format!("compact skeleton: {}", e)))?;

        let nodes = raw
            .nodes
            .iter()
            .enumerate()
            .map(|(i, row)| parse_node_row(i, row))
            .collect::<Result<Vec<_>>>()?;
        let connectors = raw
            .connectors
            .iter()
            .enumerate()
            .map(|(i, row)| parse_connector_row(i, row))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { nodes, connectors })
    }

    pub fn arbor(&self) -> Result<Arbor> {
        Arbor::from_rows(self.nodes.iter().map(|row| (row.id, row.parent)))
    }

    pub fn positions(&self) -> Positions {
        self.nodes.iter().map(|row| (row.id, row.position)).collect()
    }
}

fn parse_node_row(i: usize, row: &[Value]) -> Result<NodeRow> {
    if row.len() < 6 {
        return Err(row_error("node", i, "expected at least 6 columns"));
    }
    let id = NodeId(int_at(row, 0).ok_or_else(|| row_error("node", i, "id is not an integer"))?);
    let parent = match &row[1] {
        Value::Null => None,
        v => Some(NodeId(v.as_i64().ok_or_else(|| row_error("node", i, "parent is not an integer"))?)),
    };
    let coord = |col: usize| float_at(row, col).ok_or_else(|| row_error("node", i, "coordinate is not a number"));
    let position = Vec3::new(coord(3)?, coord(4)?, coord(5)?);
    Ok(NodeRow { id, parent, position })
}

fn parse_connector_row(i: usize, row: &[Value]) -> Result<Connector> {
    if row.len() < 3 {
        return Err(row_error("connector", i, "expected at least 3 columns"));
    }
    let node = NodeId(int_at(row, 0).ok_or_else(|| row_error("connector", i, "node is not an integer"))?);
    let relation = match int_at(row, 2) {
        Some(0) => SynapseRelation::Output,
        Some(1) => SynapseRelation::Input,
        _ => return Err(row_error("connector", i, "relation must be 0 or 1")),
    };
    Ok(Connector { node, relation })
}

fn int_at(row: &[Value], col: usize) -> Option<i64> { row.get(col)?.as_i64() }

fn float_at(row: &[Value], col: usize) -> Option<f64> { row.get(col)?.as_f64() }

fn row_error(kind: &str, i: usize, msg: &str) -> AnalysisError {
    AnalysisError::InvalidParameter(format!("{} row {}: {}", kind, i, msg))
}
