use crate::analysis::{self, CenterInput, CenterMode, CenterQuirks, AnalysisMode};
use crate::config::AnalysisConfig;
use crate::display::{MorphologyPlot, SkeletonId};
use crate::error::AnalysisError;
use crate::store::{distance_to_center, Arbor, CompactSkeleton, NodeId, Positions, Vec3};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

type Point = (f64, f64, f64);

impl From<AnalysisError> for PyErr {
    fn from(e: AnalysisError) -> Self { PyValueError::new_err(e.to_string()) }
}

fn point(p: Point) -> Vec3 { Vec3::new(p.0, p.1, p.2) }

fn to_positions(positions: HashMap<i64, Point>) -> Positions {
    positions.into_iter().map(|(id, p)| (NodeId(id), point(p))).collect()
}

fn to_arbor(rows: Vec<(i64, Option<i64>)>) -> PyResult<Arbor> {
    Ok(Arbor::from_rows(rows.into_iter().map(|(id, parent)| (NodeId(id), parent.map(NodeId))))?)
}

fn to_counts(counts: HashMap<i64, u32>) -> HashMap<NodeId, u32> {
    counts.into_iter().map(|(id, n)| (NodeId(id), n)).collect()
}

fn from_node_map(values: HashMap<NodeId, f64>) -> HashMap<i64, f64> {
    values.into_iter().map(|(id, v)| (id.0, v)).collect()
}

/// Labels of the analysis modes, in menu order.
#[pyfunction]
pub fn analysis_modes() -> Vec<String> {
    AnalysisMode::ALL.iter().map(AnalysisMode::name).collect()
}

/// Labels of the center modes, in menu order.
#[pyfunction]
pub fn center_modes() -> Vec<String> {
    CenterMode::ALL.iter().map(|m| m.name().to_string()).collect()
}

#[pyfunction]
pub fn betweenness_centrality(rows: Vec<(i64, Option<i64>)>, normalized: bool) -> PyResult<HashMap<i64, f64>> {
    let arbor = to_arbor(rows)?;
    Ok(from_node_map(analysis::betweenness_centrality(&arbor, normalized)))
}

#[pyfunction]
pub fn flow_centrality(
    rows: Vec<(i64, Option<i64>)>,
    inputs: HashMap<i64, u32>,
    outputs: HashMap<i64, u32>,
) -> PyResult<HashMap<i64, f64>> {
    let arbor = to_arbor(rows)?;
    let values = analysis::flow_centrality(&arbor, &to_counts(inputs), &to_counts(outputs));
    Ok(from_node_map(values))
}

/// Returns `(radius, crossings)`.
#[pyfunction]
pub fn sholl_analysis(
    rows: Vec<(i64, Option<i64>)>,
    positions: HashMap<i64, Point>,
    center: Point,
    radius_increment: f64,
) -> PyResult<(Vec<f64>, Vec<u32>)> {
    let arbor = to_arbor(rows)?;
    let positions = to_positions(positions);
    let center = point(center);
    let result = analysis::sholl(&arbor, radius_increment, |n| distance_to_center(n, &center, &positions))?;
    Ok((result.radius, result.crossings))
}

/// Returns `(bins, counts)`, counting every given position once.
#[pyfunction]
pub fn radial_density(positions: HashMap<i64, Point>, center: Point, radius_increment: f64) -> PyResult<(Vec<f64>, Vec<f64>)> {
    let positions = to_positions(positions);
    let result = analysis::radial_density(&point(center), radius_increment, &positions, |_| Ok(1.0))?;
    Ok((result.bins, result.counts))
}

#[pyfunction]
#[pyo3(signature = (skeleton_json, center_mode, active_node=None, quirks_json=None))]
pub fn compute_center(
    skeleton_json: &str,
    center_mode: &str,
    active_node: Option<Point>,
    quirks_json: Option<&str>,
) -> PyResult<Point> {
    let skeleton = CompactSkeleton::from_json(skeleton_json)?;
    let mode: CenterMode = center_mode.parse()?;
    let quirks: CenterQuirks = match quirks_json {
        Some(json) => serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("quirks: {}", e)))?,
        None => CenterQuirks::default(),
    };

    let arbor = skeleton.arbor()?;
    let positions = skeleton.positions();
    let mut input = CenterInput::new(&arbor, &positions).with_connectors(&skeleton.connectors);
    if let Some(p) = active_node {
        input = input.with_active_node(point(p));
    }
    let c = analysis::compute_center(mode, &input, &quirks)?;
    Ok((c.x, c.y, c.z))
}

/// Returns the `(x, y)` series of one skeleton.
#[pyfunction]
#[pyo3(signature = (skeleton_json, config_json=None, active_node=None))]
pub fn analyze_skeleton(
    skeleton_json: &str,
    config_json: Option<&str>,
    active_node: Option<Point>,
) -> PyResult<(Vec<f64>, Vec<f64>)> {
    let skeleton = CompactSkeleton::from_json(skeleton_json)?;
    let config = config_json.map(AnalysisConfig::from_json).transpose()?.unwrap_or_default();
    let series = analysis::analyze_skeleton(&skeleton, &config, active_node.map(point))?;
    Ok((series.x, series.y))
}

#[pyclass(name = "_MorphologyPlot")]
#[derive(Debug, Clone, Default)]
pub struct PyMorphologyPlot {
    inner: MorphologyPlot,
}

#[pymethods]
impl PyMorphologyPlot {
    #[new]
    #[pyo3(signature = (config_json=None))]
    pub fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = config_json.map(AnalysisConfig::from_json).transpose()?.unwrap_or_default();
        Ok(Self { inner: MorphologyPlot::new(config)? })
    }

    pub fn config_json(&self) -> PyResult<String> { Ok(self.inner.config().to_json()?) }

    pub fn set_config(&mut self, config_json: &str) -> PyResult<()> {
        Ok(self.inner.set_config(AnalysisConfig::from_json(config_json)?)?)
    }

    pub fn append(&mut self, skeleton_id: i64, skeleton_json: &str) -> PyResult<()> {
        let skeleton = CompactSkeleton::from_json(skeleton_json)?;
        self.inner.append(SkeletonId(skeleton_id), skeleton);
        Ok(())
    }

    pub fn remove(&mut self, skeleton_id: i64) { self.inner.remove(SkeletonId(skeleton_id)) }

    pub fn clear(&mut self) { self.inner.clear() }

    #[pyo3(signature = (active_node=None))]
    pub fn populate(&mut self, active_node: Option<Point>) -> PyResult<()> {
        Ok(self.inner.populate(active_node.map(point))?)
    }

    /// `[(skeleton_id, x, y), ...]`, ascending by skeleton id.
    pub fn series(&self) -> Vec<(i64, Vec<f64>, Vec<f64>)> {
        self.inner.series().into_iter().map(|s| (s.skeleton_id.0, s.x, s.y)).collect()
    }

    #[pyo3(signature = (names=None))]
    pub fn to_csv(&self, names: Option<HashMap<i64, String>>) -> Option<String> {
        let names: HashMap<SkeletonId, String> = names
            .unwrap_or_default()
            .into_iter()
            .map(|(id, name)| (SkeletonId(id), name))
            .collect();
        self.inner.to_csv(&names)
    }
}
