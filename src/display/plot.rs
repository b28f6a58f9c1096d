//! plot.rs
//! Per-skeleton series of a morphology plot, and their CSV export.

use crate::analysis::pipeline::{analyze_skeleton, Series};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::store::{CompactSkeleton, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkeletonId(pub i64);

impl fmt::Display for SkeletonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display names of neurons, provided by the naming service of the host application.
pub trait NeuronNames {
    fn name(&self, skeleton_id: SkeletonId) -> String;
}

impl NeuronNames for HashMap<SkeletonId, String> {
    fn name(&self, skeleton_id: SkeletonId) -> String {
        self.get(&skeleton_id)
            .cloned()
            .unwrap_or_else(|| skeleton_id.to_string())
    }
}

impl<F> NeuronNames for F
where
    F: Fn(SkeletonId) -> String,
{
    fn name(&self, skeleton_id: SkeletonId) -> String { self(skeleton_id) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub skeleton_id: SkeletonId,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Smallest box holding every point of every series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Skeletons shown in one plot, with the series computed for each.
#[derive(Debug, Clone, Default)]
pub struct MorphologyPlot {
    config: AnalysisConfig,
    skeletons: BTreeMap<SkeletonId, CompactSkeleton>,
    lines: BTreeMap<SkeletonId, Series>,
}

impl MorphologyPlot {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ..Default::default() })
    }

    pub fn config(&self) -> &AnalysisConfig { &self.config }

    /// Replaces the settings; existing series are dropped until the next `populate`.
    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.lines.clear();
        Ok(())
    }

    pub fn append(&mut self, skeleton_id: SkeletonId, skeleton: CompactSkeleton) {
        self.lines.remove(&skeleton_id);
        self.skeletons.insert(skeleton_id, skeleton);
    }

    /// Removes a skeleton; unknown ids are ignored.
    pub fn remove(&mut self, skeleton_id: SkeletonId) {
        self.skeletons.remove(&skeleton_id);
        self.lines.remove(&skeleton_id);
    }

    pub fn clear(&mut self) {
        self.skeletons.clear();
        self.lines.clear();
    }

    pub fn has_skeleton(&self, skeleton_id: SkeletonId) -> bool { self.skeletons.contains_key(&skeleton_id) }

    /// Recomputes the series of every skeleton, each in its own task.
    ///
    /// The first failing skeleton aborts the update and leaves the previous
    /// series in place.
    pub fn populate(&mut self, active_node: Option<Vec3>) -> Result<()> {
        let config = &self.config;
        let lines = self
            .skeletons
            .par_iter()
            .map(|(&id, skeleton)| {
                analyze_skeleton(skeleton, config, active_node)
                    .map(|series| (id, series))
                    .inspect_err(|e| warn!(skeleton = %id, error = %e, "Analysis failed"))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        info!(skeletons = lines.len(), mode = %self.config.mode, "Morphology plot populated");
        self.lines = lines;
        Ok(())
    }

    /// Computed series, ascending by skeleton id.
    pub fn series(&self) -> Vec<PlotSeries> {
        self.lines
            .iter()
            .map(|(&skeleton_id, s)| PlotSeries { skeleton_id, x: s.x.clone(), y: s.y.clone() })
            .collect()
    }

    pub fn extent(&self) -> Option<Extent> {
        let mut points = self.lines.values().flat_map(|s| s.x.iter().zip(&s.y));
        let (&x, &y) = points.next()?;
        let start = Extent { x_min: x, x_max: x, y_min: y, y_max: y };
        Some(points.fold(start, |e, (&x, &y)| Extent {
            x_min: e.x_min.min(x),
            x_max: e.x_max.max(x),
            y_min: e.y_min.min(y),
            y_max: e.y_max.max(y),
        }))
    }

    /// CSV of all series, or `None` when nothing has been computed.
    pub fn to_csv(&self, names: &impl NeuronNames) -> Option<String> {
        series_to_csv(&self.config.mode.name(), &self.series(), names)
    }
}

/// Header `<mode>,x0,...,xN` over the sorted union of all x values, then one
/// row `name,y(x0),...` per series with 0 wherever a series has no such x.
pub fn series_to_csv(mode: &str, series: &[PlotSeries], names: &impl NeuronNames) -> Option<String> {
    if series.is_empty() {
        return None;
    }

    let mut axis: Vec<f64> = series.iter().flat_map(|s| s.x.iter().copied()).collect();
    axis.sort_by(f64::total_cmp);
    axis.dedup();

    let header = std::iter::once(mode.to_string()).chain(axis.iter().map(f64::to_string));
    let mut rows = vec![header.collect::<Vec<_>>().join(",")];

    for s in series {
        let values: HashMap<u64, f64> = s.x.iter().zip(&s.y).map(|(x, &y)| (x.to_bits(), y)).collect();
        let cells = axis
            .iter()
            .map(|x| values.get(&x.to_bits()).copied().unwrap_or(0.0).to_string());
        let row = std::iter::once(names.name(s.skeleton_id)).chain(cells);
        rows.push(row.collect::<Vec<_>>().join(","));
    }
    Some(rows.join("\n"))
}
