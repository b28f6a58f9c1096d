//! Assembles per-skeleton series into a plot and exports it.
pub mod plot;

pub use plot::{series_to_csv, Extent, MorphologyPlot, NeuronNames, PlotSeries, SkeletonId};
