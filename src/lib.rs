// FFI Facade: The main entry point for Python.
// This file uses `pyo3` to define the `_core` Python
// module and expose the arbor analyses as Python functions and objects.

pub mod analysis;
pub mod bindings;
pub mod config;
pub mod display;
pub mod error;
pub mod store;

pub use analysis::{AnalysisMode, CenterMode, CenterQuirks, Series};
pub use config::AnalysisConfig;
pub use display::{MorphologyPlot, SkeletonId};
pub use error::{AnalysisError, Result};
pub use store::{Arbor, CompactSkeleton, NodeId, Vec3};

use bindings::python;
use pyo3::prelude::*;

/// Version of the compiled core, to confirm the bridge is callable from Python.
#[pyfunction]
fn rust_core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// --- Module Definition ---
/// Defines the `arbor._core` Python module.
#[pymodule]
fn _core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rust_core_version, m)?)?;
    m.add_function(wrap_pyfunction!(python::analysis_modes, m)?)?;
    m.add_function(wrap_pyfunction!(python::center_modes, m)?)?;
    m.add_function(wrap_pyfunction!(python::betweenness_centrality, m)?)?;
    m.add_function(wrap_pyfunction!(python::flow_centrality, m)?)?;
    m.add_function(wrap_pyfunction!(python::sholl_analysis, m)?)?;
    m.add_function(wrap_pyfunction!(python::radial_density, m)?)?;
    m.add_function(wrap_pyfunction!(python::compute_center, m)?)?;
    m.add_function(wrap_pyfunction!(python::analyze_skeleton, m)?)?;
    m.add_class::<python::PyMorphologyPlot>()?;
    Ok(())
}
