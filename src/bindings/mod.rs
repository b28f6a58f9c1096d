//! Python-facing wrappers of the analysis API.
pub mod python;
