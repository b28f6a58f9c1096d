//! Settings of one morphology plot: what to compute, around which center,
//! and at which step.

use crate::analysis::center::{CenterMode, CenterQuirks};
use crate::analysis::pipeline::AnalysisMode;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shell width used when a config does not name one, in nanometers.
pub const DEFAULT_RADIUS_INCREMENT: f64 = 1000.0;

/// Configuration of a morphology analysis.
///
/// Every field has a default, so a config file only needs to name what it
/// changes, e.g. `{"mode": "Radial density of ends", "radius_increment": 500}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    pub center_mode: CenterMode,
    /// Shell width; must be positive and finite.
    pub radius_increment: f64,
    pub quirks: CenterQuirks,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Sholl,
            center_mode: CenterMode::RootNode,
            radius_increment: DEFAULT_RADIUS_INCREMENT,
            quirks: CenterQuirks::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidParameter(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidParameter(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::InvalidParameter(format!("config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius_increment.is_finite() && self.radius_increment > 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "radius increment must be a positive number, got {}",
                self.radius_increment
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::center::TieBreak;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let c = AnalysisConfig::from_json(r#"{"mode": "Radial density of ends"}"#).unwrap();
        assert_eq!(c.mode.name(), "Radial density of ends");
        assert_eq!(c.center_mode, CenterMode::RootNode);
        assert_eq!(c.radius_increment, DEFAULT_RADIUS_INCREMENT);
        assert_eq!(c.quirks, CenterQuirks::default());
    }

    #[test]
    fn test_full_config() {
        let c = AnalysisConfig::from_json(
            r#"{
                "mode": "Sholl analysis",
                "center_mode": "Highest signal flow centrality",
                "radius_increment": 250.5,
                "quirks": {"extent_box_center": true, "flow_tie_break": "least_central"}
            }"#,
        )
        .unwrap();
        assert_eq!(c.center_mode, CenterMode::HighestFlowCentrality);
        assert_eq!(c.radius_increment, 250.5);
        assert!(c.quirks.extent_box_center);
        assert!(c.quirks.median_centrality);
        assert_eq!(c.quirks.flow_tie_break, TieBreak::LeastCentral);

        let json = c.to_json().unwrap();
        assert!(json.contains(r#""center_mode": "Highest signal flow centrality""#));
        assert_eq!(AnalysisConfig::from_json(&json).unwrap(), c);
    }

    #[rstest]
    #[case::unknown_center(r#"{"center_mode": "Soma"}"#)]
    #[case::unknown_mode(r#"{"mode": "Strahler"}"#)]
    #[case::zero_step(r#"{"radius_increment": 0}"#)]
    #[case::negative_step(r#"{"radius_increment": -3.5}"#)]
    #[case::unknown_field(r#"{"radius": 10}"#)]
    #[case::not_json("radius_increment = 10")]
    fn test_invalid_configs(#[case] json: &str) {
        assert!(matches!(AnalysisConfig::from_json(json), Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"center_mode": "Average node position", "radius_increment": 42}}"#).unwrap();

        let c = AnalysisConfig::from_path(file.path()).unwrap();
        assert_eq!(c.center_mode, CenterMode::AverageNodePosition);
        assert_eq!(c.radius_increment, 42.0);

        let missing = AnalysisConfig::from_path(file.path().with_extension("missing"));
        assert!(missing.unwrap_err().to_string().contains("cannot read config"));
    }
}
