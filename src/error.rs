//! Error types shared by every analysis in the crate.
use crate::store::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Multiple roots, no root, a cycle, a dangling parent or a duplicate node row.
    #[error("Malformed tree: {reason}")]
    MalformedTree { reason: String },
    #[error("Missing position for node {node}")]
    MissingPosition { node: NodeId },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Empty input: {0}")]
    EmptyInput(String),
}

impl AnalysisError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTree { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
