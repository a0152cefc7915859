use thiserror::Error;

use crate::node_id::NodeId;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdSearchError {
    /// General error.
    #[error("General error: {0}")]
    General(String),

    /// A construction policy value that does not name a known algorithm or axis rule.
    #[error("Invalid construction policy: {0}")]
    InvalidPolicy(String),

    /// The number of items or nodes handed over does not match what was declared.
    #[error("Length mismatch: expected {expected}, got {actual}.")]
    Length {
        /// The declared or required length.
        expected: usize,
        /// The length actually observed.
        actual: usize,
    },

    /// A node id that does not refer to a live, removable node.
    #[error("Node {0} is not a live node of this tree.")]
    InvalidNode(NodeId),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, KdSearchError>;
