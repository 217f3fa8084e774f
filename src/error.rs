//! Error type shared by the timeline, synthesis and epoching stages.
//!
//! File and CLI code uses `anyhow`; the numeric core returns [`ErpError`] so
//! callers can tell a bad parameter from an empty epoch set.

/// Failure conditions of the core pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErpError {
    /// A generator or window parameter violates its precondition.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every candidate epoch was dropped by the boundary policy
    /// (or there were no candidate events at all).
    #[error("no epochs survived boundary rejection ({n_candidates} candidate events)")]
    EmptyEpochSet { n_candidates: usize },

    /// The input cannot support the requested computation, e.g. a timestamp
    /// vector whose median spacing is zero.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

pub type Result<T> = std::result::Result<T, ErpError>;

/// Shorthand for building an [`ErpError::InvalidParameter`].
pub(crate) fn invalid(msg: impl Into<String>) -> ErpError {
    ErpError::InvalidParameter(msg.into())
}
