//! Error types shared across the protocol engine crates.
//!
//! These errors cover the external insight collaborator, the one component
//! that can be slow, absent, or failing. Application-specific errors are
//! defined in each crate and wrap `CommonError` via `#[from]`.
use crate::insight::InsightError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("insight service error: {0}")]
    Insight(#[from] InsightError),

    #[error("insight service unconfigured or unavailable, degrading gracefully")]
    InsightUnavailable,
}
