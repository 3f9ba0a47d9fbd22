//! Layered error taxonomy for the order workflows.
//!
//! Every workflow failure is one of these kinds; the HTTP layer converts all
//! of them to a 400-class `{"error": <message>}` response. `AlreadyTaken`
//! (terminal-state conflict, give up) and `Contended` (transient lock
//! conflict, safe to retry) carry distinguishable messages so clients can
//! decide between the two.

use thiserror::Error;

/// A workflow-level failure, scoped to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Malformed or missing input. Never reaches the store.
    #[error("{0}")]
    Validation(String),

    /// Coordinates outside the accepted range; names every offending field.
    #[error(
        "Wrong input, {0} must be within range. -90 < latitude < 90, -180 < longitude < 180."
    )]
    Range(String),

    /// The distance resolver failed or returned no usable distance.
    #[error("Distance cannot be retrieved with Google Maps Distance Matrix.")]
    DistanceUnavailable,

    /// No order row with the requested id.
    #[error("Order does not exist.")]
    NotFound,

    /// The order already reached its terminal state.
    #[error("Order is already taken.")]
    AlreadyTaken,

    /// Another claim attempt holds the row lock right now.
    #[error("Order is currently occupied. Update status to TAKEN fail.")]
    Contended,

    /// Store-level failure (insert, update, commit, connectivity).
    #[error("{0}")]
    Persistence(String),
}

impl OrderError {
    /// Validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Persistence error with the given user-facing message.
    ///
    /// The underlying store error must be logged at the call site; it is
    /// never surfaced to the client.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Whether a client may usefully retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Contended)
    }
}
