//! Distance Resolver (Driven Port)
//!
//! Converts a coordinate pair into a travel distance in meters via an
//! external service. Treated as a remote call with its own failure mode;
//! the workflows never retry it.

pub mod google;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Coordinates;

pub use google::GoogleMapsResolver;

/// Resolver-level failure.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Transport failure or timeout reaching the service.
    #[error("Distance API request failed: {0}")]
    Network(String),

    /// The service answered but the payload carried no usable distance.
    #[error("Distance API response had no distance: {0}")]
    MissingDistance(String),
}

/// Resolves the travel distance between two coordinates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    /// Resolve the distance in meters from `origin` to `destination`.
    async fn resolve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<i64, ResolverError>;
}
