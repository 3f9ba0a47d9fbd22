//! Google Distance Matrix API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DistanceResolver, ResolverError};
use crate::config::ResolverSettings;
use crate::models::Coordinates;

/// Distance resolver backed by the Google Distance Matrix API.
///
/// Requests are bounded by the client-level timeout from
/// [`ResolverSettings`], so a stuck upstream call cannot hold a worker
/// indefinitely.
#[derive(Debug, Clone)]
pub struct GoogleMapsResolver {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsResolver {
    /// Create a resolver from settings.
    ///
    /// # Errors
    ///
    /// Returns a `ResolverError` if the HTTP client cannot be built.
    pub fn new(settings: &ResolverSettings) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

/// Top-level Distance Matrix response. Only the fields we consume.
#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    distance: Option<MatrixDistance>,
}

#[derive(Debug, Deserialize)]
struct MatrixDistance {
    /// Distance in meters.
    value: i64,
}

#[async_trait]
impl DistanceResolver for GoogleMapsResolver {
    async fn resolve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<i64, ResolverError> {
        let origins = format!("{},{}", origin.latitude, origin.longitude);
        let destinations = format!("{},{}", destination.latitude, destination.longitude);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("units", "metric"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Distance API returned an error status");
            return Err(ResolverError::Network(format!("HTTP status {status}")));
        }

        let body: MatrixResponse = response
            .json()
            .await
            .map_err(|e| ResolverError::MissingDistance(e.to_string()))?;

        debug!(rows = body.rows.len(), "Distance API response received");

        let meters = body
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .and_then(|element| element.distance.as_ref())
            .map(|distance| distance.value)
            .ok_or_else(|| {
                ResolverError::MissingDistance("rows[0].elements[0].distance absent".to_string())
            })?;

        debug!(meters, "Distance resolved");
        Ok(meters)
    }
}
