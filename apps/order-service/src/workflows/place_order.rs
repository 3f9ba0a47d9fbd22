//! Place-Order Workflow
//!
//! Validates the coordinate payload, resolves the travel distance, and
//! inserts exactly one order row. Every failure path leaves zero rows
//! behind: validation and resolution happen before the single atomic
//! insert.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::distance::DistanceResolver;
use crate::error::OrderError;
use crate::models::{Coordinates, OrderSummary};
use crate::repository::OrderStore;

/// Message for any structural violation of the coordinate payload.
const SHAPE_MESSAGE: &str = "Both 'origin' and 'destination' are required, each exactly a \
     [latitude, longitude] pair of decimal-number strings, with no extra fields.";

/// Pattern a coordinate string must match before parsing.
#[allow(clippy::expect_used)]
fn coordinate_pattern() -> &'static Regex {
    static COORDINATE_RE: OnceLock<Regex> = OnceLock::new();
    COORDINATE_RE.get_or_init(|| {
        Regex::new(r"^-?\d+(\.\d+)?$").expect("static coordinate regex is valid")
    })
}

/// One leg of the request, kept as raw strings for error reporting.
#[derive(Debug)]
struct RawCoordinates {
    latitude: String,
    longitude: String,
}

impl RawCoordinates {
    /// Parse into floats. The regex guarantees these are valid decimals.
    fn parse(&self) -> Result<Coordinates, OrderError> {
        let latitude = self
            .latitude
            .parse()
            .map_err(|_| OrderError::validation(SHAPE_MESSAGE))?;
        let longitude = self
            .longitude
            .parse()
            .map_err(|_| OrderError::validation(SHAPE_MESSAGE))?;
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// Workflow for `POST /orders`.
pub struct PlaceOrderWorkflow<S, D> {
    store: Arc<S>,
    resolver: Arc<D>,
}

impl<S, D> PlaceOrderWorkflow<S, D>
where
    S: OrderStore,
    D: DistanceResolver,
{
    /// Create a new `PlaceOrderWorkflow`.
    pub const fn new(store: Arc<S>, resolver: Arc<D>) -> Self {
        Self { store, resolver }
    }

    /// Run the workflow against a raw JSON body.
    ///
    /// # Errors
    ///
    /// `Validation` for structural problems, `Range` for out-of-bounds
    /// coordinates, `DistanceUnavailable` when the resolver fails or yields
    /// no positive distance, `Persistence` when the insert fails.
    pub async fn execute(&self, body: &Value) -> Result<OrderSummary, OrderError> {
        let (raw_origin, raw_destination) = parse_shape(body)?;
        let (origin, destination) = validate_ranges(&raw_origin, &raw_destination)?;

        let meters = match self.resolver.resolve(origin, destination).await {
            Ok(meters) => meters,
            Err(e) => {
                warn!(error = %e, "Distance resolution failed");
                return Err(OrderError::DistanceUnavailable);
            }
        };
        if meters <= 0 {
            warn!(meters, "Resolver returned no usable distance");
            return Err(OrderError::DistanceUnavailable);
        }

        let order = self.store.insert_order(meters).await.map_err(|e| {
            error!(error = %e, "Insert of new order rolled back");
            OrderError::persistence("New order cannot be created.")
        })?;

        info!(order_id = order.id, distance = order.distance, "Order placed");
        Ok(order.summary())
    }
}

/// Enforce the structural contract of the payload: an object with exactly
/// the keys `origin` and `destination`, each exactly two numeric strings.
fn parse_shape(body: &Value) -> Result<(RawCoordinates, RawCoordinates), OrderError> {
    let Some(object) = body.as_object() else {
        return Err(OrderError::validation(SHAPE_MESSAGE));
    };
    if object.len() != 2 {
        return Err(OrderError::validation(SHAPE_MESSAGE));
    }

    let origin = parse_pair(object.get("origin"))?;
    let destination = parse_pair(object.get("destination"))?;
    Ok((origin, destination))
}

fn parse_pair(value: Option<&Value>) -> Result<RawCoordinates, OrderError> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| OrderError::validation(SHAPE_MESSAGE))?;
    if items.len() != 2 {
        return Err(OrderError::validation(SHAPE_MESSAGE));
    }

    let mut parts = Vec::with_capacity(2);
    for item in items {
        let text = item
            .as_str()
            .ok_or_else(|| OrderError::validation(SHAPE_MESSAGE))?;
        if !coordinate_pattern().is_match(text) {
            return Err(OrderError::validation(SHAPE_MESSAGE));
        }
        parts.push(text.to_string());
    }

    let longitude = parts.pop().unwrap_or_default();
    let latitude = parts.pop().unwrap_or_default();
    Ok(RawCoordinates {
        latitude,
        longitude,
    })
}

/// Range-check both legs, naming every out-of-range field.
///
/// Boundaries are exclusive: latitude 90/-90 and longitude 180/-180 are
/// rejected.
fn validate_ranges(
    origin: &RawCoordinates,
    destination: &RawCoordinates,
) -> Result<(Coordinates, Coordinates), OrderError> {
    let origin_parsed = origin.parse()?;
    let destination_parsed = destination.parse()?;

    let mut out_of_range = Vec::new();
    if origin_parsed.latitude >= 90.0 || origin_parsed.latitude <= -90.0 {
        out_of_range.push(format!("origin latitude: {}", origin.latitude));
    }
    if destination_parsed.latitude >= 90.0 || destination_parsed.latitude <= -90.0 {
        out_of_range.push(format!("destination latitude: {}", destination.latitude));
    }
    if origin_parsed.longitude >= 180.0 || origin_parsed.longitude <= -180.0 {
        out_of_range.push(format!("origin longitude: {}", origin.longitude));
    }
    if destination_parsed.longitude >= 180.0 || destination_parsed.longitude <= -180.0 {
        out_of_range.push(format!("destination longitude: {}", destination.longitude));
    }

    if out_of_range.is_empty() {
        Ok((origin_parsed, destination_parsed))
    } else {
        info!(fields = %out_of_range.join(", "), "Coordinates out of range");
        Err(OrderError::Range(out_of_range.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{MockDistanceResolver, ResolverError};
    use crate::models::{Order, OrderStatus};
    use crate::repository::MockOrderStore;
    use chrono::Utc;
    use serde_json::json;

    fn order_row(id: i64, distance: i64) -> Order {
        Order {
            id,
            distance,
            status: OrderStatus::Unassigned,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn workflow(
        store: MockOrderStore,
        resolver: MockDistanceResolver,
    ) -> PlaceOrderWorkflow<MockOrderStore, MockDistanceResolver> {
        PlaceOrderWorkflow::new(Arc::new(store), Arc::new(resolver))
    }

    fn valid_body() -> Value {
        json!({"origin": ["59.45", "24.70"], "destination": ["59.43", "24.74"]})
    }

    #[tokio::test]
    async fn test_valid_request_inserts_one_order() {
        let mut resolver = MockDistanceResolver::new();
        resolver.expect_resolve().times(1).returning(|_, _| Ok(3120));
        let mut store = MockOrderStore::new();
        store
            .expect_insert_order()
            .withf(|meters| *meters == 3120)
            .times(1)
            .returning(|meters| Ok(order_row(1, meters)));

        let result = workflow(store, resolver).execute(&valid_body()).await;
        let summary = match result {
            Ok(s) => s,
            Err(e) => panic!("placement should succeed: {e}"),
        };
        assert_eq!(summary.id, 1);
        assert_eq!(summary.distance, 3120);
        assert_eq!(summary.status, OrderStatus::Unassigned);
    }

    #[tokio::test]
    async fn test_shape_violations_fail_before_any_collaborator() {
        let bodies = [
            json!({"origin": ["59.45", "24.70"]}),
            json!({"origin": ["59.45", "24.70"], "destination": ["59.43", "24.74"], "extra": 1}),
            json!({"origin": ["59.45"], "destination": ["59.43", "24.74"]}),
            json!({"origin": ["59.45", "24.70", "1.0"], "destination": ["59.43", "24.74"]}),
            json!({"origin": [59.45, 24.70], "destination": ["59.43", "24.74"]}),
            json!({"origin": ["59.45", "24.70"], "destination": ["59.43", "abc"]}),
            json!({"origin": ["59.45", "24.70"], "destination": ["59.43", "24.74e1"]}),
            json!(["59.45", "24.70"]),
        ];

        for body in bodies {
            // Mocks with no expectations panic if anything touches them.
            let wf = workflow(MockOrderStore::new(), MockDistanceResolver::new());
            let result = wf.execute(&body).await;
            assert!(
                matches!(result, Err(OrderError::Validation(_))),
                "body should fail shape validation: {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_range_boundaries_are_exclusive() {
        let rejected = [
            ("90.0", "24.70"),
            ("-90.0", "24.70"),
            ("59.45", "180.0"),
            ("59.45", "-180.0"),
        ];
        for (lat, lng) in rejected {
            let body = json!({"origin": [lat, lng], "destination": ["59.43", "24.74"]});
            let wf = workflow(MockOrderStore::new(), MockDistanceResolver::new());
            let result = wf.execute(&body).await;
            assert!(
                matches!(result, Err(OrderError::Range(_))),
                "({lat}, {lng}) should be out of range"
            );
        }

        let mut resolver = MockDistanceResolver::new();
        resolver.expect_resolve().returning(|_, _| Ok(100));
        let mut store = MockOrderStore::new();
        store
            .expect_insert_order()
            .returning(|meters| Ok(order_row(1, meters)));
        let body = json!({
            "origin": ["89.9999", "-179.9999"],
            "destination": ["-89.9999", "179.9999"]
        });
        let result = workflow(store, resolver).execute(&body).await;
        assert!(result.is_ok(), "values just inside the boundary pass");
    }

    #[tokio::test]
    async fn test_range_error_names_every_offending_field() {
        let body = json!({"origin": ["95", "185"], "destination": ["-95", "24.74"]});
        let wf = workflow(MockOrderStore::new(), MockDistanceResolver::new());
        let err = match wf.execute(&body).await {
            Err(e) => e,
            Ok(s) => panic!("expected range failure, got order {}", s.id),
        };

        let message = err.to_string();
        assert!(message.contains("origin latitude: 95"));
        assert!(message.contains("origin longitude: 185"));
        assert!(message.contains("destination latitude: -95"));
        assert!(!message.contains("destination longitude"));
    }

    #[tokio::test]
    async fn test_resolver_failure_skips_persistence() {
        let mut resolver = MockDistanceResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Err(ResolverError::Network("timeout".to_string())));
        // No insert expectation: persistence must not be reached.
        let store = MockOrderStore::new();

        let result = workflow(store, resolver).execute(&valid_body()).await;
        assert_eq!(result, Err(OrderError::DistanceUnavailable));
    }

    #[tokio::test]
    async fn test_zero_distance_is_unavailable() {
        let mut resolver = MockDistanceResolver::new();
        resolver.expect_resolve().returning(|_, _| Ok(0));
        let store = MockOrderStore::new();

        let result = workflow(store, resolver).execute(&valid_body()).await;
        assert_eq!(result, Err(OrderError::DistanceUnavailable));
    }

    #[tokio::test]
    async fn test_insert_failure_surfaces_persistence_error() {
        let mut resolver = MockDistanceResolver::new();
        resolver.expect_resolve().returning(|_, _| Ok(3120));
        let mut store = MockOrderStore::new();
        store.expect_insert_order().returning(|_| {
            Err(crate::repository::StoreError::Query(
                "constraint violation".to_string(),
            ))
        });

        let result = workflow(store, resolver).execute(&valid_body()).await;
        assert_eq!(
            result,
            Err(OrderError::persistence("New order cannot be created."))
        );
    }
}
