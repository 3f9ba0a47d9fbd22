//! Domain types for the order service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an order.
///
/// The only legal transition is `Unassigned -> Taken`; it happens at most
/// once per order, inside the store transaction that holds the row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, not yet claimed by anyone.
    Unassigned,
    /// Claimed. Terminal.
    Taken,
}

impl OrderStatus {
    /// Canonical string form, as stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "UNASSIGNED",
            Self::Taken => "TAKEN",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNASSIGNED" => Ok(Self::Unassigned),
            "TAKEN" => Ok(Self::Taken),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Store-assigned identity.
    pub id: i64,
    /// Travel distance in meters, fixed at creation.
    pub distance: i64,
    /// Current lifecycle state.
    pub status: OrderStatus,
    /// Insert timestamp (UTC, store-assigned).
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp (UTC, store-assigned).
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Project to the client-facing shape.
    #[must_use]
    pub const fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            distance: self.distance,
            status: self.status,
        }
    }
}

/// Client-facing projection of an order: `{id, distance, status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Order identity.
    pub id: i64,
    /// Distance in meters.
    pub distance: i64,
    /// Lifecycle state.
    pub status: OrderStatus,
}

/// A validated geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees, strictly inside (-90, 90).
    pub latitude: f64,
    /// Longitude in degrees, strictly inside (-180, 180).
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!(OrderStatus::Unassigned.as_str(), "UNASSIGNED");
        assert_eq!(OrderStatus::Taken.as_str(), "TAKEN");
        assert_eq!(
            OrderStatus::from_str("UNASSIGNED"),
            Ok(OrderStatus::Unassigned)
        );
        assert_eq!(OrderStatus::from_str("TAKEN"), Ok(OrderStatus::Taken));
        assert!(OrderStatus::from_str("taken").is_err());
    }

    #[test]
    fn test_summary_serializes_to_wire_shape() {
        let summary = OrderSummary {
            id: 1,
            distance: 3120,
            status: OrderStatus::Unassigned,
        };

        let json = match serde_json::to_value(summary) {
            Ok(v) => v,
            Err(e) => panic!("summary should serialize: {e}"),
        };
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "distance": 3120, "status": "UNASSIGNED"})
        );
    }
}
