//! Take-Order Workflow
//!
//! Validates the claim request, then delegates the acquisition protocol to
//! the store: non-blocking exclusive row lock, status check under the lock,
//! status flip before commit. The workflow's job is the input contract and
//! the outcome-to-error mapping; mutual exclusion lives entirely in the
//! store transaction.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::error::OrderError;
use crate::models::OrderStatus;
use crate::repository::{ClaimOutcome, OrderStore};

/// Message for any structural violation of the claim payload.
const STATUS_MESSAGE: &str =
    "Request body must be exactly {\"status\": \"TAKEN\"}, with no extra fields.";

/// Workflow for `PATCH /orders/{id}`.
pub struct TakeOrderWorkflow<S> {
    store: Arc<S>,
}

impl<S> TakeOrderWorkflow<S>
where
    S: OrderStore,
{
    /// Create a new `TakeOrderWorkflow`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Attempt to claim the order.
    ///
    /// # Errors
    ///
    /// `Validation` before the store is touched; afterwards `NotFound`,
    /// `AlreadyTaken`, `Contended`, or `Persistence` depending on the
    /// attempt's outcome.
    pub async fn execute(&self, order_id: i64, body: &Value) -> Result<(), OrderError> {
        validate_status_body(body)?;

        match self.store.claim_order(order_id).await {
            Ok(ClaimOutcome::Claimed) => {
                info!(order_id, status = %OrderStatus::Taken, "Order claimed");
                Ok(())
            }
            Ok(ClaimOutcome::AlreadyTaken) => Err(OrderError::AlreadyTaken),
            Ok(ClaimOutcome::NotFound) => Err(OrderError::NotFound),
            Ok(ClaimOutcome::Contended) => Err(OrderError::Contended),
            Err(e) => {
                error!(order_id, error = %e, "Claim attempt rolled back");
                Err(OrderError::persistence(format!(
                    "Cannot update order status with id {order_id}."
                )))
            }
        }
    }
}

/// The body must structurally equal `{"status": "TAKEN"}`.
fn validate_status_body(body: &Value) -> Result<(), OrderError> {
    let Some(object) = body.as_object() else {
        return Err(OrderError::validation(STATUS_MESSAGE));
    };
    if object.len() != 1 {
        return Err(OrderError::validation(STATUS_MESSAGE));
    }
    match object.get("status").and_then(Value::as_str) {
        Some(status) if status == OrderStatus::Taken.as_str() => Ok(()),
        _ => Err(OrderError::validation(STATUS_MESSAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockOrderStore, StoreError};
    use serde_json::json;

    fn workflow(store: MockOrderStore) -> TakeOrderWorkflow<MockOrderStore> {
        TakeOrderWorkflow::new(Arc::new(store))
    }

    fn taken_body() -> Value {
        json!({"status": "TAKEN"})
    }

    #[tokio::test]
    async fn test_claim_success() {
        let mut store = MockOrderStore::new();
        store
            .expect_claim_order()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Ok(ClaimOutcome::Claimed));

        let result = workflow(store).execute(1, &taken_body()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_bodies_never_reach_the_store() {
        let bodies = [
            json!({}),
            json!({"status": "UNASSIGNED"}),
            json!({"status": "taken"}),
            json!({"status": "TAKEN", "extra": true}),
            json!({"state": "TAKEN"}),
            json!({"status": 1}),
            json!("TAKEN"),
        ];

        for body in bodies {
            // A mock with no expectations panics on any call.
            let result = workflow(MockOrderStore::new()).execute(1, &body).await;
            assert!(
                matches!(result, Err(OrderError::Validation(_))),
                "body should fail validation: {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_outcomes_map_to_distinct_errors() {
        let cases = [
            (ClaimOutcome::AlreadyTaken, OrderError::AlreadyTaken),
            (ClaimOutcome::NotFound, OrderError::NotFound),
            (ClaimOutcome::Contended, OrderError::Contended),
        ];

        for (outcome, expected) in cases {
            let mut store = MockOrderStore::new();
            store.expect_claim_order().returning(move |_| Ok(outcome));
            let result = workflow(store).execute(7, &taken_body()).await;
            assert_eq!(result, Err(expected));
        }
    }

    #[tokio::test]
    async fn test_store_failure_becomes_persistence_error() {
        let mut store = MockOrderStore::new();
        store
            .expect_claim_order()
            .returning(|_| Err(StoreError::Connection("pool exhausted".to_string())));

        let result = workflow(store).execute(9, &taken_body()).await;
        assert_eq!(
            result,
            Err(OrderError::persistence(
                "Cannot update order status with id 9."
            ))
        );
    }
}
