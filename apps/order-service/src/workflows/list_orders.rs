//! Order Listing
//!
//! Read-only paginated query. No locking concerns; repeated identical calls
//! are side-effect free.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::OrderError;
use crate::models::OrderSummary;
use crate::repository::OrderStore;

/// Message for missing or unparseable pagination arguments.
const PAGINATION_MESSAGE: &str =
    "Both arguments page and limit are required, and must be integers of at least 1.";

/// Workflow for `GET /orders`.
pub struct ListOrdersWorkflow<S> {
    store: Arc<S>,
}

impl<S> ListOrdersWorkflow<S>
where
    S: OrderStore,
{
    /// Create a new `ListOrdersWorkflow`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// List one page of orders, newest id first.
    ///
    /// # Errors
    ///
    /// `Validation` when `page`/`limit` are missing, non-integer, or < 1;
    /// `Persistence` when the store query fails. A page beyond the
    /// available range is not an error: it yields `[]`.
    pub async fn execute(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Vec<OrderSummary>, OrderError> {
        let page = parse_argument(page)?;
        let limit = parse_argument(limit)?;

        let orders = self.store.list_orders(page, limit).await.map_err(|e| {
            error!(page, limit, error = %e, "Order listing failed");
            OrderError::persistence("Orders cannot be queried.")
        })?;

        debug!(page, limit, count = orders.len(), "Orders listed");
        Ok(orders)
    }
}

fn parse_argument(value: Option<&str>) -> Result<u32, OrderError> {
    let parsed: u32 = value
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| OrderError::validation(PAGINATION_MESSAGE))?;
    if parsed < 1 {
        return Err(OrderError::validation(PAGINATION_MESSAGE));
    }
    Ok(parsed)
}
