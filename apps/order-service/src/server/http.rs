//! HTTP/JSON API server implementation.
//!
//! Axum-based REST API that delegates to the workflows. Request parsing is
//! deliberately lax at the framework level (raw `serde_json::Value` bodies,
//! string path/query parameters) so that every malformed input flows
//! through the workflow validators and comes back as the uniform
//! `{"error": <message>}` 400 response instead of a framework rejection.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::distance::DistanceResolver;
use crate::error::OrderError;
use crate::models::OrderSummary;
use crate::repository::OrderStore;
use crate::workflows::{ListOrdersWorkflow, PlaceOrderWorkflow, TakeOrderWorkflow};

/// Application state shared across handlers.
pub struct AppState<S, D>
where
    S: OrderStore,
    D: DistanceResolver,
{
    /// Workflow for placing orders.
    pub place_order: Arc<PlaceOrderWorkflow<S, D>>,
    /// Workflow for claiming orders.
    pub take_order: Arc<TakeOrderWorkflow<S>>,
    /// Workflow for listing orders.
    pub list_orders: Arc<ListOrdersWorkflow<S>>,
}

impl<S, D> AppState<S, D>
where
    S: OrderStore,
    D: DistanceResolver,
{
    /// Wire the workflows from their ports.
    pub fn new(store: Arc<S>, resolver: Arc<D>) -> Self {
        Self {
            place_order: Arc::new(PlaceOrderWorkflow::new(Arc::clone(&store), resolver)),
            take_order: Arc::new(TakeOrderWorkflow::new(Arc::clone(&store))),
            list_orders: Arc::new(ListOrdersWorkflow::new(store)),
        }
    }
}

impl<S, D> Clone for AppState<S, D>
where
    S: OrderStore,
    D: DistanceResolver,
{
    fn clone(&self) -> Self {
        Self {
            place_order: Arc::clone(&self.place_order),
            take_order: Arc::clone(&self.take_order),
            list_orders: Arc::clone(&self.list_orders),
        }
    }
}

/// Create the Axum router with all endpoints.
pub fn create_router<S, D>(state: AppState<S, D>) -> Router
where
    S: OrderStore + 'static,
    D: DistanceResolver + 'static,
{
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/orders", post(place_order).get(list_orders))
        .route("/orders/{id}", patch(take_order))
        .with_state(state)
}

/// Health check endpoint.
async fn healthcheck() -> Json<Value> {
    Json(serde_json::json!({"data": "hello world."}))
}

/// Success body for a claim: `{"status": "SUCCESS"}`.
#[derive(Debug, Serialize)]
struct TakeOrderResponse {
    status: &'static str,
}

/// `POST /orders`: place a new order.
async fn place_order<S, D>(
    State(state): State<AppState<S, D>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderSummary>), ApiError>
where
    S: OrderStore,
    D: DistanceResolver,
{
    let Json(body) = body.map_err(|_| {
        ApiError::from(OrderError::validation("Request body must be valid JSON."))
    })?;

    let summary = state.place_order.execute(&body).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// `PATCH /orders/{id}`: claim an order.
async fn take_order<S, D>(
    State(state): State<AppState<S, D>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TakeOrderResponse>, ApiError>
where
    S: OrderStore,
    D: DistanceResolver,
{
    let order_id: i64 = id.parse().map_err(|_| {
        ApiError::from(OrderError::validation(
            "id of order must be an integer or a string containing only one integer.",
        ))
    })?;
    let Json(body) = body.map_err(|_| {
        ApiError::from(OrderError::validation("Request body must be valid JSON."))
    })?;

    info!(order_id, "Claim requested");
    state.take_order.execute(order_id, &body).await?;
    Ok(Json(TakeOrderResponse { status: "SUCCESS" }))
}

/// `GET /orders?page={p}&limit={n}`: list orders.
async fn list_orders<S, D>(
    State(state): State<AppState<S, D>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<OrderSummary>>, ApiError>
where
    S: OrderStore,
    D: DistanceResolver,
{
    let orders = state
        .list_orders
        .execute(params.get("page").map(String::as_str), params.get("limit").map(String::as_str))
        .await?;
    Ok(Json(orders))
}

/// Workflow error as an HTTP response.
///
/// Every failure is scoped to its request and surfaces as a 400-class
/// `{"error": <message>}` body; nothing is fatal to the process.
#[derive(Debug)]
pub struct ApiError(OrderError);

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        Self(error)
    }
}

/// Error body: `{"error": <message>}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
