//! Order Store (Driven Port)
//!
//! Typed operations over the persistent order table. The store owns the
//! schema and the row-locking primitive; workflows never see SQL or
//! transaction handles, only outcomes.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Order, OrderSummary};

pub use postgres::PgOrderStore;

/// Store-level failure. Workflows translate this into a user-facing
/// persistence error; the cause stays in the logs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection acquisition or connectivity failure.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Query, update, or commit failure.
    #[error("Query error: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

/// Result of one claim attempt on one order row.
///
/// `Claimed` is returned to exactly one of N concurrent attempts on the
/// same `UNASSIGNED` order; every other attempt sees one of the remaining
/// outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The lock was acquired, the status was `UNASSIGNED`, and the flip to
    /// `TAKEN` committed.
    Claimed,
    /// The lock was acquired but the order was already `TAKEN`.
    AlreadyTaken,
    /// No row with the requested id.
    NotFound,
    /// Another transaction held the row lock; the non-blocking request
    /// failed immediately instead of queueing.
    Contended,
}

/// Persistent order operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new `UNASSIGNED` order with the given distance.
    ///
    /// Atomic: on failure no partial row remains.
    async fn insert_order(&self, distance_meters: i64) -> Result<Order, StoreError>;

    /// Attempt to claim the order: lock the row without blocking, check the
    /// status under the lock, and flip it to `TAKEN` before commit.
    async fn claim_order(&self, order_id: i64) -> Result<ClaimOutcome, StoreError>;

    /// Read one page of orders, newest id first.
    ///
    /// `page` is 1-based; a page beyond the available range yields an empty
    /// vector, not an error.
    async fn list_orders(&self, page: u32, limit: u32) -> Result<Vec<OrderSummary>, StoreError>;
}
