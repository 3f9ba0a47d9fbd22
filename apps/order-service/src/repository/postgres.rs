//! PostgreSQL order store.
//!
//! Implements the acquisition protocol with `SELECT ... FOR UPDATE NOWAIT`:
//! the row lock request fails immediately (SQLSTATE `55P03`) when another
//! transaction holds it, so contended claim attempts never queue behind the
//! winner. The status check and the status write both happen inside the
//! transaction that holds the lock; commit releases it.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};

use super::{ClaimOutcome, OrderStore, StoreError};
use crate::config::DatabaseSettings;
use crate::models::{Order, OrderStatus, OrderSummary};

/// SQLSTATE raised by Postgres when a `NOWAIT` lock request cannot be
/// granted immediately.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Order store backed by a Postgres connection pool.
///
/// Each operation checks one connection out of the pool for exactly the
/// duration of its statement or transaction; every exit path (commit,
/// rollback, drop on error or panic) returns it, keeping the connection
/// budget bounded.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Connect to the database and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the pool cannot be created or the schema
    /// statement fails.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(
            max_connections = settings.max_connections,
            "PostgreSQL connection pool initialized"
        );

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool (for tests).
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the order table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS orders (
                id          BIGSERIAL PRIMARY KEY,
                distance    BIGINT NOT NULL CHECK (distance >= 0),
                status      VARCHAR(32) NOT NULL DEFAULT 'UNASSIGNED',
                created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        debug!("Order schema ensured");
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, distance_meters: i64) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r"
            INSERT INTO orders (distance)
            VALUES ($1)
            RETURNING id, distance, status, created_at, updated_at
            ",
        )
        .bind(distance_meters)
        .fetch_one(&self.pool)
        .await?;

        let order = row_to_order(&row)?;
        info!(
            order_id = order.id,
            distance = order.distance,
            status = %order.status,
            "Inserted new order"
        );
        Ok(order)
    }

    async fn claim_order(&self, order_id: i64) -> Result<ClaimOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        debug!(order_id, "Claim transaction started");

        // The row lock is granted (or refused) when this query executes.
        let locked = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE NOWAIT")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await;

        let row = match locked {
            Ok(row) => row,
            Err(e) if is_lock_not_available(&e) => {
                tx.rollback().await?;
                info!(order_id, "Row lock held elsewhere, claim attempt fails fast");
                return Ok(ClaimOutcome::Contended);
            }
            // Dropping `tx` rolls the transaction back before the
            // connection returns to the pool.
            Err(e) => return Err(e.into()),
        };

        let Some(row) = row else {
            tx.rollback().await?;
            info!(order_id, "Claim attempt on missing order");
            return Ok(ClaimOutcome::NotFound);
        };

        // Status is read only here, under the held lock.
        let status = row_status(&row)?;
        if status == OrderStatus::Taken {
            tx.rollback().await?;
            info!(order_id, "Claim attempt on already taken order");
            return Ok(ClaimOutcome::AlreadyTaken);
        }

        sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(OrderStatus::Taken.as_str())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        // Commit releases the row lock; losers waiting to retry now observe
        // TAKEN instead of contention.
        tx.commit().await?;
        info!(order_id, status = %OrderStatus::Taken, "Order status updated");
        Ok(ClaimOutcome::Claimed)
    }

    async fn list_orders(&self, page: u32, limit: u32) -> Result<Vec<OrderSummary>, StoreError> {
        let offset = page_offset(page, limit);
        let rows = sqlx::query(
            r"
            SELECT id, distance, status
            FROM orders
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(OrderSummary {
                id: row.try_get("id").map_err(StoreError::from)?,
                distance: row.try_get("distance").map_err(StoreError::from)?,
                status: row_status(row)?,
            });
        }

        debug!(page, limit, count = orders.len(), "Listed orders");
        Ok(orders)
    }
}

/// Row offset for a 1-based page. Saturates instead of overflowing, so an
/// absurdly large page stays a valid (empty) page rather than a negative
/// `OFFSET` the database rejects.
fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.saturating_sub(1)).saturating_mul(i64::from(limit))
}

/// Whether an sqlx error is the Postgres "lock not available" condition.
fn is_lock_not_available(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(sqlx::error::DatabaseError::code)
        .is_some_and(|code| code == LOCK_NOT_AVAILABLE)
}

fn row_status(row: &sqlx::postgres::PgRow) -> Result<OrderStatus, StoreError> {
    let raw: String = row.try_get("status")?;
    OrderStatus::from_str(&raw).map_err(|e| {
        warn!(status = %raw, "Unparseable status column");
        StoreError::Query(e)
    })
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    Ok(Order {
        id: row.try_get("id")?,
        distance: row.try_get("distance")?,
        status: row_status(row)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
