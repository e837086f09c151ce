use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{DispatchRow, Order, Principal, Role};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument};

/// Upper bound on the free-text order detail, in characters.
pub const DETAIL_MAX_CHARS: usize = 1000;

/// Places a new order for the calling client. Status defaults to `"new"`
/// and is never updated by any flow in scope.
#[instrument(skip(pool, detail))]
pub async fn place_order(pool: &DbPool, principal: Principal, detail: &str) -> Result<i64> {
    if principal.role != Role::Client {
        return Err(Error::Forbidden(
            "only clients may place orders".to_string(),
        ));
    }
    let detail = detail.trim();
    if detail.is_empty() {
        return Err(Error::Validation(
            "order detail must not be empty".to_string(),
        ));
    }
    if detail.chars().count() > DETAIL_MAX_CHARS {
        return Err(Error::Validation(format!(
            "order detail exceeds {} characters",
            DETAIL_MAX_CHARS
        )));
    }

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO orders (client_id, detail, created_at, status) VALUES (?1, ?2, ?3, 'new')",
    )?;
    let order_id = stmt.insert(params![principal.user_id, detail, Utc::now()])?;
    info!("Placed order {} for client {}.", order_id, principal.user_id);
    Ok(order_id)
}

/// Lists one client's orders, newest first.
#[instrument(skip(pool))]
pub async fn list_for_client(pool: &DbPool, client_id: i64) -> Result<Vec<Order>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, client_id, detail, created_at, status
         FROM orders WHERE client_id = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![client_id], |row| {
        Ok(Order {
            id: row.get(0)?,
            client_id: row.get(1)?,
            detail: row.get(2)?,
            created_at: row.get(3)?,
            status: row.get(4)?,
        })
    })?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(row.map_err(|e| Error::Database(format!("Failed to map order row: {}", e)))?);
    }
    debug!("Fetched {} order(s) for client {}.", orders.len(), client_id);
    Ok(orders)
}

#[instrument(skip(pool))]
pub async fn list_all(pool: &DbPool) -> Result<Vec<Order>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, client_id, detail, created_at, status FROM orders ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Order {
            id: row.get(0)?,
            client_id: row.get(1)?,
            detail: row.get(2)?,
            created_at: row.get(3)?,
            status: row.get(4)?,
        })
    })?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(row.map_err(|e| Error::Database(format!("Failed to map order row: {}", e)))?);
    }
    Ok(orders)
}

/// Records a dispatch for an order. No caller in scope reaches this through
/// the presentation layer; it exists for externally seeded delivery data.
#[instrument(skip(pool))]
pub async fn create_dispatch(
    pool: &DbPool,
    order_id: i64,
    scheduled_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    carrier: Option<&str>,
    status: Option<&str>,
) -> Result<i64> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;

    let mut stmt_check = conn.prepare_cached("SELECT id FROM orders WHERE id = ?1")?;
    let found: Option<i64> = stmt_check
        .query_row(params![order_id], |row| row.get(0))
        .optional()?;
    if found.is_none() {
        return Err(Error::NotFound(format!("order {} does not exist", order_id)));
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO dispatches (order_id, scheduled_at, delivered_at, carrier, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let dispatch_id = stmt.insert(params![order_id, scheduled_at, delivered_at, carrier, status])?;
    info!("Recorded dispatch {} for order {}.", dispatch_id, order_id);
    Ok(dispatch_id)
}

/// Dispatch rows joined with the originating order's client and creation
/// timestamp, as the KPI aggregator consumes them.
#[instrument(skip(pool))]
pub async fn list_dispatches(pool: &DbPool) -> Result<Vec<DispatchRow>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT d.id, d.order_id, d.scheduled_at, d.delivered_at, d.carrier, d.status,
                o.client_id, o.created_at
         FROM dispatches d
         JOIN orders o ON o.id = d.order_id
         ORDER BY d.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DispatchRow {
            id: row.get(0)?,
            order_id: row.get(1)?,
            scheduled_at: row.get(2)?,
            delivered_at: row.get(3)?,
            carrier: row.get(4)?,
            status: row.get(5)?,
            client_id: row.get(6)?,
            order_created_at: row.get(7)?,
        })
    })?;

    let mut dispatches = Vec::new();
    for row in rows {
        dispatches.push(row.map_err(|e| {
            Error::Database(format!("Failed to map dispatch row: {}", e))
        })?);
    }
    debug!("Fetched {} dispatch row(s).", dispatches.len());
    Ok(dispatches)
}
