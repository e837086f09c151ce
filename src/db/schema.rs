use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

/// Canonical schema: every table the repositories read, created in one
/// transaction.
#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            email TEXT,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS complaints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            FOREIGN KEY (client_id) REFERENCES users (id)
        );

        CREATE TABLE IF NOT EXISTS complaint_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            complaint_id INTEGER NOT NULL,
            path TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            FOREIGN KEY (complaint_id) REFERENCES complaints (id)
        );

        CREATE TABLE IF NOT EXISTS chat_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            complaint_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            author_role TEXT NOT NULL,
            body TEXT NOT NULL,
            sent_at DATETIME NOT NULL,
            FOREIGN KEY (complaint_id) REFERENCES complaints (id),
            FOREIGN KEY (user_id) REFERENCES users (id)
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL,
            detail TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            status TEXT NOT NULL DEFAULT 'new',
            FOREIGN KEY (client_id) REFERENCES users (id)
        );

        -- Dispatches carry scheduled vs. actual delivery time for the SLA
        -- KPIs; on-time is derived at read time, never stored.
        CREATE TABLE IF NOT EXISTS dispatches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            scheduled_at DATETIME,
            delivered_at DATETIME,
            carrier TEXT,
            status TEXT,
            FOREIGN KEY (order_id) REFERENCES orders (id)
        );

        COMMIT;",
    )
    .map_err(|e| Error::Database(format!("Failed to create tables: {}", e)))?;
    info!("Database tables ensured.");
    Ok(())
}
