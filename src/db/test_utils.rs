#![allow(dead_code)]
use crate::db::{DbPool, schema};
use crate::errors::{Error, Result};
use crate::models::{Principal, Role};
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")))
        .with_test_writer()
        .try_init(); // try_init to avoid panic if already initialized
}

/// Fresh in-memory database with the full schema, one per test.
pub(crate) async fn setup_test_db() -> Result<DbPool> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Database(format!("Test DB: Failed to open in-memory: {}", e)))?;
    conn.execute("PRAGMA foreign_keys = ON;", [])
        .map_err(|e| Error::Database(format!("Test DB: Failed to enable foreign keys: {}", e)))?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Inserts a user directly, bypassing the credential store, for focused
/// repository tests. The stored digest is a placeholder.
pub(crate) fn direct_insert_user(conn: &Connection, username: &str, role: Role) -> Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?1, NULL, 'x', ?2)",
    )?;
    let id = stmt.insert(params![username, role])?;
    Ok(id)
}

pub(crate) fn client_principal(user_id: i64) -> Principal {
    Principal {
        user_id,
        role: Role::Client,
    }
}

pub(crate) fn staff_principal(user_id: i64) -> Principal {
    Principal {
        user_id,
        role: Role::Staff,
    }
}
