use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{ChatMessage, Principal};
use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument};

/// Upper bound on one chat message body, in characters, after trimming.
pub const BODY_MAX_CHARS: usize = 500;

/// Appends a message to a complaint's thread. The author's role is recorded
/// from the principal; any authenticated party may post to any complaint
/// (no ownership check).
///
/// # Errors
///
/// * `Error::Validation` if the trimmed body is empty or over 500 chars.
/// * `Error::NotFound` if the complaint does not exist.
#[instrument(skip(pool, body))]
pub async fn post_message(
    pool: &DbPool,
    principal: Principal,
    complaint_id: i64,
    body: &str,
) -> Result<i64> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::Validation(
            "message body must not be empty".to_string(),
        ));
    }
    if body.chars().count() > BODY_MAX_CHARS {
        return Err(Error::Validation(format!(
            "message body exceeds {} characters",
            BODY_MAX_CHARS
        )));
    }

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;

    let mut stmt_check = conn.prepare_cached("SELECT id FROM complaints WHERE id = ?1")?;
    let found: Option<i64> = stmt_check
        .query_row(params![complaint_id], |row| row.get(0))
        .optional()?;
    if found.is_none() {
        return Err(Error::NotFound(format!(
            "complaint {} does not exist",
            complaint_id
        )));
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO chat_messages (complaint_id, user_id, author_role, body, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let message_id = stmt.insert(params![
        complaint_id,
        principal.user_id,
        principal.role,
        body,
        Utc::now()
    ])?;
    info!(
        "Posted message {} on complaint {} by user {} ({}).",
        message_id,
        complaint_id,
        principal.user_id,
        principal.role.as_str()
    );
    Ok(message_id)
}

/// Full thread for one complaint in insertion order, each message joined
/// with the author's display name. Append-only: nothing is ever edited or
/// deleted.
#[instrument(skip(pool))]
pub async fn list_messages(pool: &DbPool, complaint_id: i64) -> Result<Vec<ChatMessage>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT m.id, m.complaint_id, m.user_id, m.author_role, m.body, m.sent_at, u.username
         FROM chat_messages m
         JOIN users u ON u.id = m.user_id
         WHERE m.complaint_id = ?1
         ORDER BY m.id ASC",
    )?;
    let rows = stmt.query_map(params![complaint_id], |row| {
        Ok(ChatMessage {
            id: row.get(0)?,
            complaint_id: row.get(1)?,
            author_id: row.get(2)?,
            author_role: row.get(3)?,
            body: row.get(4)?,
            sent_at: row.get(5)?,
            author_name: row.get(6)?,
        })
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row.map_err(|e| {
            Error::Database(format!("Failed to map chat message row: {}", e))
        })?);
    }
    debug!(
        "Fetched {} message(s) for complaint {}.",
        messages.len(),
        complaint_id
    );
    Ok(messages)
}
