use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Complaint, ComplaintImage, ComplaintStatus, ComplaintWithClient, Principal, Role};
use crate::uploads::ImageStore;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use rusqlite::types::Value;
use tracing::{debug, info, instrument, warn};

/// Description length bounds, in characters, after trimming.
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// One file in an attachment batch.
#[derive(Debug, Clone, Copy)]
pub struct ImageUpload<'a> {
    pub filename: &'a str,
    pub bytes: &'a [u8],
}

/// Outcome of an attachment batch: stored paths plus per-file warnings for
/// the rejected ones. A rejected file never aborts its siblings.
#[derive(Debug, Default)]
pub struct AttachmentBatch {
    pub stored: Vec<String>,
    pub warnings: Vec<String>,
}

fn complaint_exists(conn: &Connection, complaint_id: i64) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT id FROM complaints WHERE id = ?1")?;
    let found: Option<i64> = stmt
        .query_row(params![complaint_id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Registers a new complaint for the calling client.
///
/// # Errors
///
/// * `Error::Forbidden` unless the caller's role is client.
/// * `Error::Validation` unless the trimmed description is 10..=1000 chars.
#[instrument(skip(pool, description))]
pub async fn submit_complaint(
    pool: &DbPool,
    principal: Principal,
    description: &str,
) -> Result<i64> {
    if principal.role != Role::Client {
        return Err(Error::Forbidden(
            "only clients may submit complaints".to_string(),
        ));
    }
    let description = description.trim();
    let chars = description.chars().count();
    if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&chars) {
        return Err(Error::Validation(format!(
            "description must be {}..={} characters after trimming, got {}",
            DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS, chars
        )));
    }

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO complaints (client_id, description, status, created_at) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let complaint_id = stmt.insert(params![
        principal.user_id,
        description,
        ComplaintStatus::Received,
        Utc::now()
    ])?;
    info!(
        "Registered complaint {} for client {}.",
        complaint_id, principal.user_id
    );
    Ok(complaint_id)
}

/// Fetches one complaint joined with its owner's username/email.
#[instrument(skip(pool))]
pub async fn get_complaint(pool: &DbPool, complaint_id: i64) -> Result<Option<ComplaintWithClient>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT c.id, c.client_id, c.description, c.status, c.created_at, u.username, u.email
         FROM complaints c
         JOIN users u ON u.id = c.client_id
         WHERE c.id = ?1",
    )?;
    let complaint = stmt
        .query_row(params![complaint_id], |row| {
            Ok(ComplaintWithClient {
                id: row.get(0)?,
                client_id: row.get(1)?,
                description: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
                client_username: row.get(5)?,
                client_email: row.get(6)?,
            })
        })
        .optional()?;
    Ok(complaint)
}

/// Lists one client's complaints, newest first.
#[instrument(skip(pool))]
pub async fn list_for_client(pool: &DbPool, client_id: i64) -> Result<Vec<Complaint>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, client_id, description, status, created_at
         FROM complaints WHERE client_id = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![client_id], |row| {
        Ok(Complaint {
            id: row.get(0)?,
            client_id: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut complaints = Vec::new();
    for row in rows {
        complaints.push(row.map_err(|e| {
            Error::Database(format!("Failed to map complaint row: {}", e))
        })?);
    }
    debug!("Fetched {} complaint(s) for client {}.", complaints.len(), client_id);
    Ok(complaints)
}

/// Staff triage view: every complaint joined with its owner, newest first,
/// optionally narrowed to one status and/or a `LIKE` substring match on the
/// description or owner username.
#[instrument(skip(pool))]
pub async fn list_all(
    pool: &DbPool,
    status_filter: Option<ComplaintStatus>,
    text_filter: Option<&str>,
) -> Result<Vec<ComplaintWithClient>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;

    let mut sql = String::from(
        "SELECT c.id, c.client_id, c.description, c.status, c.created_at, u.username, u.email
         FROM complaints c
         JOIN users u ON u.id = c.client_id
         WHERE 1=1",
    );
    let mut bind: Vec<Value> = Vec::new();
    if let Some(status) = status_filter {
        sql.push_str(" AND c.status = ?");
        bind.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(text) = text_filter
        && !text.trim().is_empty()
    {
        sql.push_str(" AND (c.description LIKE ? OR u.username LIKE ?)");
        let like = format!("%{}%", text.trim());
        bind.push(Value::Text(like.clone()));
        bind.push(Value::Text(like));
    }
    sql.push_str(" ORDER BY c.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind), |row| {
        Ok(ComplaintWithClient {
            id: row.get(0)?,
            client_id: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            client_username: row.get(5)?,
            client_email: row.get(6)?,
        })
    })?;

    let mut complaints = Vec::new();
    for row in rows {
        complaints.push(row.map_err(|e| {
            Error::Database(format!("Failed to map complaint row: {}", e))
        })?);
    }
    debug!("Triage query returned {} complaint(s).", complaints.len());
    Ok(complaints)
}

/// Every complaint without the join, for the reporting screen's aggregation.
#[instrument(skip(pool))]
pub async fn list_for_report(pool: &DbPool) -> Result<Vec<Complaint>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, client_id, description, status, created_at FROM complaints ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Complaint {
            id: row.get(0)?,
            client_id: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut complaints = Vec::new();
    for row in rows {
        complaints.push(row.map_err(|e| {
            Error::Database(format!("Failed to map complaint row: {}", e))
        })?);
    }
    Ok(complaints)
}

/// Moves a complaint to `new_status`. The status set is fixed but the
/// transition graph is not: any status to any status is allowed, including
/// re-applying the current one (idempotent). Two concurrent updates are
/// last-write-wins.
///
/// # Errors
///
/// * `Error::Forbidden` unless the caller's role is staff.
/// * `Error::NotFound` if the complaint id does not exist.
#[instrument(skip(pool))]
pub async fn update_status(
    pool: &DbPool,
    principal: Principal,
    complaint_id: i64,
    new_status: ComplaintStatus,
) -> Result<()> {
    if principal.role != Role::Staff {
        return Err(Error::Forbidden(
            "only staff may update complaint status".to_string(),
        ));
    }

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let rows_affected = conn.execute(
        "UPDATE complaints SET status = ?1 WHERE id = ?2",
        params![new_status, complaint_id],
    )?;
    if rows_affected == 0 {
        return Err(Error::NotFound(format!(
            "complaint {} does not exist",
            complaint_id
        )));
    }
    info!(
        "Complaint {} moved to status '{}' by staff {}.",
        complaint_id,
        new_status.as_str(),
        principal.user_id
    );
    Ok(())
}

/// Validates, stores, and records one image for a complaint.
///
/// Ordering: the file is written first, the metadata row second. A crash in
/// between leaves an orphan file in the store, never a metadata row pointing
/// at nothing.
#[instrument(skip(pool, store, bytes))]
pub async fn attach_image(
    pool: &DbPool,
    store: &ImageStore,
    complaint_id: i64,
    filename: &str,
    bytes: &[u8],
) -> Result<String> {
    {
        let conn = pool
            .lock()
            .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
        if !complaint_exists(&conn, complaint_id)? {
            return Err(Error::NotFound(format!(
                "complaint {} does not exist",
                complaint_id
            )));
        }
    }

    // Lock released during the blocking file write; re-acquired for the insert.
    let path = store.save(complaint_id, filename, bytes)?;

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO complaint_images (complaint_id, path, created_at) VALUES (?1, ?2, ?3)",
    )?;
    stmt.insert(params![complaint_id, path, Utc::now()])?;
    info!("Attached image '{}' to complaint {}.", path, complaint_id);
    Ok(path)
}

/// Attaches a batch of images. Each file is validated and persisted
/// independently; failures go into the warning list instead of aborting the
/// batch or the complaint they belong to.
#[instrument(skip(pool, store, uploads))]
pub async fn attach_images(
    pool: &DbPool,
    store: &ImageStore,
    complaint_id: i64,
    uploads: &[ImageUpload<'_>],
) -> Result<AttachmentBatch> {
    {
        let conn = pool
            .lock()
            .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
        if !complaint_exists(&conn, complaint_id)? {
            return Err(Error::NotFound(format!(
                "complaint {} does not exist",
                complaint_id
            )));
        }
    }

    let mut batch = AttachmentBatch::default();
    for upload in uploads {
        match attach_image(pool, store, complaint_id, upload.filename, upload.bytes).await {
            Ok(path) => batch.stored.push(path),
            Err(e @ (Error::Validation(_) | Error::Storage(_))) => {
                warn!(
                    "Skipping image '{}' for complaint {}: {}",
                    upload.filename, complaint_id, e
                );
                batch.warnings.push(format!("{}: {}", upload.filename, e));
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        "Attachment batch for complaint {}: {} stored, {} rejected.",
        complaint_id,
        batch.stored.len(),
        batch.warnings.len()
    );
    Ok(batch)
}

/// Lists recorded images for a complaint in insertion order.
#[instrument(skip(pool))]
pub async fn list_images(pool: &DbPool, complaint_id: i64) -> Result<Vec<ComplaintImage>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, complaint_id, path, created_at
         FROM complaint_images WHERE complaint_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![complaint_id], |row| {
        Ok(ComplaintImage {
            id: row.get(0)?,
            complaint_id: row.get(1)?,
            path: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    let mut images = Vec::new();
    for row in rows {
        images.push(row.map_err(|e| Error::Database(format!("Failed to map image row: {}", e)))?);
    }
    Ok(images)
}
