use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Role of an account. Stored as TEXT; immutable after creation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Staff,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Staff => "staff",
        }
    }

    /// Parses the stored label. Unknown labels are a validation failure at
    /// the repository boundary, not a panic.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "staff" => Ok(Role::Staff),
            other => Err(Error::Validation(format!("unknown role '{other}'"))),
        }
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Role::parse(s).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

/// Lifecycle status of a complaint. The set is fixed and ordered; the
/// transition graph is unrestricted (any status to any status, including
/// no-op re-application).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintStatus {
    Received,
    UnderEvaluation,
    Resolved,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 3] = [
        ComplaintStatus::Received,
        ComplaintStatus::UnderEvaluation,
        ComplaintStatus::Resolved,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Received => "received",
            ComplaintStatus::UnderEvaluation => "under_evaluation",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "received" => Ok(ComplaintStatus::Received),
            "under_evaluation" => Ok(ComplaintStatus::UnderEvaluation),
            "resolved" => Ok(ComplaintStatus::Resolved),
            other => Err(Error::Validation(format!(
                "unknown complaint status '{other}'"
            ))),
        }
    }
}

impl FromSql for ComplaintStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        ComplaintStatus::parse(s).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ComplaintStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

/// The logged-in caller, passed explicitly into every operation that enforces
/// a role check. Replaces the ambient "current user" session state of the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

// Based on the "users" table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64, // Primary Key, INTEGER
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String, // hex(SHA-256(password + salt)), never plaintext
    pub role: Role,
}

// Based on the "complaints" table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Complaint {
    pub id: i64,
    pub client_id: i64,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
}

/// Complaint joined with its owner's username/email for the staff triage view.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ComplaintWithClient {
    pub id: i64,
    pub client_id: i64,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub client_username: String,
    pub client_email: Option<String>,
}

// Based on the "complaint_images" table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ComplaintImage {
    pub id: i64,
    pub complaint_id: i64,
    pub path: String, // path accepted by the image store; never mutated
    pub created_at: DateTime<Utc>,
}

/// A chat message joined with the author's display name. Append-only;
/// ordering is insertion order (monotonic id).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub complaint_id: i64,
    pub author_id: i64,
    pub author_role: Role,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub author_name: String,
}

// Based on the "orders" table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub status: String, // free text, defaults to "new"
}

/// Dispatch row joined with the originating order's client and creation
/// timestamp, as consumed by the KPI aggregator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchRow {
    pub id: i64,
    pub order_id: i64,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub carrier: Option<String>,
    pub status: Option<String>,
    pub client_id: i64,
    pub order_created_at: DateTime<Utc>,
}

impl DispatchRow {
    /// Derived on-time flag: delivered at or before the scheduled time.
    /// `None` when either date is missing.
    pub fn on_time(&self) -> Option<bool> {
        match (self.delivered_at, self.scheduled_at) {
            (Some(delivered), Some(scheduled)) => Some(delivered <= scheduled),
            _ => None,
        }
    }

    /// Elapsed days between order creation and delivery, fractional.
    pub fn lead_time_days(&self) -> Option<f64> {
        self.delivered_at
            .map(|delivered| (delivered - self.order_created_at).num_seconds() as f64 / 86_400.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in ComplaintStatus::ALL {
            assert_eq!(ComplaintStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(ComplaintStatus::parse("shipped").is_err());
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("Staff").unwrap(), Role::Staff);
        assert_eq!(Role::parse(" client ").unwrap(), Role::Client);
        assert!(Role::parse("admin").is_err());
    }

    #[test]
    fn test_on_time_derivation() {
        let scheduled = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut row = DispatchRow {
            id: 1,
            order_id: 1,
            scheduled_at: Some(scheduled),
            delivered_at: Some(scheduled),
            carrier: None,
            status: None,
            client_id: 1,
            order_created_at: Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap(),
        };
        // Delivered exactly on schedule counts as on time.
        assert_eq!(row.on_time(), Some(true));

        row.delivered_at = Some(scheduled + chrono::Duration::hours(1));
        assert_eq!(row.on_time(), Some(false));

        row.delivered_at = None;
        assert_eq!(row.on_time(), None);
    }

    #[test]
    fn test_lead_time_days() {
        let created = Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap();
        let row = DispatchRow {
            id: 1,
            order_id: 1,
            scheduled_at: None,
            delivered_at: Some(created + chrono::Duration::hours(36)),
            carrier: None,
            status: None,
            client_id: 1,
            order_created_at: created,
        };
        assert_eq!(row.lead_time_days(), Some(1.5));
    }
}
