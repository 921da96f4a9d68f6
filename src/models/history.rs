//! Loan audit history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::HistoryEventType;

/// Append-only history entry from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LoanHistory {
    pub id: i32,
    pub loan_id: i32,
    pub event_type: HistoryEventType,
    pub description: String,
    pub user_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

/// History entry to be written alongside a lifecycle change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub event_type: HistoryEventType,
    pub description: String,
    pub user_id: Option<i32>,
}

/// History entry as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanHistoryEntry {
    pub id: i32,
    pub event_type: HistoryEventType,
    pub event_type_display: String,
    pub description: String,
    /// User who triggered the event
    pub user_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl From<LoanHistory> for LoanHistoryEntry {
    fn from(h: LoanHistory) -> Self {
        LoanHistoryEntry {
            id: h.id,
            event_type_display: h.event_type.label().to_string(),
            event_type: h.event_type,
            description: h.description,
            user_id: h.user_id,
            timestamp: h.timestamp,
        }
    }
}
