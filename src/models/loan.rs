//! Equipment loan model and lifecycle rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{HistoryEventType, LoanStatus};
use super::history::{LoanHistoryEntry, NewHistoryEntry};
use crate::error::{AppError, AppResult};

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub borrower_id: i32,
    /// Inventory part being borrowed
    pub part_id: i32,
    /// Part name cached at registration time
    pub part_name: String,
    pub quantity: i32,
    pub date_borrowed: DateTime<Utc>,
    pub date_due: Option<DateTime<Utc>>,
    pub date_returned: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub notes: String,
    pub return_notes: String,
    /// User who recorded the loan; cleared if that user goes away
    pub created_by: Option<i32>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// A state change that may be applied to an active loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanTransition {
    Return {
        at: DateTime<Utc>,
        return_notes: String,
    },
    MarkLost,
    ExtendDueDate {
        from: Option<DateTime<Utc>>,
        to: DateTime<Utc>,
    },
}

impl LoanTransition {
    pub fn event_type(&self) -> HistoryEventType {
        match self {
            LoanTransition::Return { .. } => HistoryEventType::Returned,
            LoanTransition::MarkLost => HistoryEventType::MarkedLost,
            LoanTransition::ExtendDueDate { .. } => HistoryEventType::Extended,
        }
    }

    /// Audit description for this transition on `loan`
    pub fn describe(&self, loan: &Loan) -> String {
        match self {
            LoanTransition::Return { .. } => format!("Equipment returned: {}", loan.part_name),
            LoanTransition::MarkLost => format!("Equipment marked as lost: {}", loan.part_name),
            LoanTransition::ExtendDueDate { from, to } => format!(
                "Due date extended from {} to {}",
                from.map(|d| d.to_rfc3339()).unwrap_or_else(|| "None".to_string()),
                to.to_rfc3339()
            ),
        }
    }

    /// History entry recording this transition, attributed to `user_id`
    pub fn history_entry(&self, loan: &Loan, user_id: i32) -> NewHistoryEntry {
        NewHistoryEntry {
            event_type: self.event_type(),
            description: self.describe(loan),
            user_id: Some(user_id),
        }
    }
}

impl Loan {
    /// True iff the loan is active and its due date has passed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.date_due {
            Some(due) => self.status == LoanStatus::Active && now > due,
            None => false,
        }
    }

    /// Whole days between borrowing and return (or `now` while still out)
    pub fn days_borrowed(&self, now: DateTime<Utc>) -> i64 {
        let end = self.date_returned.unwrap_or(now);
        (end - self.date_borrowed).num_days()
    }

    /// Whole days past the due date, 0 when not overdue
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        match self.date_due {
            Some(due) if self.is_overdue(now) => (now - due).num_days(),
            _ => 0,
        }
    }

    fn ensure_active(&self, action: &str) -> AppResult<()> {
        if self.status == LoanStatus::Active {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "Cannot {} loan {}: status is {}",
                action, self.id, self.status
            )))
        }
    }

    pub fn plan_return(&self, now: DateTime<Utc>, return_notes: Option<String>) -> AppResult<LoanTransition> {
        self.ensure_active("return")?;
        Ok(LoanTransition::Return {
            at: now,
            return_notes: return_notes.unwrap_or_default(),
        })
    }

    pub fn plan_mark_lost(&self) -> AppResult<LoanTransition> {
        self.ensure_active("mark as lost")?;
        Ok(LoanTransition::MarkLost)
    }

    pub fn plan_extension(&self, new_due_date: Option<DateTime<Utc>>) -> AppResult<LoanTransition> {
        let to = new_due_date.ok_or_else(|| AppError::Validation("date_due is required".to_string()))?;
        self.ensure_active("extend")?;
        Ok(LoanTransition::ExtendDueDate {
            from: self.date_due,
            to,
        })
    }

    /// State of this loan after `transition`, stamped at `now`
    pub fn apply(&self, transition: &LoanTransition, now: DateTime<Utc>) -> Loan {
        let mut next = self.clone();
        match transition {
            LoanTransition::Return { at, return_notes } => {
                next.status = LoanStatus::Returned;
                next.date_returned = Some(*at);
                next.return_notes = return_notes.clone();
            }
            LoanTransition::MarkLost => {
                next.status = LoanStatus::Lost;
            }
            LoanTransition::ExtendDueDate { to, .. } => {
                next.date_due = Some(*to);
            }
        }
        next.date_updated = now;
        next
    }
}

fn default_quantity() -> i32 {
    1
}

/// Register loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterLoan {
    /// Inventory part ID
    #[validate(required(message = "part_id is required"))]
    pub part_id: Option<i32>,
    /// Part name, cached for reference
    #[validate(
        required(message = "part_name is required"),
        length(max = 255, message = "part_name must be at most 255 characters")
    )]
    pub part_name: Option<String>,
    /// Quantity borrowed (defaults to 1)
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub notes: String,
    /// Expected return date
    pub date_due: Option<DateTime<Utc>>,
}

/// Validated loan ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub borrower_id: i32,
    pub part_id: i32,
    pub part_name: String,
    pub quantity: i32,
    pub date_borrowed: DateTime<Utc>,
    pub date_due: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_by: Option<i32>,
}

impl RegisterLoan {
    /// Validate the request and build the loan borrowed by `borrower_id` at `now`
    pub fn into_new_loan(self, borrower_id: i32, now: DateTime<Utc>) -> AppResult<NewLoan> {
        self.validate()?;

        let part_name = self
            .part_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("part_id and part_name are required".to_string()))?;
        let part_id = self
            .part_id
            .ok_or_else(|| AppError::Validation("part_id and part_name are required".to_string()))?;

        Ok(NewLoan {
            borrower_id,
            part_id,
            part_name,
            quantity: self.quantity,
            date_borrowed: now,
            date_due: self.date_due,
            notes: self.notes,
            created_by: Some(borrower_id),
        })
    }
}

impl NewLoan {
    pub fn history_entry(&self) -> NewHistoryEntry {
        NewHistoryEntry {
            event_type: HistoryEventType::Created,
            description: format!(
                "Equipment loan created: {} (qty: {})",
                self.part_name, self.quantity
            ),
            user_id: self.created_by,
        }
    }
}

/// Return loan request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReturnLoan {
    /// Condition notes recorded on return
    pub return_notes: Option<String>,
}

/// Extend due date request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExtendLoan {
    /// New due date (ISO 8601)
    pub date_due: Option<DateTime<Utc>>,
}

/// Loan list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    /// Only honoured for staff
    pub borrower_id: Option<i32>,
    pub part_id: Option<i32>,
    /// Only active loans whose due date has passed
    pub overdue_only: Option<bool>,
}

/// Storage-level loan filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub borrower_id: Option<i32>,
    pub status: Option<LoanStatus>,
    pub part_id: Option<i32>,
    /// Restrict to active loans due before this instant
    pub overdue_at: Option<DateTime<Utc>>,
}

/// Loan counts per status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanStatistics {
    pub total_loans: i64,
    pub active_loans: i64,
    pub returned_loans: i64,
    pub lost_loans: i64,
    pub overdue_loans: i64,
}

/// Loan with derived facts and history, for detail views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub borrower_id: i32,
    pub part_id: i32,
    pub part_name: String,
    pub quantity: i32,
    pub date_borrowed: DateTime<Utc>,
    pub date_due: Option<DateTime<Utc>>,
    pub date_returned: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub status_display: String,
    pub notes: String,
    pub return_notes: String,
    pub created_by: Option<i32>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub is_overdue: bool,
    pub days_borrowed: i64,
    pub days_overdue: i64,
    pub history: Vec<LoanHistoryEntry>,
}

impl LoanDetails {
    pub fn new(loan: Loan, history: Vec<LoanHistoryEntry>, now: DateTime<Utc>) -> Self {
        LoanDetails {
            is_overdue: loan.is_overdue(now),
            days_borrowed: loan.days_borrowed(now),
            days_overdue: loan.days_overdue(now),
            status_display: loan.status.label().to_string(),
            id: loan.id,
            borrower_id: loan.borrower_id,
            part_id: loan.part_id,
            part_name: loan.part_name,
            quantity: loan.quantity,
            date_borrowed: loan.date_borrowed,
            date_due: loan.date_due,
            date_returned: loan.date_returned,
            status: loan.status,
            notes: loan.notes,
            return_notes: loan.return_notes,
            created_by: loan.created_by,
            date_created: loan.date_created,
            date_updated: loan.date_updated,
            history,
        }
    }
}

/// Short loan representation for lists
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanShort {
    pub id: i32,
    pub borrower_id: i32,
    pub part_id: i32,
    pub part_name: String,
    pub quantity: i32,
    pub date_borrowed: DateTime<Utc>,
    pub date_due: Option<DateTime<Utc>>,
    pub date_returned: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub status_display: String,
    pub is_overdue: bool,
    pub days_borrowed: i64,
}

impl LoanShort {
    pub fn new(loan: Loan, now: DateTime<Utc>) -> Self {
        LoanShort {
            is_overdue: loan.is_overdue(now),
            days_borrowed: loan.days_borrowed(now),
            status_display: loan.status.label().to_string(),
            id: loan.id,
            borrower_id: loan.borrower_id,
            part_id: loan.part_id,
            part_name: loan.part_name,
            quantity: loan.quantity,
            date_borrowed: loan.date_borrowed,
            date_due: loan.date_due,
            date_returned: loan.date_returned,
            status: loan.status,
        }
    }
}
