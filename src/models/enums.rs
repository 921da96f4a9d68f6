//! Loan status and history event enums, stored as text columns

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Implements sqlx text encoding for an enum exposing `as_str` and `FromStr`
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Status of a loan.
///
/// `Overdue` is part of the stored vocabulary but lifecycle code never writes
/// it: whether a loan is overdue is always computed from its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
    Lost,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Lost => "lost",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Active => "Active - Currently Borrowed",
            LoanStatus::Returned => "Returned",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Lost => "Lost",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "returned" => Ok(LoanStatus::Returned),
            "overdue" => Ok(LoanStatus::Overdue),
            "lost" => Ok(LoanStatus::Lost),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

text_column!(LoanStatus);

// ---------------------------------------------------------------------------
// HistoryEventType
// ---------------------------------------------------------------------------

/// Kind of event recorded in a loan's audit history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEventType {
    Created,
    Returned,
    Extended,
    MarkedLost,
    StatusChanged,
    NotesUpdated,
}

impl HistoryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEventType::Created => "created",
            HistoryEventType::Returned => "returned",
            HistoryEventType::Extended => "extended",
            HistoryEventType::MarkedLost => "marked_lost",
            HistoryEventType::StatusChanged => "status_changed",
            HistoryEventType::NotesUpdated => "notes_updated",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryEventType::Created => "Loan Created",
            HistoryEventType::Returned => "Equipment Returned",
            HistoryEventType::Extended => "Due Date Extended",
            HistoryEventType::MarkedLost => "Marked as Lost",
            HistoryEventType::StatusChanged => "Status Changed",
            HistoryEventType::NotesUpdated => "Notes Updated",
        }
    }
}

impl std::str::FromStr for HistoryEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(HistoryEventType::Created),
            "returned" => Ok(HistoryEventType::Returned),
            "extended" => Ok(HistoryEventType::Extended),
            "marked_lost" => Ok(HistoryEventType::MarkedLost),
            "status_changed" => Ok(HistoryEventType::StatusChanged),
            "notes_updated" => Ok(HistoryEventType::NotesUpdated),
            _ => Err(format!("Invalid history event type: {}", s)),
        }
    }
}

text_column!(HistoryEventType);
