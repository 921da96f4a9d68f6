//! Data models for equipment loans

pub mod enums;
pub mod history;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use enums::{HistoryEventType, LoanStatus};
pub use history::{LoanHistory, LoanHistoryEntry, NewHistoryEntry};
pub use loan::{Loan, LoanDetails, LoanShort, LoanStatistics, LoanTransition, NewLoan};
pub use user::UserClaims;
