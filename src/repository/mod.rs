//! Repository layer for database operations

pub mod loans;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        history::{LoanHistory, NewHistoryEntry},
        loan::{Loan, LoanFilter, LoanStatistics, NewLoan},
    },
};

/// Persistence interface for loans and their history.
///
/// Every method that changes a loan also writes its history entry; both
/// land in the same transaction or neither does.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Insert a loan together with its `created` history entry
    async fn create(&self, loan: &NewLoan, entry: &NewHistoryEntry) -> AppResult<Loan>;

    /// Get loan by ID
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>>;

    /// Loans matching `filter`, newest borrow first
    async fn list(&self, filter: &LoanFilter) -> AppResult<Vec<Loan>>;

    /// Replace `expected` with `next` only if the stored row is still active
    /// and carries the due date `expected` was read with.
    ///
    /// Returns `None` when the row no longer matches.
    async fn compare_and_update(
        &self,
        expected: &Loan,
        next: &Loan,
        entry: &NewHistoryEntry,
    ) -> AppResult<Option<Loan>>;

    /// History of a loan, newest first
    async fn history(&self, loan_id: i32) -> AppResult<Vec<LoanHistory>>;

    /// Counts per status, optionally restricted to one borrower
    async fn statistics(
        &self,
        borrower_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<LoanStatistics>;

    /// Check the backing storage answers
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}
