//! Loans repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use super::LoanStore;
use crate::{
    error::AppResult,
    models::{
        enums::LoanStatus,
        history::{LoanHistory, NewHistoryEntry},
        loan::{Loan, LoanFilter, LoanStatistics, NewLoan},
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn insert_history(
        tx: &mut Transaction<'_, Postgres>,
        loan_id: i32,
        entry: &NewHistoryEntry,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loan_history (loan_id, event_type, description, user_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(loan_id)
        .bind(entry.event_type)
        .bind(&entry.description)
        .bind(entry.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn create(&self, loan: &NewLoan, entry: &NewHistoryEntry) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                borrower_id, part_id, part_name, quantity, date_borrowed,
                date_due, status, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(loan.borrower_id)
        .bind(loan.part_id)
        .bind(&loan.part_name)
        .bind(loan.quantity)
        .bind(loan.date_borrowed)
        .bind(loan.date_due)
        .bind(LoanStatus::Active)
        .bind(&loan.notes)
        .bind(loan.created_by)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_history(&mut tx, created.id, entry).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn list(&self, filter: &LoanFilter) -> AppResult<Vec<Loan>> {
        // Each condition ends with its placeholder, numbered in bind order below
        let mut conditions: Vec<&str> = Vec::new();
        if filter.borrower_id.is_some() {
            conditions.push("borrower_id = ");
        }
        if filter.status.is_some() {
            conditions.push("status = ");
        }
        if filter.part_id.is_some() {
            conditions.push("part_id = ");
        }
        if filter.overdue_at.is_some() {
            conditions.push("status = 'active' AND date_due IS NOT NULL AND date_due < ");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = conditions
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}${}", c, i + 1))
                .collect();
            format!("WHERE {}", parts.join(" AND "))
        };

        let query = format!(
            "SELECT * FROM loans {} ORDER BY date_borrowed DESC, id DESC",
            where_clause
        );
        let mut builder = sqlx::query_as::<_, Loan>(&query);
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(part_id) = filter.part_id {
            builder = builder.bind(part_id);
        }
        if let Some(overdue_at) = filter.overdue_at {
            builder = builder.bind(overdue_at);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn compare_and_update(
        &self,
        expected: &Loan,
        next: &Loan,
        entry: &NewHistoryEntry,
    ) -> AppResult<Option<Loan>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $1, date_due = $2, date_returned = $3,
                return_notes = $4, date_updated = $5
            WHERE id = $6
              AND status = 'active'
              AND date_due IS NOT DISTINCT FROM $7
            RETURNING *
            "#,
        )
        .bind(next.status)
        .bind(next.date_due)
        .bind(next.date_returned)
        .bind(&next.return_notes)
        .bind(next.date_updated)
        .bind(expected.id)
        .bind(expected.date_due)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        Self::insert_history(&mut tx, updated.id, entry).await?;
        tx.commit().await?;

        Ok(Some(updated))
    }

    async fn history(&self, loan_id: i32) -> AppResult<Vec<LoanHistory>> {
        let rows = sqlx::query_as::<_, LoanHistory>(
            "SELECT * FROM loan_history WHERE loan_id = $1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn statistics(
        &self,
        borrower_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<LoanStatistics> {
        let stats = sqlx::query_as::<_, LoanStatistics>(
            r#"
            SELECT
                COUNT(*) AS total_loans,
                COUNT(*) FILTER (WHERE status = 'active') AS active_loans,
                COUNT(*) FILTER (WHERE status = 'returned') AS returned_loans,
                COUNT(*) FILTER (WHERE status = 'lost') AS lost_loans,
                COUNT(*) FILTER (
                    WHERE status = 'active' AND date_due IS NOT NULL AND date_due < $1
                ) AS overdue_loans
            FROM loans
            WHERE $2::INTEGER IS NULL OR borrower_id = $2
            "#,
        )
        .bind(now)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
