//! Loan lifecycle service

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::permissions;
use crate::{
    config::LoanPolicy,
    error::{AppError, AppResult},
    models::{
        history::LoanHistoryEntry,
        loan::{Loan, LoanDetails, LoanFilter, LoanQuery, LoanShort, LoanStatistics, LoanTransition, RegisterLoan},
        user::UserClaims,
    },
    repository::LoanStore,
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoanStore>,
    policy: LoanPolicy,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoanStore>, policy: LoanPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    async fn load(&self, loan_id: i32) -> AppResult<Loan> {
        self.store
            .get_by_id(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))
    }

    async fn details(&self, loan: Loan, now: DateTime<Utc>) -> AppResult<LoanDetails> {
        let history = self
            .store
            .history(loan.id)
            .await?
            .into_iter()
            .map(LoanHistoryEntry::from)
            .collect();
        Ok(LoanDetails::new(loan, history, now))
    }

    /// Register a new loan borrowed by the acting user
    pub async fn register(&self, actor: &UserClaims, request: RegisterLoan) -> AppResult<LoanDetails> {
        permissions::require_register(actor, &self.policy)?;

        let now = Utc::now();
        let new_loan = request.into_new_loan(actor.user_id, now)?;
        let loan = self.store.create(&new_loan, &new_loan.history_entry()).await?;

        tracing::info!(
            "Loan {} registered: {} x{} (part {}) for user {}",
            loan.id, loan.part_name, loan.quantity, loan.part_id, actor.sub
        );

        self.details(loan, now).await
    }

    /// Get a loan with its history
    pub async fn get(&self, actor: &UserClaims, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.load(loan_id).await?;
        permissions::require_manage(actor, &loan)?;
        self.details(loan, Utc::now()).await
    }

    /// History of a loan, newest first
    pub async fn history(&self, actor: &UserClaims, loan_id: i32) -> AppResult<Vec<LoanHistoryEntry>> {
        let loan = self.load(loan_id).await?;
        permissions::require_manage(actor, &loan)?;
        let history = self.store.history(loan.id).await?;
        Ok(history.into_iter().map(LoanHistoryEntry::from).collect())
    }

    /// List loans visible to the actor
    pub async fn list(&self, actor: &UserClaims, query: &LoanQuery) -> AppResult<Vec<LoanShort>> {
        let now = Utc::now();
        let filter = Self::visible_filter(actor, query, now);
        let loans = self.store.list(&filter).await?;
        Ok(loans.into_iter().map(|l| LoanShort::new(l, now)).collect())
    }

    /// Loan counts; non-staff only see their own
    pub async fn statistics(&self, actor: &UserClaims) -> AppResult<LoanStatistics> {
        let borrower_id = if actor.is_staff { None } else { Some(actor.user_id) };
        self.store.statistics(borrower_id, Utc::now()).await
    }

    pub async fn return_loan(
        &self,
        actor: &UserClaims,
        loan_id: i32,
        return_notes: Option<String>,
    ) -> AppResult<LoanDetails> {
        let loan = self.load(loan_id).await?;
        permissions::require_manage(actor, &loan)?;
        self.commit(actor, loan, |l, now| l.plan_return(now, return_notes.clone()))
            .await
    }

    pub async fn mark_lost(&self, actor: &UserClaims, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.load(loan_id).await?;
        permissions::require_approve(actor)?;
        self.commit(actor, loan, |l, _| l.plan_mark_lost()).await
    }

    pub async fn extend_due_date(
        &self,
        actor: &UserClaims,
        loan_id: i32,
        new_due_date: Option<DateTime<Utc>>,
    ) -> AppResult<LoanDetails> {
        let loan = self.load(loan_id).await?;
        permissions::require_manage(actor, &loan)?;
        self.commit(actor, loan, |l, _| l.plan_extension(new_due_date))
            .await
    }

    /// Plan a transition on `loan` and persist it if the stored loan is unchanged.
    ///
    /// When another request got there first the loan is reloaded and planned
    /// once more, so a racing extension does not fail a return that is still
    /// valid. A second miss is reported as an invalid transition.
    async fn commit<F>(&self, actor: &UserClaims, mut loan: Loan, plan: F) -> AppResult<LoanDetails>
    where
        F: Fn(&Loan, DateTime<Utc>) -> AppResult<LoanTransition> + Send + Sync,
    {
        for attempt in 0..2 {
            let now = Utc::now();
            let transition = plan(&loan, now)?;
            let next = loan.apply(&transition, now);
            let entry = transition.history_entry(&loan, actor.user_id);

            if let Some(updated) = self.store.compare_and_update(&loan, &next, &entry).await? {
                tracing::info!(
                    "Loan {} {} by {}: {}",
                    updated.id, transition.event_type(), actor.sub, entry.description
                );
                return self.details(updated, now).await;
            }

            loan = self.load(loan.id).await?;
            tracing::warn!(
                "Loan {} changed concurrently (now {}), {} attempt {} missed",
                loan.id, loan.status, transition.event_type(), attempt + 1
            );
        }

        Err(AppError::InvalidTransition(format!(
            "Loan {} was modified concurrently (status is {})",
            loan.id, loan.status
        )))
    }

    fn visible_filter(actor: &UserClaims, query: &LoanQuery, now: DateTime<Utc>) -> LoanFilter {
        let borrower_id = if actor.is_staff {
            query.borrower_id
        } else {
            Some(actor.user_id)
        };

        LoanFilter {
            borrower_id,
            status: query.status,
            part_id: query.part_id,
            overdue_at: query.overdue_only.unwrap_or(false).then_some(now),
        }
    }
}
