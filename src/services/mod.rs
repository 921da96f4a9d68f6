//! Business logic services

pub mod loans;
pub mod permissions;

use std::sync::Arc;

use crate::{config::LoanPolicy, error::AppResult, repository::LoanStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services over the given loan store
    pub fn new(store: Arc<dyn LoanStore>, policy: LoanPolicy) -> Self {
        Self {
            loans: loans::LoansService::new(store, policy),
        }
    }

    /// Check that backing storage is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.loans.ping().await
    }
}
