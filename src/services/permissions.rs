//! Authorization rules for registering and managing loans.
//!
//! The predicates are pure: the caller passes the actor (`None` when the
//! request is anonymous), the loan when one is involved, and the policy.

use crate::{
    config::LoanPolicy,
    error::{AppError, AppResult},
    models::{loan::Loan, user::UserClaims},
};

/// May `actor` register a new loan under `policy`?
pub fn can_register(actor: Option<&UserClaims>, policy: &LoanPolicy) -> bool {
    let Some(actor) = actor else {
        return false;
    };

    if !policy.loan_enabled {
        return false;
    }

    if actor.is_privileged() {
        return true;
    }

    policy.allowed_groups.is_empty() || actor.in_any_group(&policy.allowed_groups)
}

/// Staff and superusers approve loans
pub fn can_approve(actor: Option<&UserClaims>) -> bool {
    actor.is_some_and(UserClaims::is_privileged)
}

/// Staff and superusers manage any loan, borrowers their own
pub fn can_manage(actor: Option<&UserClaims>, loan: &Loan) -> bool {
    actor.is_some_and(|a| a.is_privileged() || a.user_id == loan.borrower_id)
}

pub fn require_register(actor: &UserClaims, policy: &LoanPolicy) -> AppResult<()> {
    if can_register(Some(actor), policy) {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "You do not have permission to register equipment loans.".to_string(),
        ))
    }
}

pub fn require_approve(actor: &UserClaims) -> AppResult<()> {
    if can_approve(Some(actor)) {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "Only staff can mark equipment as lost.".to_string(),
        ))
    }
}

pub fn require_manage(actor: &UserClaims, loan: &Loan) -> AppResult<()> {
    if can_manage(Some(actor), loan) {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "You do not have permission to manage this loan.".to_string(),
        ))
    }
}
