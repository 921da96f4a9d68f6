//! Settings endpoints

use axum::{extract::State, Json};

use crate::{config::LoanPolicy, error::AppResult};

use super::AuthenticatedUser;

/// Get the loan policy in effect
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current loan policy", body = LoanPolicy),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<LoanPolicy>> {
    Ok(Json(state.services.loans.policy().clone()))
}
