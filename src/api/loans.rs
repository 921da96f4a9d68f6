//! Loan management endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        history::LoanHistoryEntry,
        loan::{ExtendLoan, LoanDetails, LoanQuery, LoanShort, LoanStatistics, RegisterLoan, ReturnLoan},
    },
};

use super::{ApiJson, ApiPath, AuthenticatedUser};

/// Loan list response
#[derive(Serialize, ToSchema)]
pub struct LoanListResponse {
    /// Number of loans returned
    pub count: usize,
    pub results: Vec<LoanShort>,
}

/// List loans (own loans only for non-staff users)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans, most recently borrowed first", body = LoanListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<LoanQuery>, AppError>,
) -> AppResult<Json<LoanListResponse>> {
    let results = state.services.loans.list(&claims, &query).await?;

    Ok(Json(LoanListResponse {
        count: results.len(),
        results,
    }))
}

/// Register a new loan borrowed by the current user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = RegisterLoan,
    responses(
        (status = 201, description = "Loan registered", body = LoanDetails),
        (status = 400, description = "Missing part or invalid quantity"),
        (status = 403, description = "Not allowed to register loans")
    )
)]
pub async fn register_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(request), _): ApiJson<RegisterLoan>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let loan = state.services.loans.register(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Loan statistics (own loans only for non-staff users)
#[utoipa::path(
    get,
    path = "/loans/statistics",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan counts by status", body = LoanStatistics)
    )
)]
pub async fn get_statistics(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoanStatistics>> {
    let stats = state.services.loans.statistics(&claims).await?;
    Ok(Json(stats))
}

/// Get loan details with history
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(loan_id), _): ApiPath<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get(&claims, loan_id).await?;
    Ok(Json(loan))
}

/// Get loan history
#[utoipa::path(
    get,
    path = "/loans/{id}/history",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "History entries, newest first", body = Vec<LoanHistoryEntry>),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(loan_id), _): ApiPath<i32>,
) -> AppResult<Json<Vec<LoanHistoryEntry>>> {
    let history = state.services.loans.history(&claims, loan_id).await?;
    Ok(Json(history))
}

/// Mark borrowed equipment as returned
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Equipment returned", body = LoanDetails),
        (status = 400, description = "Unreadable body"),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned or lost")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(loan_id), _): ApiPath<i32>,
    body: Bytes,
) -> AppResult<Json<LoanDetails>> {
    // The body is optional, but one that is present must parse
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ReturnLoan::default()
    } else {
        Json::<ReturnLoan>::from_bytes(&body)?.0
    };
    let loan = state
        .services
        .loans
        .return_loan(&claims, loan_id, request.return_notes)
        .await?;
    Ok(Json(loan))
}

/// Mark borrowed equipment as lost (staff only)
#[utoipa::path(
    post,
    path = "/loans/{id}/mark-lost",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Equipment marked as lost", body = LoanDetails),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned or lost")
    )
)]
pub async fn mark_lost(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(loan_id), _): ApiPath<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.mark_lost(&claims, loan_id).await?;
    Ok(Json(loan))
}

/// Extend the due date of a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/extend",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ExtendLoan,
    responses(
        (status = 200, description = "Due date extended", body = LoanDetails),
        (status = 400, description = "date_due missing or malformed"),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned or lost")
    )
)]
pub async fn extend_due_date(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(loan_id), _): ApiPath<i32>,
    WithRejection(Json(request), _): ApiJson<ExtendLoan>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state
        .services
        .loans
        .extend_due_date(&claims, loan_id, request.date_due)
        .await?;
    Ok(Json(loan))
}
