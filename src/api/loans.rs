//! Loan management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{BorrowLoan, LoanQuery, LoanSummary, LoanView},
    AppState,
};

use super::{AppJson, AppPath, AppQuery};

/// Return response with loan details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Always "returned"
    pub status: String,
    /// The loan after the return
    pub loan: LoanView,
}

/// List loans
#[utoipa::path(
    get,
    path = "/Loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans with book and borrower, oldest first", body = Vec<LoanView>)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LoanQuery>,
) -> AppResult<Json<Vec<LoanView>>> {
    let loans = state.services.loans.list(&query).await?;
    Ok(Json(loans))
}

/// List overdue loans
#[utoipa::path(
    get,
    path = "/Loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Unreturned loans past their due date", body = Vec<LoanView>)
    )
)]
pub async fn list_overdue_loans(State(state): State<AppState>) -> AppResult<Json<Vec<LoanView>>> {
    let loans = state.services.loans.list_overdue().await?;
    Ok(Json(loans))
}

/// Loan counts by status
#[utoipa::path(
    get,
    path = "/Loans/summary",
    tag = "loans",
    responses(
        (status = 200, description = "Loan counts", body = LoanSummary)
    )
)]
pub async fn loan_summary(State(state): State<AppState>) -> AppResult<Json<LoanSummary>> {
    let summary = state.services.loans.summary().await?;
    Ok(Json(summary))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/Loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = LoanView),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AppPath(loan_id): AppPath<i32>,
) -> AppResult<Json<LoanView>> {
    let loan = state.services.loans.get(loan_id).await?;
    Ok(Json(loan))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/Loans/borrow",
    tag = "loans",
    request_body = BorrowLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanView),
        (status = 400, description = "Missing field or invalid due date", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AppJson(request): AppJson<BorrowLoan>,
) -> AppResult<(StatusCode, Json<LoanView>)> {
    let loan = state.services.loans.borrow(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/Loans/return/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AppPath(loan_id): AppPath<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state.services.loans.return_loan(loan_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}
