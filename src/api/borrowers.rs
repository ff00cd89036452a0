//! Borrower endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
    AppState,
};

use super::{AppJson, AppPath};

/// List all borrowers
#[utoipa::path(
    get,
    path = "/Borrowers",
    tag = "borrowers",
    responses(
        (status = 200, description = "Borrower list", body = Vec<Borrower>)
    )
)]
pub async fn list_borrowers(State(state): State<AppState>) -> AppResult<Json<Vec<Borrower>>> {
    let borrowers = state.services.borrowers.list().await?;
    Ok(Json(borrowers))
}

/// Get borrower by ID
#[utoipa::path(
    get,
    path = "/Borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower details", body = Borrower),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_borrower(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.get_by_id(id).await?;
    Ok(Json(borrower))
}

/// Create a borrower
#[utoipa::path(
    post,
    path = "/Borrowers",
    tag = "borrowers",
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = Borrower),
        (status = 400, description = "Invalid borrower", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate email", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_borrower(
    State(state): State<AppState>,
    AppJson(data): AppJson<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    let borrower = state.services.borrowers.create(&data).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}

/// Update a borrower
#[utoipa::path(
    put,
    path = "/Borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID")),
    request_body = UpdateBorrower,
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_borrower(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(data): AppJson<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.update(id, &data).await?;
    Ok(Json(borrower))
}

/// Delete a borrower without loan history
#[utoipa::path(
    delete,
    path = "/Borrowers/{id}",
    tag = "borrowers",
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 204, description = "Borrower deleted"),
        (status = 404, description = "Borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Borrower has loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_borrower(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.services.borrowers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
