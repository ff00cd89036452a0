//! Book catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook, UpdateBook},
    AppState,
};

use super::{AppJson, AppPath};

/// List all books
#[utoipa::path(
    get,
    path = "/Books",
    tag = "books",
    responses(
        (status = 200, description = "Book list", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/Books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/Books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate ISBN", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AppJson(data): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(&data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/Books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(data): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.update(id, &data).await?;
    Ok(Json(book))
}

/// Delete a book that has never been lent
#[utoipa::path(
    delete,
    path = "/Books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book has loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
