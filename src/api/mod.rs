//! API handlers for the lending desk REST endpoints

pub mod books;
pub mod borrowers;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::CorsConfig,
    error::{AppError, AppResult},
    AppState,
};

/// JSON body extractor whose rejections use the application error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path extractor reporting malformed segments as `InvalidArgument`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Query string extractor reporting bad parameters as `InvalidArgument`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Build the CORS policy: one allowed origin, credentials allowed
pub fn cors_layer(config: &CorsConfig) -> AppResult<CorsLayer> {
    let origin = HeaderValue::from_str(&config.allowed_origin).map_err(|e| {
        AppError::Internal(format!("Invalid CORS origin {:?}: {}", config.allowed_origin, e))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true))
}

/// Create the application router with all routes
pub fn router(state: AppState) -> AppResult<Router> {
    let cors = cors_layer(&state.config.cors)?;
    let swagger = state.config.server.swagger;

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Loans
        .route("/Loans", get(loans::list_loans))
        .route("/Loans/overdue", get(loans::list_overdue_loans))
        .route("/Loans/summary", get(loans::loan_summary))
        .route("/Loans/borrow", post(loans::borrow_book))
        .route("/Loans/return/:id", post(loans::return_book))
        .route("/Loans/:id", get(loans::get_loan))
        // Books
        .route("/Books", get(books::list_books).post(books::create_book))
        .route(
            "/Books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Borrowers
        .route("/Borrowers", get(borrowers::list_borrowers).post(borrowers::create_borrower))
        .route(
            "/Borrowers/:id",
            get(borrowers::get_borrower)
                .put(borrowers::update_borrower)
                .delete(borrowers::delete_borrower),
        )
        .with_state(state);

    let mut app = Router::new().nest("/api", api);
    if swagger {
        app = app.merge(openapi::create_openapi_router());
    }

    Ok(app
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}
