//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowers, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending Desk API",
        version = "0.1.0",
        description = "Library loan tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::list_loans,
        loans::list_overdue_loans,
        loans::loan_summary,
        loans::get_loan,
        loans::borrow_book,
        loans::return_book,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowers
        borrowers::list_borrowers,
        borrowers::get_borrower,
        borrowers::create_borrower,
        borrowers::update_borrower,
        borrowers::delete_borrower,
    ),
    components(
        schemas(
            // Loans
            crate::models::loan::LoanView,
            crate::models::loan::LoanStatus,
            crate::models::loan::BorrowLoan,
            crate::models::loan::LoanSummary,
            loans::ReturnResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowers
            crate::models::borrower::Borrower,
            crate::models::borrower::BorrowerSummary,
            crate::models::borrower::CreateBorrower,
            crate::models::borrower::UpdateBorrower,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Borrow, return and list loans"),
        (name = "books", description = "Book catalog"),
        (name = "borrowers", description = "Borrower management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
