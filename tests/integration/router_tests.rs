//! In-process API tests against the in-memory store

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};

use lending_desk::config::LoansConfig;

use crate::common::{at, ids, TestApp};

const NOW: &str = "2025-01-01T00:00:00Z";

fn seeded(now: &str) -> TestApp {
    let app = TestApp::new(now);
    app.store.seed_book("Dune");
    app.store.seed_book("Emma");
    app.store.seed_book("Ulysses");
    app.store.seed_borrower("Ada");
    app.store.seed_borrower("Grace");
    app
}

#[tokio::test]
async fn test_overdue_borrow_then_return() {
    let app = seeded(NOW);

    let (status, loan) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 1, "borrowerId": 1, "dueDate": "2024-01-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(loan["returnedAt"].is_null());
    assert_eq!(loan["status"], "Overdue");
    assert_eq!(loan["book"]["title"], "Dune");
    assert_eq!(loan["borrower"]["name"], "Ada");
    let loan_id = loan["id"].as_i64().unwrap();

    let (_, overdue) = app.get("/api/Loans/overdue").await;
    assert_eq!(ids(&overdue), vec![loan_id]);

    let (status, body) = app.post(&format!("/api/Loans/return/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert_eq!(body["loan"]["status"], "Returned");
    assert!(body["loan"]["returnedAt"].is_string());

    let (_, all) = app.get("/api/Loans").await;
    assert_eq!(all[0]["status"], "Returned");
    assert!(all[0]["returnedAt"].is_string());

    let (_, overdue) = app.get("/api/Loans/overdue").await;
    assert!(overdue.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_borrow_due_tomorrow_is_active() {
    let app = seeded("2025-01-01T15:00:00Z");

    let (status, loan) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 2, "borrowerId": 2, "dueDate": "2025-01-02"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "Active");
    assert_eq!(loan["borrowedAt"], "2025-01-01T15:00:00Z");

    let (_, overdue) = app.get("/api/Loans/overdue").await;
    assert!(overdue.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_follows_the_clock() {
    let app = seeded(NOW);
    let loan_id = app.borrow(1, 1, "2025-01-10").await;

    let (_, loan) = app.get(&format!("/api/Loans/{}", loan_id)).await;
    assert_eq!(loan["status"], "Active");

    app.clock.set(at("2025-01-10T00:00:01Z"));
    let (_, loan) = app.get(&format!("/api/Loans/{}", loan_id)).await;
    assert_eq!(loan["status"], "Overdue");

    let (_, overdue) = app.get("/api/Loans/overdue").await;
    assert_eq!(ids(&overdue), vec![loan_id]);
}

#[tokio::test]
async fn test_borrow_unknown_references_creates_nothing() {
    let app = seeded(NOW);

    let (status, body) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 99, "borrowerId": 1, "dueDate": "2025-02-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let (status, _) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 1, "borrowerId": 99, "dueDate": "2025-02-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(app.store.loans().is_empty());
}

#[tokio::test]
async fn test_borrow_invalid_arguments() {
    let app = seeded(NOW);

    let bodies = [
        json!({"borrowerId": 1, "dueDate": "2025-02-01"}),
        json!({"bookId": 1, "dueDate": "2025-02-01"}),
        json!({"bookId": 1, "borrowerId": 1}),
        json!({"bookId": 1, "borrowerId": 1, "dueDate": ""}),
        json!({"bookId": 1, "borrowerId": 1, "dueDate": "31/01/2025"}),
        json!({"bookId": 1, "borrowerId": 1, "dueDate": "-5000-01-01"}),
        json!({"bookId": 1, "borrowerId": 1, "dueDate": "+200000-01-01"}),
        json!({"bookId": "one", "borrowerId": 1, "dueDate": "2025-02-01"}),
    ];

    for body in bodies {
        let (status, response) = app.post("/api/Loans/borrow", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {response}");
        assert_eq!(response["error"], "InvalidArgument");
    }

    let (status, _) = app
        .send(
            Request::post("/api/Loans/borrow")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.loans().is_empty());
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_body() {
    let app = seeded(NOW);
    app.borrow(1, 1, "2025-02-01").await;

    let requests = [
        ("POST", "/api/Loans/return/abc"),
        ("GET", "/api/Loans/abc"),
        ("GET", "/api/Loans?status=bogus"),
        ("GET", "/api/Loans?bookId=first"),
        ("GET", "/api/Books/abc"),
        ("DELETE", "/api/Borrowers/abc"),
    ];

    for (method, uri) in requests {
        let (status, body) = app
            .send(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri} -> {body}");
        assert_eq!(body["code"], 4, "{method} {uri} -> {body}");
        assert_eq!(body["error"], "InvalidArgument");
        assert!(body["message"].is_string());
    }

    assert!(app.store.loans().iter().all(|loan| loan.returned_at.is_none()));
}

#[tokio::test]
async fn test_past_due_dates_rejected_when_configured() {
    let app = TestApp::with_loans_config(
        NOW,
        LoansConfig {
            require_future_due_date: true,
        },
    );
    app.store.seed_book("Dune");
    app.store.seed_borrower("Ada");

    let (status, _) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 1, "borrowerId": 1, "dueDate": "2024-01-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 1, "borrowerId": 1, "dueDate": "2025-01-15"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_book_cannot_be_borrowed_twice() {
    let app = seeded(NOW);
    let loan_id = app.borrow(1, 1, "2025-02-01").await;

    let (status, body) = app
        .post(
            "/api/Loans/borrow",
            Some(json!({"bookId": 1, "borrowerId": 2, "dueDate": "2025-02-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    app.post(&format!("/api/Loans/return/{}", loan_id), None).await;
    app.borrow(1, 2, "2025-03-01").await;
    assert_eq!(app.store.loans().len(), 2);
}

#[tokio::test]
async fn test_return_unknown_loan_mutates_nothing() {
    let app = seeded(NOW);
    app.borrow(1, 1, "2025-02-01").await;
    let before = app.store.loans();

    let (status, body) = app.post("/api/Loans/return/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    assert_eq!(app.store.loans(), before);
}

#[tokio::test]
async fn test_returned_at_is_set_once() {
    let app = seeded(NOW);
    let loan_id = app.borrow(1, 1, "2025-02-01").await;

    app.clock.set(at("2025-01-20T12:00:00Z"));
    let (status, _) = app.post(&format!("/api/Loans/return/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.set(at("2025-03-01T00:00:00Z"));
    let (status, _) = app.post(&format!("/api/Loans/return/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, loan) = app.get(&format!("/api/Loans/{}", loan_id)).await;
    assert_eq!(loan["returnedAt"], "2025-01-20T12:00:00Z");
    assert_eq!(loan["status"], "Returned");
}

#[tokio::test]
async fn test_overdue_is_subset_of_derived_status() {
    let app = seeded(NOW);
    let first = app.borrow(1, 1, "2024-12-01").await;
    app.borrow(2, 1, "2025-02-01").await;
    let third = app.borrow(3, 2, "2024-11-01").await;
    app.post(&format!("/api/Loans/return/{}", first), None).await;

    let (_, all) = app.get("/api/Loans").await;
    let (_, overdue) = app.get("/api/Loans/overdue").await;

    let derived: Vec<i64> = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|l| l["status"] == "Overdue")
        .map(|l| l["id"].as_i64().unwrap())
        .collect();

    assert_eq!(ids(&overdue), vec![third]);
    assert_eq!(ids(&overdue), derived);
}

#[tokio::test]
async fn test_overdue_toggle_returns_full_list() {
    let app = seeded(NOW);
    app.borrow(1, 1, "2024-12-01").await;
    app.borrow(2, 2, "2025-02-01").await;

    let (_, all) = app.get("/api/Loans").await;
    let (_, overdue) = app.get("/api/Loans/overdue").await;
    let (_, again) = app.get("/api/Loans").await;

    assert_eq!(ids(&all), vec![1, 2]);
    assert_eq!(ids(&overdue), vec![1]);
    assert_eq!(all, again);
}

#[tokio::test]
async fn test_list_filters_and_summary() {
    let app = seeded(NOW);
    let returned = app.borrow(1, 1, "2024-12-01").await;
    app.borrow(2, 1, "2025-02-01").await;
    app.borrow(3, 2, "2024-11-01").await;
    app.post(&format!("/api/Loans/return/{}", returned), None).await;

    let (_, active) = app.get("/api/Loans?status=active").await;
    assert_eq!(ids(&active), vec![2]);

    let (_, by_borrower) = app.get("/api/Loans?borrowerId=1").await;
    assert_eq!(ids(&by_borrower), vec![1, 2]);

    let (_, overdue_for_book) = app.get("/api/Loans?status=overdue&bookId=3").await;
    assert_eq!(ids(&overdue_for_book), vec![3]);

    let (status, _) = app.get("/api/Loans?status=lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, summary) = app.get("/api/Loans/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary,
        json!({"total": 3, "active": 1, "overdue": 1, "returned": 1})
    );
}

#[tokio::test]
async fn test_book_and_borrower_catalog() {
    let app = TestApp::new(NOW);

    let (status, book) = app
        .post(
            "/api/Books",
            Some(json!({"title": "Dune", "author": "Frank Herbert", "publishedYear": 1965})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["publishedYear"], 1965);

    let (status, body) = app.post("/api/Books", Some(json!({"title": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidArgument");

    let (status, borrower) = app
        .post("/api/Borrowers", Some(json!({"name": "Ada", "email": "ada@example.org"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post("/api/Borrowers", Some(json!({"name": "Ada 2", "email": "ada@example.org"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = app
        .put("/api/Books/1", json!({"title": "Dune Messiah"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["author"], "Frank Herbert");

    let (_, books) = app.get("/api/Books").await;
    assert_eq!(books.as_array().unwrap().len(), 1);
    let (_, borrowers) = app.get("/api/Borrowers").await;
    assert_eq!(borrowers[0]["name"], borrower["name"]);

    let (status, _) = app.get("/api/Borrowers/7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lent_books_and_borrowers_cannot_be_deleted() {
    let app = seeded(NOW);
    let loan_id = app.borrow(1, 1, "2025-02-01").await;
    app.post(&format!("/api/Loans/return/{}", loan_id), None).await;

    let (status, _) = app.delete("/api/Books/1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.delete("/api/Borrowers/1").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.delete("/api/Books/2").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = app.get("/api/Books/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, loan) = app.get(&format!("/api/Loans/{}", loan_id)).await;
    assert_eq!(loan["book"]["title"], "Dune");
}

#[tokio::test]
async fn test_cors_allows_only_configured_origin() {
    let app = TestApp::new(NOW);

    let preflight = |origin: &str| {
        Request::options("/api/Loans/borrow")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = tower::ServiceExt::oneshot(app.router.clone(), preflight("http://localhost:5173"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(headers["access-control-allow-credentials"], "true");

    let response = tower::ServiceExt::oneshot(app.router.clone(), preflight("http://evil.example"))
        .await
        .unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_health_and_docs() {
    let app = TestApp::new(NOW);

    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/api/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let (status, doc) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/Loans/borrow"].is_object());
}
