//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    /// ISBN-10 or ISBN-13, unique when present
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Book fields embedded in loan responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(max = 255))]
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must have 10 to 17 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Invalid publication year"))]
    pub published_year: Option<i32>,
}

/// Update book request (absent fields are left unchanged)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 500, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must have 10 to 17 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Invalid publication year"))]
    pub published_year: Option<i32>,
}
