//! Borrower (library patron) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Borrower model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Borrower {
    pub id: i32,
    pub name: String,
    /// Unique when present
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Borrower fields embedded in loan responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerSummary {
    pub id: i32,
    pub name: String,
}

/// Create borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrower {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

/// Update borrower request (absent fields are left unchanged)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBorrower {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}
