//! Loan (borrow) model and related types

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::BookSummary;
use super::borrower::BorrowerSummary;
use crate::error::{AppError, AppResult};

/// Loan status, derived on every read and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "overdue")]
    Overdue,
    #[serde(alias = "returned")]
    Returned,
}

impl LoanStatus {
    /// Returned if the loan came back, Overdue if the due date is strictly
    /// before `now`, Active otherwise.
    pub fn derive(
        returned_at: Option<DateTime<Utc>>,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        if returned_at.is_some() {
            LoanStatus::Returned
        } else if due_date < now {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }
}

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn status(&self, now: DateTime<Utc>) -> LoanStatus {
        LoanStatus::derive(self.returned_at, self.due_date, now)
    }
}

/// Loan joined with its book and borrower, as read from the store
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LoanRecord {
    #[sqlx(flatten)]
    pub loan: Loan,
    pub book_title: String,
    pub book_author: Option<String>,
    pub borrower_name: String,
}

/// Loan as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub book: BookSummary,
    pub borrower: BorrowerSummary,
}

impl LoanView {
    pub fn from_record(record: LoanRecord, now: DateTime<Utc>) -> Self {
        let status = record.loan.status(now);
        let loan = record.loan;
        Self {
            id: loan.id,
            book_id: loan.book_id,
            borrower_id: loan.borrower_id,
            borrowed_at: loan.borrowed_at,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
            status,
            book: BookSummary {
                id: loan.book_id,
                title: record.book_title,
                author: record.book_author,
            },
            borrower: BorrowerSummary {
                id: loan.borrower_id,
                name: record.borrower_name,
            },
        }
    }
}

/// Borrow request as sent by clients. Every field is required; they are
/// optional here so that a missing field is reported as a validation error.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowLoan {
    pub book_id: Option<i32>,
    pub borrower_id: Option<i32>,
    /// YYYY-MM-DD, or an RFC 3339 timestamp
    pub due_date: Option<String>,
}

/// Validated borrow, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub book_id: i32,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Loan listing filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    /// active, overdue or returned
    pub status: Option<LoanStatus>,
    pub book_id: Option<i32>,
    pub borrower_id: Option<i32>,
}

/// Store-level loan filter, evaluated against a single instant
#[derive(Debug, Clone, PartialEq)]
pub struct LoanFilter {
    pub status: Option<LoanStatus>,
    pub book_id: Option<i32>,
    pub borrower_id: Option<i32>,
    pub now: DateTime<Utc>,
}

impl LoanFilter {
    /// Every loan
    pub fn all(now: DateTime<Utc>) -> Self {
        Self {
            status: None,
            book_id: None,
            borrower_id: None,
            now,
        }
    }

    /// Unreturned loans whose due date is strictly before `now`
    pub fn overdue(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(LoanStatus::Overdue),
            ..Self::all(now)
        }
    }

    pub fn from_query(query: &LoanQuery, now: DateTime<Utc>) -> Self {
        Self {
            status: query.status,
            book_id: query.book_id,
            borrower_id: query.borrower_id,
            now,
        }
    }

    pub fn matches(&self, loan: &Loan) -> bool {
        self.status.map_or(true, |s| loan.status(self.now) == s)
            && self.book_id.map_or(true, |id| loan.book_id == id)
            && self.borrower_id.map_or(true, |id| loan.borrower_id == id)
    }
}

/// Loan counts at a given instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub total: i64,
    pub active: i64,
    pub overdue: i64,
    pub returned: i64,
}

/// Parse a due date sent by a client.
///
/// A bare `YYYY-MM-DD` date means midnight UTC of that day. RFC 3339
/// timestamps and zone-less `YYYY-MM-DDTHH:MM[:SS]` timestamps (taken as UTC)
/// are accepted too.
pub fn parse_due_date(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    let invalid =
        || AppError::Validation(format!("Invalid dueDate '{}': expected YYYY-MM-DD", raw));

    let parsed = parse_timestamp(raw).ok_or_else(invalid)?;
    if !DUE_DATE_YEARS.contains(&parsed.year()) {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Years a due date may fall in; wider values do not fit a `TIMESTAMPTZ`
const DUE_DATE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        return Some(Utc.from_utc_datetime(&midnight));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|ts| Utc.from_utc_datetime(&ts))
}
