//! Lending Desk
//!
//! A small library-management server providing a REST JSON API over books,
//! borrowers and the loans linking them: borrow, return, and overdue tracking.

use std::sync::Arc;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
