//! Data models for the lending desk

pub mod book;
pub mod borrower;
pub mod loan;
