//! # PlastoPack Common Library
//!
//! Shared code for the PlastoPack rate-card service:
//! - Database schema, models and queries (rates, history, users)
//! - Canonical material-rate key tables and defaults
//! - Error types
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod rates;

pub use error::{Error, Result};
