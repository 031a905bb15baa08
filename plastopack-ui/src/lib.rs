//! # PlastoPack UI service
//!
//! Web service for the BOPP tape rate-card system:
//! - REST API for login/OTP, user administration, material rates,
//!   rate history and cost calculation
//! - The pricing engine (pure cost-sheet computation)
//! - The rate-update workflow (edit session, batched persistence,
//!   history recording)
//! - Printable rate-card rendering

pub mod api;
pub mod pricing;
pub mod workflow;

pub use api::{create_router, AppState};
