//! Engagement API
//!
//! REST shell over the Elosya ledger: users, videos, engagement events,
//! coin gifts and earnings reports.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;

pub use config::Config;
pub use errors::{ApiError, Result};
