//! Equipment Loan Server
//!
//! Tracks equipment borrowed from an inventory: who borrowed which part,
//! when it is due, and whether it came back or was lost. Exposes a REST
//! JSON API over the loan lifecycle with an append-only audit history.

use std::sync::Arc;

pub mod api;
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
