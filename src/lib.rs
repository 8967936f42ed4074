//! Jubilee Internal Library Lending Server
//!
//! A Rust implementation of the Jubilee knowledge library backend,
//! providing a REST JSON API for the borrow-request lifecycle: catalog,
//! requests, approvals, the borrow ledger, and the overdue sweep.

use std::sync::Arc;

use sqlx::PgPool;

pub mod api;
pub mod config;
pub mod db;
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
    pub pool: PgPool,
}
