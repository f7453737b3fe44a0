//! Lost & Found server
//!
//! REST JSON API of a municipal lost and found service: citizens declare
//! lost or found items, police officers organise their restitution and
//! administrators manage stations and accounts.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod workflow;

pub use api::create_router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
