//! DrugReg Common Library
//!
//! Shared code for the DrugReg regulatory data-of-record service:
//! - Domain models, repositories and joined projections
//! - Validation engine and collapse-patch helpers
//! - Strict request decoding
//! - Error types and handling
//! - Configuration management
//! - Bearer authentication
//! - Cross-service drug notifier
//! - Metrics and observability

pub mod auth;
pub mod codec;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod notifier;
pub mod patch;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::DbPool;
pub use errors::{AppError, Result};
pub use notifier::{Confirmation, DrugNotifier};
pub use validation::ValidationEngine;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
