//! Syndica - multi-platform social publishing pipeline
//!
//! This library provides the core publishing machinery for delivering one
//! post to many social platforms: per-platform adapters, sliding-window rate
//! limiting, bounded retry, content validation/formatting and bulk CSV
//! import/export.

pub mod config;
pub mod csv;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod platforms;
pub mod rate_limit;
pub mod requirements;
pub mod retry;
pub mod scheduling;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{PlatformError, Result, SyndicaError};
pub use platforms::{AdapterCore, AdapterRegistry, PlatformAdapter};
pub use rate_limit::{RateLimiter, SqliteStore};
pub use retry::RetryPolicy;
pub use service::{BulkService, PublishingService};
pub use types::{PlatformKind, Post, PostStatus, PublishContent, PublishResult};
