//! Core types, configuration, and error handling for Lookout.
//!
//! This crate provides the shared foundation used by the review crate and
//! the binary:
//! - [`LookoutError`] — unified error type using `thiserror`
//! - [`LookoutConfig`] — configuration loaded from `.lookout.toml`
//! - Shared types: [`PrTarget`], [`PullRequest`], [`ReviewOutput`]

mod config;
mod error;
mod types;

pub use config::{AgentConfig, GitHubConfig, LookoutConfig};
pub use error::LookoutError;
pub use types::{HeadRef, PrTarget, PullRequest, ReviewOutput};

/// A convenience `Result` type for Lookout operations.
pub type Result<T> = std::result::Result<T, LookoutError>;
