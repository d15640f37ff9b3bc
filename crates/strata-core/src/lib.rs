//! Core types, configuration, and error handling for the Strata platform.
//!
//! This crate provides the shared foundation used by all other Strata crates:
//! - [`StrataError`] — unified error type using `thiserror`
//! - [`StrataConfig`] — configuration loaded from `.strata.toml`
//! - [`FileKey`] — the normalized repository-relative path every analysis
//!   joins on

mod config;
mod error;
mod filekey;
mod output;

pub use config::{AnalyticsConfig, HistoryConfig, LayoutConfig, StrataConfig};
pub use error::StrataError;
pub use filekey::FileKey;
pub use output::OutputFormat;

/// A convenience `Result` type for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
