//! Common types and utilities shared across askweb crates.
//!
//! This crate holds the shared error type and the observability helpers used
//! throughout the workspace. It stays dependency‑light so that every crate can
//! depend on it without pulling in the HTTP or LLM stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`AskwebError`] and [`Result`]: Shared error handling
//! - [`snippet`]: Log-safe truncation of long strings
//!
//! # Examples
//!
//! ```rust
//! use askweb_common::{AskwebError, Result};
//!
//! fn needs_key(key: &str) -> Result<()> {
//!     if key.is_empty() {
//!         return Err(AskwebError::Config("missing api key".into()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(needs_key("").is_err());
//! assert!(needs_key("gsk_123").is_ok());
//! ```

pub mod observability;

/// Error types used across askweb crates.
#[derive(thiserror::Error, Debug)]
pub enum AskwebError {
    /// An external provider (language model, search API) rejected or failed a call.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded its timeout.
    #[error("Timeout occurred")]
    Timeout,

    /// Anything else bubbling up from helper code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`AskwebError`].
pub type Result<T> = std::result::Result<T, AskwebError>;

/// Truncate `text` to at most `max_chars` characters for log output, appending
/// an ellipsis when something was cut.
///
/// ```
/// assert_eq!(askweb_common::snippet("abcdef", 3), "abc…");
/// assert_eq!(askweb_common::snippet("abc", 3), "abc");
/// ```
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
