//! Base error type.
//!
//! Sub-crates define their own error enums and convert `CoreError` into them
//! via `From` impls where they need to.

use thiserror::Error;

/// The error type for `spur-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `spur-core`.
pub type CoreResult<T> = Result<T, CoreError>;
