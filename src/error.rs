//! Error types for trackfolio
//!
//! This module defines domain-specific error types that provide clear,
//! actionable error messages to users.

use thiserror::Error;

/// Validation errors raised by the allocation editor at submit time.
///
/// These errors are shown directly to users and should be clear and actionable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select at least one asset")]
    NoAssetsSelected,

    #[error("Total allocation must equal 100%")]
    TotalNotHundred,

    #[error("Please provide a portfolio name")]
    NameRequired,
}

/// Errors from talking to the metrics backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
