//! Error types and result type for the ebook-utils crate.
//!
//! This module defines all error variants that can occur when using the
//! text helpers. It uses the `snafu` library for ergonomic error handling
//! with automatic backtrace capture.
//!
//! # Examples
//!
//! ```
//! use ebook_utils::{Result, UtilError};
//!
//! fn pick_encoding(label: &str) -> Result<()> {
//!     // Return an error
//!     Err(UtilError::invalid_parameter(format!("Unknown encoding: {}", label)))
//! }
//!
//! fn handle_error() {
//!     match pick_encoding("martian-7") {
//!         Ok(()) => println!("Success"),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Variants
//!
//! - [`UtilError::Io`]: I/O errors from the wrapped output stream
//! - [`UtilError::Format`]: a value's textual conversion failed
//! - [`UtilError::InvalidParameter`]: Invalid function parameters

use std::fmt;
use std::io;
use snafu::{Snafu, Backtrace};

// Re-export snafu for context providers
pub use snafu;

/// Main error type for the ebook-utils crate.
///
/// All errors include automatic backtrace capture for debugging purposes.
/// Use the helper methods on `UtilError` for convenient error construction.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum UtilError {
    /// I/O error occurred while writing to or flushing the wrapped stream.
    #[snafu(display("IO error: {source}"))]
    Io {
        source: io::Error,
        backtrace: Backtrace,
    },

    /// A value's `Display` implementation failed while it was being
    /// coerced to text for comparison.
    #[snafu(display("Textual conversion failed: {source}"))]
    Format {
        source: fmt::Error,
        backtrace: Backtrace,
    },

    /// Function was called with invalid parameters.
    #[snafu(display("Invalid parameter: {message}"))]
    InvalidParameter {
        message: String,
        backtrace: Backtrace,
    },
}

// For automatic conversions from standard error types
impl From<io::Error> for UtilError {
    fn from(source: io::Error) -> Self {
        Self::Io { source, backtrace: Backtrace::capture() }
    }
}

impl From<fmt::Error> for UtilError {
    fn from(source: fmt::Error) -> Self {
        Self::Format { source, backtrace: Backtrace::capture() }
    }
}

/// Helper methods for creating errors without context providers.
impl UtilError {
    /// Creates an `InvalidParameter` error with the given message.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebook_utils::UtilError;
    ///
    /// let error = UtilError::invalid_parameter("Encoding label cannot be empty");
    /// ```
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Checks if this error is an `Io` variant.
    pub fn is_io(&self) -> bool {
        if let UtilError::Io { .. } = self {
            return true;
        }
        false
    }
}

/// A specialized `Result` type for ebook-utils operations.
///
/// This is a convenience type alias that uses [`UtilError`] as the error type.
pub type Result<T, E = UtilError> = std::result::Result<T, E>;
