// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for digit extraction.

use recrypt_polynomial::PolynomialError;
use thiserror::Error;

/// Errors raised while scheduling, evaluating or composing digit extraction.
///
/// Every variant is a precondition failure detected before the ciphertext
/// handed to the failing operation is mutated.
#[derive(Error, Debug)]
pub enum DigitExtractionError {
    /// Caller supplied arguments outside the operation's domain
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No digit-retain polynomial is available for the requested step
    #[error("No digit-retain polynomial for p={prime}, inner precision {inner}, target {target}")]
    MissingPolynomial { prime: u64, inner: u32, target: u32 },

    /// A coefficient block does not fit the baby-step table
    #[error("Schedule too small: block of {block} coefficients with k = {k}")]
    ScheduleTooSmall { block: usize, k: usize },

    /// A baby-step power was requested that the table never computed
    #[error("Power x^{exponent} is not available in this table")]
    UnavailablePower { exponent: usize },

    /// Malformed polynomial table on disk
    #[error("Table error: {message}")]
    Table { message: String },

    #[error(transparent)]
    Polynomial(#[from] PolynomialError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),
}

/// Result type alias for digit extraction operations
pub type Result<T> = std::result::Result<T, DigitExtractionError>;

impl DigitExtractionError {
    /// Create an invalid argument error with a message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DigitExtractionError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a table error with a message
    pub fn table(message: impl Into<String>) -> Self {
        DigitExtractionError::Table {
            message: message.into(),
        }
    }
}
