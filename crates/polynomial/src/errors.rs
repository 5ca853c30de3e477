// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for polynomial operations.

use thiserror::Error;

/// Errors that can occur during polynomial operations.
#[derive(Debug, Error)]
pub enum PolynomialError {
    /// Invalid polynomial (e.g., empty coefficient list or a bad decimation step)
    #[error("Invalid polynomial: {message}")]
    InvalidPolynomial { message: String },

    /// Modulus operation error
    #[error("Modulus error: {message}")]
    ModulusError { message: String },

    /// Parse error for BigInt
    #[error("Parse error: {0}")]
    ParseError(#[from] num_bigint::ParseBigIntError),
}
