// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Polynomial Library
//!
//! Integer polynomials with big integer coefficients, used as the
//! digit-retain polynomials of BGV thin digit extraction.
//!
//! ## Features
//!
//! - Uses `num-bigint` for coefficient representation, lowest degree first.
//! - Parsing from the whitespace-separated text format of precomputed tables.
//! - Spacing detection and decimation (`P(x) = f(x^n)`), used to shrink a
//!   batch of polynomials before Paterson–Stockmeyer evaluation.
//! - Modular helpers: reduction, centering, p-adic valuation.
//! - Serialization: Optional serde support with bincode integration.

pub mod errors;
pub mod polynomial;
pub mod utils;

pub use errors::PolynomialError;
pub use polynomial::{common_spacing, Polynomial};
pub use utils::*;
