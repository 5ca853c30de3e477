// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Digit Extraction
//!
//! Thin digit extraction for BGV bootstrapping: given a ciphertext over
//! `Z/p^e`, homomorphically compute the plaintext shifted down by its lowest
//! digits.
//!
//! - [`ciphertext`]: the operations a BGV backend must provide, and the
//!   counting [`Evaluator`].
//! - [`schedule`], [`powers`], [`paterson_stockmeyer`]: batched polynomial
//!   evaluation with minimal non-scalar multiplications.
//! - [`table`], [`generator`]: digit-retain polynomials, loaded from disk or
//!   generated.
//! - [`row`], [`trapezoid`]: the row composition and the full extraction.
//! - [`clear`]: a cleartext ciphertext for simulation and testing.

pub mod ciphertext;
pub mod clear;
pub mod config;
pub mod errors;
pub mod generator;
pub mod paterson_stockmeyer;
pub mod powers;
pub mod row;
pub mod schedule;
pub mod table;
pub mod trapezoid;

pub use ciphertext::{Ciphertext, Evaluator, OpCounter, OpCounts};
pub use clear::{expected_extraction, ClearCiphertext};
pub use config::{load_config, ExtractionConfig};
pub use errors::{DigitExtractionError, Result};
pub use generator::{digit_retain_polynomial, generate_table};
pub use paterson_stockmeyer::{evaluate_polynomials, evaluate_with_table};
pub use powers::{DynamicPowers, PowerTable};
pub use row::{RowComposer, RowOutput, RowStrategy};
pub use schedule::{best_parameters, ScheduleParameters};
pub use table::{DigitPolynomialSource, PolynomialTable, TableKey};
pub use trapezoid::{DigitExtractor, ExtractionReport};
