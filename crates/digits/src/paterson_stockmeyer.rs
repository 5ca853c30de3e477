// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Paterson–Stockmeyer evaluation of plaintext polynomials on a ciphertext.

use crate::ciphertext::{Ciphertext, Evaluator};
use crate::powers::PowerTable;
use crate::schedule::best_parameters;
use crate::{DigitExtractionError, Result};
use num_bigint::BigInt;
use num_traits::{One, Zero};
use rayon::prelude::*;
use recrypt_polynomial::{common_spacing, prime_power, Polynomial};
use tracing::debug;

/// Evaluates `coeffs[i] * x^(i+1)` summed over the block, splitting at
/// `k * 2^(level-1)` and joining the halves with giant-step powers.
///
/// Returns `None` for an all-zero block so that no multiplication is spent
/// on it.
fn evaluate_block<C: Ciphertext>(
    coeffs: &[BigInt],
    table: &PowerTable<C>,
    level: usize,
    lazy: bool,
    evaluator: &Evaluator,
) -> Result<Option<C>> {
    if coeffs.iter().all(Zero::is_zero) {
        return Ok(None);
    }

    if level == 0 {
        if coeffs.len() > table.k() {
            return Err(DigitExtractionError::ScheduleTooSmall {
                block: coeffs.len(),
                k: table.k(),
            });
        }
        let mut acc: Option<C> = None;
        for (i, coeff) in coeffs.iter().enumerate() {
            if coeff.is_zero() {
                continue;
            }
            let mut term = table.baby(i + 1)?.clone();
            if *coeff == -BigInt::one() {
                term.negate();
            } else if !coeff.is_one() {
                term.mul_scalar(coeff);
            }
            match acc.as_mut() {
                Some(sum) => sum.add_assign(&term),
                None => acc = Some(term),
            }
        }
        return Ok(acc);
    }

    let split = std::cmp::min(table.k() << (level - 1), coeffs.len());
    let (low, high) = coeffs.split_at(split);
    let low = evaluate_block(low, table, level - 1, lazy, evaluator)?;
    let Some(mut high) = evaluate_block(high, table, level - 1, lazy, evaluator)? else {
        return Ok(low);
    };
    evaluator.multiply(&mut high, table.giant(level - 1)?, lazy);
    Ok(Some(match low {
        Some(mut low) => {
            low.add_assign(&high);
            low
        }
        None => high,
    }))
}

/// Evaluates `poly` on the ciphertext whose powers are in `table`.
///
/// Coefficients are taken in balanced form modulo the plaintext modulus of
/// `x`. The result is relinearized.
pub fn evaluate_with_table<C: Ciphertext>(
    poly: &Polynomial,
    table: &PowerTable<C>,
    lazy: bool,
    evaluator: &Evaluator,
) -> Result<C> {
    let x = table.baby(1)?;
    let modulus = prime_power(x.plaintext_prime(), x.plaintext_exponent());
    let poly = poly.reduce_and_center(&modulus).trim_trailing_zeros();
    let coeffs = poly.coefficients();

    let mut result = match coeffs.split_first() {
        Some((_, rest)) => {
            let capacity = table.k() << table.m();
            if rest.len() > capacity {
                return Err(DigitExtractionError::ScheduleTooSmall {
                    block: rest.len(),
                    k: table.k(),
                });
            }
            evaluate_block(rest, table, table.m(), lazy, evaluator)?
        }
        None => None,
    }
    .unwrap_or_else(|| x.zero_like());

    if let Some(constant) = coeffs.first().filter(|c| !c.is_zero()) {
        result.add_scalar(constant);
    }
    evaluator.relinearize(&mut result);
    Ok(result)
}

/// Evaluates every polynomial of the batch on `x`, sharing one power table.
///
/// The batch is first rewritten in `x^s` when every polynomial only uses
/// exponents that are multiples of `s`. With `parallel` set the individual
/// evaluations run on the rayon pool; results keep the input order.
pub fn evaluate_polynomials<C: Ciphertext>(
    polys: &[Polynomial],
    x: &C,
    lazy: bool,
    parallel: bool,
    evaluator: &Evaluator,
) -> Result<Vec<C>> {
    if polys.is_empty() {
        return Err(DigitExtractionError::invalid_argument(
            "cannot evaluate an empty polynomial batch",
        ));
    }
    if let Some(i) = polys.iter().position(|p| p.degree().unwrap_or(0) == 0) {
        return Err(DigitExtractionError::invalid_argument(format!(
            "polynomial {i} has degree <= 0"
        )));
    }

    let spacing = common_spacing(polys);
    let (input, polys) = if spacing > 1 {
        let decimated = polys
            .iter()
            .map(|p| p.decimate(spacing))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        (evaluator.power(x, spacing)?, decimated)
    } else {
        (x.clone(), polys.to_vec())
    };

    let params = best_parameters(&polys, lazy)?;
    debug!(
        spacing,
        k = params.k,
        m = params.m,
        predicted = params.multiplications,
        "evaluating polynomial batch"
    );
    let table = PowerTable::build(&input, &params, lazy, evaluator)?;

    if parallel {
        polys
            .par_iter()
            .map(|poly| evaluate_with_table(poly, &table, lazy, evaluator))
            .collect()
    } else {
        polys
            .iter()
            .map(|poly| evaluate_with_table(poly, &table, lazy, evaluator))
            .collect()
    }
}
