// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Reference generation of digit-retain polynomials.
//!
//! The generated polynomial maps every `x mod p^e` to its lowest digit:
//! the balanced digit in `[-(p-1)/2, (p-1)/2]` for odd `p`, the bit for
//! `p = 2`. Since the digit only depends on `x mod p`, the same polynomial
//! serves every inner precision. Optimised tables that exploit a larger
//! inner precision have lower degree and are loaded from disk instead.

use crate::table::{PolynomialTable, TableKey};
use crate::{DigitExtractionError, Result};
use num_bigint::BigInt;
use num_traits::{One, Zero};
use recrypt_polynomial::{mod_inverse, prime_power, reduce, valuation, Polynomial};
use std::collections::BTreeMap;
use tracing::debug;

/// Lowest digit of `j` in the representation used for prime `p`.
fn lowest_digit(j: u64, prime: u64) -> i64 {
    let digit = (j % prime) as i64;
    if prime > 2 && digit > (prime / 2) as i64 {
        digit - prime as i64
    } else {
        digit
    }
}

/// The polynomial of smallest degree in the falling-factorial basis that
/// agrees with the lowest-digit function on all of `Z/p^e`.
///
/// Coefficients are balanced modulo `p^e`. For odd `p` only odd-degree terms
/// survive, since the balanced digit is an odd function.
pub fn digit_retain_polynomial(prime: u64, precision: u32) -> Result<Polynomial> {
    if prime < 2 || precision == 0 {
        return Err(DigitExtractionError::invalid_argument(format!(
            "cannot build a digit-retain polynomial for p={prime}, e={precision}"
        )));
    }

    let modulus = prime_power(prime, precision);
    let mut result = Polynomial::zero();
    // x (x-1) .. (x-k+1)
    let mut falling = Polynomial::constant(BigInt::one());
    let mut factorial = BigInt::one();
    // valuation of k!
    let mut factorial_valuation = 0u32;
    // f(0), f(1), .., f(k)
    let mut samples: Vec<BigInt> = Vec::new();

    let mut k: u64 = 0;
    while factorial_valuation < precision {
        samples.push(BigInt::from(lowest_digit(k, prime)));

        // k-th forward difference of f at 0
        let mut difference = BigInt::zero();
        let mut binomial = BigInt::one();
        for (j, sample) in samples.iter().enumerate() {
            let term = &binomial * sample;
            if (k - j as u64) % 2 == 0 {
                difference += term;
            } else {
                difference -= term;
            }
            binomial = binomial * BigInt::from(k - j as u64) / BigInt::from(j as u64 + 1);
        }

        if !reduce(&difference, &modulus).is_zero() {
            if valuation(&difference, prime)? < factorial_valuation {
                return Err(DigitExtractionError::invalid_argument(format!(
                    "lowest digit is not a polynomial function modulo {prime}^{precision}"
                )));
            }
            let scale = prime_power(prime, factorial_valuation);
            let reduced_modulus = prime_power(prime, precision - factorial_valuation);
            let unit = &factorial / &scale;
            let inverse = mod_inverse(&unit, &reduced_modulus).ok_or_else(|| {
                DigitExtractionError::invalid_argument("factorial unit is not invertible")
            })?;
            let coefficient = reduce(&(&difference / &scale * inverse), &reduced_modulus);
            result = result.add(&falling.scalar_mul(&coefficient));
        }

        k += 1;
        falling = falling.mul(&Polynomial::from_i64s(&[-(k as i64 - 1), 1]));
        factorial *= BigInt::from(k);
        let mut n = k;
        while n % prime == 0 {
            factorial_valuation += 1;
            n /= prime;
        }
    }

    let mut result = result.reduce_and_center(&modulus);
    if prime > 2 {
        let odd_part = result
            .coefficients()
            .iter()
            .enumerate()
            .map(|(i, c)| if i % 2 == 1 { c.clone() } else { BigInt::zero() })
            .collect();
        result = Polynomial::new(odd_part);
    }
    Ok(result.trim_trailing_zeros())
}

/// Builds a table holding, for each inner precision, the digit-retain
/// polynomials for every target precision up to `max_precision`.
pub fn generate_table(prime: u64, inners: &[u32], max_precision: u32) -> Result<PolynomialTable> {
    let mut by_target: BTreeMap<u32, Polynomial> = BTreeMap::new();
    let mut table = PolynomialTable::new();
    for &inner in inners {
        for target in inner + 1..=max_precision {
            let polynomial = match by_target.get(&target) {
                Some(p) => p.clone(),
                None => {
                    let p = digit_retain_polynomial(prime, target)?;
                    by_target.insert(target, p.clone());
                    p
                }
            };
            table.insert(TableKey::new(prime, inner, target), polynomial);
        }
    }
    debug!(prime, ?inners, max_precision, entries = table.len(), "generated polynomial table");
    Ok(table)
}
