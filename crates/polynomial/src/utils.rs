// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Utility functions for modular arithmetic on coefficients.

use crate::errors::PolynomialError;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

/// Reduces a number modulo a modulus and centers it.
///
/// The result lies in the symmetric range `[−(modulus−1)/2, (modulus−1)/2]`
/// for odd moduli and in `[−modulus/2, modulus/2)` for even ones.
///
/// # Arguments
///
/// * `x` - The number to be reduced and centered.
/// * `modulus` - The modulus used for reduction.
/// * `half_modulus` - Half of the modulus, used to center the result.
pub fn reduce_and_center(x: &BigInt, modulus: &BigInt, half_modulus: &BigInt) -> BigInt {
    let mut r = reduce(x, modulus);

    if modulus.is_odd() {
        if r > *half_modulus {
            r -= modulus;
        }
    } else if r >= *half_modulus {
        r -= modulus;
    }

    r
}

/// Reduces a number modulo a modulus into `[0, modulus)`.
pub fn reduce(x: &BigInt, modulus: &BigInt) -> BigInt {
    let mut r = x % modulus;
    if r < BigInt::zero() {
        r += modulus;
    }
    r
}

/// Reduces and centers a slice of coefficients in place.
pub fn reduce_and_center_coefficients_mut(coefficients: &mut [BigInt], modulus: &BigInt) {
    let half_modulus = modulus / 2;
    coefficients
        .iter_mut()
        .for_each(|x| *x = reduce_and_center(x, modulus, &half_modulus));
}

/// Returns `prime^exponent` as a `BigInt`.
pub fn prime_power(prime: u64, exponent: u32) -> BigInt {
    num_traits::pow(BigInt::from(prime), exponent as usize)
}

/// The p-adic valuation of `x`, i.e. the largest `v` with `p^v | x`.
///
/// # Errors
///
/// Returns `PolynomialError::ModulusError` when `x` is zero (infinite
/// valuation) or when `prime` is smaller than two.
pub fn valuation(x: &BigInt, prime: u64) -> Result<u32, PolynomialError> {
    if prime < 2 {
        return Err(PolynomialError::ModulusError {
            message: format!("valuation base must be at least 2, got {prime}"),
        });
    }
    if x.is_zero() {
        return Err(PolynomialError::ModulusError {
            message: "valuation of zero is unbounded".to_string(),
        });
    }

    let p = BigInt::from(prime);
    let mut v = 0;
    let mut rest = x.clone();
    loop {
        let (q, r) = rest.div_rem(&p);
        if !r.is_zero() {
            break;
        }
        rest = q;
        v += 1;
    }
    Ok(v)
}

/// Modular inverse of `x` modulo `modulus`, if it exists.
pub fn mod_inverse(x: &BigInt, modulus: &BigInt) -> Option<BigInt> {
    let egcd = reduce(x, modulus).extended_gcd(modulus);
    if !egcd.gcd.is_one() {
        return None;
    }
    Some(reduce(&egcd.x, modulus))
}
