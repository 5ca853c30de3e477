// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Polynomial arithmetic over the integers.

use crate::errors::PolynomialError;
use crate::utils::{reduce, reduce_and_center_coefficients_mut};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A polynomial represented by its coefficients in ascending order of degree.
///
/// Index `i` holds the coefficient of `x^i`, so the polynomial is
/// `a_0 + a_1 * x + ... + a_n * x^n`. This is the order used by the offline
/// digit-retain tables, which list coefficients lowest degree first.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polynomial {
    /// Coefficients in ascending order (constant term first).
    pub(crate) coefficients: Vec<BigInt>,
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (degree, coeff) in self.coefficients.iter().enumerate().rev() {
            if coeff.is_zero() {
                continue;
            }

            if !first {
                if coeff.is_positive() {
                    write!(f, " + ")?;
                } else {
                    write!(f, " - ")?;
                }
            } else if coeff.is_negative() {
                write!(f, "-")?;
            }
            first = false;

            let abs_coeff = coeff.abs();
            if degree == 0 || !abs_coeff.is_one() {
                write!(f, "{abs_coeff}")?;
            }

            if degree > 0 {
                write!(f, "x")?;
                if degree > 1 {
                    write!(f, "^{degree}")?;
                }
            }
        }

        if first {
            write!(f, "0")?;
        }

        Ok(())
    }
}

impl FromStr for Polynomial {
    type Err = PolynomialError;

    /// Parses whitespace-separated integer coefficients, lowest degree first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coefficients = s
            .split_whitespace()
            .map(BigInt::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if coefficients.is_empty() {
            return Err(PolynomialError::InvalidPolynomial {
                message: "no coefficients found".to_string(),
            });
        }

        Ok(Self { coefficients })
    }
}

impl Polynomial {
    /// Creates a new polynomial from a vector of coefficients.
    ///
    /// # Arguments
    ///
    /// * `coefficients` - Vector of coefficients in ascending order of degree.
    pub fn new(coefficients: Vec<BigInt>) -> Self {
        Self { coefficients }
    }

    /// Creates a polynomial from small integer coefficients in ascending order.
    pub fn from_i64s(coefficients: &[i64]) -> Self {
        Self::new(coefficients.iter().map(|c| BigInt::from(*c)).collect())
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Self {
            coefficients: Vec::new(),
        }
    }

    /// Creates a constant polynomial.
    pub fn constant(constant: BigInt) -> Self {
        Self {
            coefficients: vec![constant],
        }
    }

    /// Returns the coefficients of the polynomial, constant term first.
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coefficients
    }

    /// Returns the index of the highest nonzero coefficient.
    ///
    /// The zero polynomial has no degree.
    pub fn degree(&self) -> Option<usize> {
        self.coefficients.iter().rposition(|c| !c.is_zero())
    }

    /// Checks if the polynomial is zero.
    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_zero())
    }

    /// Removes zero coefficients above the degree.
    pub fn trim_trailing_zeros(mut self) -> Self {
        let len = self.degree().map_or(0, |d| d + 1);
        self.coefficients.truncate(len);
        self
    }

    /// Returns true when every even-degree coefficient is zero.
    ///
    /// A zero constant term is required, so `x^3 + x` is odd but `x + 1` is not.
    pub fn is_odd(&self) -> bool {
        self.coefficients
            .iter()
            .step_by(2)
            .all(|coefficient| coefficient.is_zero())
    }

    /// Adds two polynomials together.
    pub fn add(&self, other: &Self) -> Self {
        let max_length = std::cmp::max(self.coefficients.len(), other.coefficients.len());
        let mut result = vec![BigInt::zero(); max_length];

        for (i, coeff) in self.coefficients.iter().enumerate() {
            result[i] += coeff;
        }
        for (i, coeff) in other.coefficients.iter().enumerate() {
            result[i] += coeff;
        }

        Polynomial::new(result)
    }

    /// Multiplies two polynomials using the schoolbook algorithm.
    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }

        let product_len = self.coefficients.len() + other.coefficients.len() - 1;
        let mut product = vec![BigInt::zero(); product_len];

        for (i, a) in self.coefficients.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                product[i + j] += a * b;
            }
        }

        Polynomial::new(product)
    }

    /// Multiplies each coefficient of the polynomial by a scalar.
    pub fn scalar_mul(&self, scalar: &BigInt) -> Self {
        Polynomial::new(self.coefficients.iter().map(|x| x * scalar).collect())
    }

    /// Reduces coefficients modulo `modulus` and centers them around zero.
    pub fn reduce_and_center(&self, modulus: &BigInt) -> Self {
        let mut coefficients = self.coefficients.clone();
        reduce_and_center_coefficients_mut(&mut coefficients, modulus);
        Polynomial::new(coefficients)
    }

    /// Evaluates the polynomial at `x` modulo `modulus`, result in `[0, modulus)`.
    pub fn evaluate_mod(&self, x: &BigInt, modulus: &BigInt) -> BigInt {
        let x = reduce(x, modulus);
        self.coefficients.iter().rev().fold(BigInt::zero(), |acc, coeff| {
            reduce(&(acc * &x + coeff), modulus)
        })
    }

    /// Largest `n` such that the polynomial is `f(x^n)` for some `f`.
    ///
    /// The gcd of the gaps between consecutive nonzero exponents, starting
    /// from exponent zero. A constant polynomial reports its stored degree
    /// (or 1 when that is zero) so that decimation stays well defined.
    pub fn spacing(&self) -> usize {
        let degree = self.degree().unwrap_or(0);
        let mut spacing = degree;
        let mut last = 0usize;
        for (i, coeff) in self.coefficients.iter().enumerate().skip(1) {
            if coeff.is_zero() {
                continue;
            }
            spacing = spacing.gcd(&(i - last));
            last = i;
        }
        spacing.max(1)
    }

    /// Returns `f` such that `self(x) = f(x^step)`.
    ///
    /// # Errors
    ///
    /// Returns `PolynomialError::InvalidPolynomial` if `step` is zero or some
    /// nonzero coefficient sits at an exponent that is not a multiple of `step`.
    pub fn decimate(&self, step: usize) -> Result<Self, PolynomialError> {
        if step == 0 {
            return Err(PolynomialError::InvalidPolynomial {
                message: "decimation step must be positive".to_string(),
            });
        }
        if let Some(i) = self
            .coefficients
            .iter()
            .enumerate()
            .position(|(i, c)| i % step != 0 && !c.is_zero())
        {
            return Err(PolynomialError::InvalidPolynomial {
                message: format!("coefficient of x^{i} is not on a multiple of {step}"),
            });
        }

        Ok(Polynomial::new(
            self.coefficients.iter().step_by(step).cloned().collect(),
        )
        .trim_trailing_zeros())
    }
}

/// Largest `n` such that every polynomial in the batch is a polynomial in `x^n`.
pub fn common_spacing(polys: &[Polynomial]) -> usize {
    polys
        .iter()
        .map(Polynomial::spacing)
        .reduce(|a, b| a.gcd(&b))
        .unwrap_or(1)
        .max(1)
}
