// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Ciphertext powers for baby-step/giant-step evaluation.

use crate::ciphertext::{Ciphertext, Evaluator};
use crate::schedule::{floor_pow2, ScheduleParameters};
use crate::{DigitExtractionError, Result};
use tracing::trace;

/// Baby-step powers `x^1..x^k` and giant-step powers `x^(k*2^j)`, `j < m`.
///
/// In odd mode the even baby-step powers that are neither powers of two nor
/// `x^k` itself are never computed; asking for one is an error.
#[derive(Debug, Clone)]
pub struct PowerTable<C> {
    baby: Vec<Option<C>>,
    giant: Vec<C>,
}

/// The two factors whose product gives `x^exp` in the odd construction, or
/// `None` when that power is skipped.
fn odd_factors(exp: usize, k: usize) -> Option<(usize, usize)> {
    if exp % 2 == 0 {
        if !(exp.is_power_of_two() || exp == k) {
            return None;
        }
        let first = if exp % 4 == 0 {
            floor_pow2(exp - 1)
        } else {
            exp / 2
        };
        Some((first, exp - first))
    } else {
        let first = floor_pow2(exp);
        Some((first, exp - first))
    }
}

impl<C: Ciphertext> PowerTable<C> {
    /// Computes every power the schedule needs from `x`.
    pub fn build(
        x: &C,
        params: &ScheduleParameters,
        lazy: bool,
        evaluator: &Evaluator,
    ) -> Result<Self> {
        if params.k == 0 {
            return Err(DigitExtractionError::invalid_argument(
                "baby-step count must be positive",
            ));
        }

        let k = params.k;
        let mut baby: Vec<Option<C>> = Vec::with_capacity(k);
        baby.push(Some(x.clone()));

        for exp in 2..=k {
            let factors = if params.odd {
                odd_factors(exp, k)
            } else {
                Some((exp / 2, exp - exp / 2))
            };
            let Some((first, second)) = factors else {
                baby.push(None);
                continue;
            };

            if !params.odd {
                // operands stay relinearized for later products
                for idx in [first - 1, second - 1] {
                    if let Some(power) = baby[idx].as_mut() {
                        evaluator.relinearize(power);
                    }
                }
            }

            let entry = match (&baby[first - 1], &baby[second - 1]) {
                (Some(lhs), Some(rhs)) => {
                    let mut product = lhs.clone();
                    evaluator.multiply(&mut product, rhs, lazy);
                    Some(product)
                }
                _ => None,
            };
            trace!(exp, first, second, computed = entry.is_some(), "baby step");
            baby.push(entry);
        }

        let mut giant = Vec::with_capacity(params.m);
        if params.m > 0 {
            let top = baby[k - 1]
                .as_mut()
                .ok_or(DigitExtractionError::UnavailablePower { exponent: k })?;
            evaluator.relinearize(top);
            giant.push(top.clone());
            for _ in 1..params.m {
                let mut next = giant[giant.len() - 1].clone();
                evaluator.square(&mut next);
                giant.push(next);
            }
        }

        Ok(Self { baby, giant })
    }

    /// Number of baby-step powers.
    pub fn k(&self) -> usize {
        self.baby.len()
    }

    /// Number of giant-step powers.
    pub fn m(&self) -> usize {
        self.giant.len()
    }

    /// Returns `x^exponent` for `1 <= exponent <= k`.
    pub fn baby(&self, exponent: usize) -> Result<&C> {
        exponent
            .checked_sub(1)
            .and_then(|idx| self.baby.get(idx))
            .and_then(Option::as_ref)
            .ok_or(DigitExtractionError::UnavailablePower { exponent })
    }

    /// Returns `x^(k * 2^level)` for `level < m`.
    pub fn giant(&self, level: usize) -> Result<&C> {
        self.giant
            .get(level)
            .ok_or(DigitExtractionError::UnavailablePower {
                exponent: self.k() << level,
            })
    }
}

/// Powers of one ciphertext computed on demand with minimal depth.
///
/// `x^e` is `x^(e-t) * x^t` with `t` the largest power of two below `e`, so
/// every power has depth `ceil(log2 e)`. Results are memoised.
pub struct DynamicPowers<'a, C> {
    powers: Vec<Option<C>>,
    evaluator: &'a Evaluator,
}

impl<'a, C: Ciphertext> DynamicPowers<'a, C> {
    pub fn new(x: C, evaluator: &'a Evaluator) -> Self {
        Self {
            powers: vec![Some(x)],
            evaluator,
        }
    }

    fn ensure(&mut self, exponent: usize) -> Result<()> {
        if exponent == 0 {
            return Err(DigitExtractionError::invalid_argument(
                "power exponent must be positive",
            ));
        }
        if self.powers.len() < exponent {
            self.powers.resize(exponent, None);
        }
        if self.powers[exponent - 1].is_some() {
            return Ok(());
        }

        let high = if exponent.is_power_of_two() {
            exponent / 2
        } else {
            floor_pow2(exponent)
        };
        let low = exponent - high;
        self.ensure(high)?;
        self.ensure(low)?;

        let mut value = self.powers[high - 1]
            .clone()
            .ok_or(DigitExtractionError::UnavailablePower { exponent: high })?;
        let rhs = self.powers[low - 1]
            .as_ref()
            .ok_or(DigitExtractionError::UnavailablePower { exponent: low })?;
        self.evaluator.multiply(&mut value, rhs, false);
        self.powers[exponent - 1] = Some(value);
        Ok(())
    }

    /// Returns `x^exponent`, computing intermediate powers as needed.
    pub fn power(&mut self, exponent: usize) -> Result<C> {
        self.ensure(exponent)?;
        self.powers[exponent - 1]
            .clone()
            .ok_or(DigitExtractionError::UnavailablePower { exponent })
    }
}
