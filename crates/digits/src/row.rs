// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! One row of the digit extraction trapezoid: lifting the lowest digit of a
//! ciphertext to increasing precisions.

use crate::ciphertext::{Ciphertext, Evaluator};
use crate::paterson_stockmeyer::evaluate_polynomials;
use crate::table::DigitPolynomialSource;
use crate::{DigitExtractionError, Result};
use num_bigint::BigInt;
use tracing::debug;

/// How one step of a composition chain is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStrategy {
    /// Fixed low-degree multivariate formulas for `p = 2`, reaching
    /// precisions 2, 4, 8 and 16 from a single bit.
    Multivariate,
    /// Digit-retain polynomials from the table, evaluated with
    /// Paterson–Stockmeyer.
    Composition,
}

impl RowStrategy {
    /// The multivariate formulas apply for `p = 2` when lifting from
    /// precision 1 to at most 16.
    pub fn select(prime: u64, previous: u32, target: u32) -> Self {
        if prime == 2 && previous == 1 && target <= 16 {
            RowStrategy::Multivariate
        } else {
            RowStrategy::Composition
        }
    }
}

/// A ciphertext whose lowest digit is correct modulo `p^precision`.
#[derive(Debug, Clone)]
pub struct RowOutput<C> {
    pub ciphertext: C,
    pub precision: u32,
}

/// Produces, for one trapezoid row, the row's lowest digit at every
/// precision later rows will need.
pub struct RowComposer<'a, S: ?Sized> {
    source: &'a S,
    evaluator: &'a Evaluator,
    lazy: bool,
    parallel: bool,
}

impl<'a, S: DigitPolynomialSource + ?Sized> RowComposer<'a, S> {
    pub fn new(source: &'a S, evaluator: &'a Evaluator) -> Self {
        Self {
            source,
            evaluator,
            lazy: false,
            parallel: false,
        }
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Lifts the lowest digit of `x` along `chain`, ending at `row_size`.
    ///
    /// `chain[0]` is the precision `x` already has; each further entry is an
    /// intermediate checkpoint. The output starts with `x` itself and its
    /// precisions are strictly increasing.
    pub fn compose_row<C: Ciphertext>(
        &self,
        x: &C,
        triangle_size: u32,
        row_size: u32,
        chain: &[u32],
    ) -> Result<Vec<RowOutput<C>>> {
        let Some(&start) = chain.first() else {
            return Err(DigitExtractionError::invalid_argument(
                "composition chain must not be empty",
            ));
        };
        if start == 0 {
            return Err(DigitExtractionError::invalid_argument(
                "composition chain must start at a positive precision",
            ));
        }

        let prime = x.plaintext_prime();
        let mut steps = chain.to_vec();
        steps.push(row_size);

        let mut outputs = vec![RowOutput {
            ciphertext: x.clone(),
            precision: start,
        }];
        for step in steps.windows(2) {
            let (previous, next) = (step[0], step[1]);
            let target = row_size.min(next);
            let (input, reached) = match outputs.last() {
                Some(last) => (last.ciphertext.clone(), last.precision),
                None => (x.clone(), start),
            };
            if target <= reached {
                continue;
            }

            match RowStrategy::select(prime, previous, next) {
                RowStrategy::Multivariate => self.multivariate(&input, target, &mut outputs),
                RowStrategy::Composition => self.composition(
                    &input,
                    triangle_size.min(next),
                    target,
                    previous,
                    &mut outputs,
                )?,
            }
        }

        debug!(
            triangle_size,
            row_size,
            ?chain,
            precisions = ?outputs.iter().map(|o| o.precision).collect::<Vec<_>>(),
            "composed row"
        );
        Ok(outputs)
    }

    /// For `x` holding a bit, the formulas
    ///
    /// * `f2 = x^2`
    /// * `f4 = f2^2`
    /// * `f8 = 112 f2 + (94 f2 + 121 f4)^2`
    /// * `f16 = 11136 f4 - (15364 f4 - 14115 f8)(28504 f2 + 8968 f4 - f8)`
    ///
    /// retain that bit modulo 2, 4, 8 and 16 bits respectively. Only the ones
    /// a row of `row_size` can use are evaluated.
    fn multivariate<C: Ciphertext>(&self, x: &C, row_size: u32, outputs: &mut Vec<RowOutput<C>>) {
        let scaled = |c: &C, k: i64| {
            let mut c = c.clone();
            c.mul_scalar(&BigInt::from(k));
            c
        };

        if row_size < 2 {
            return;
        }
        let mut f2 = x.clone();
        self.evaluator.square(&mut f2);
        outputs.push(RowOutput {
            ciphertext: f2.clone(),
            precision: 2,
        });

        if row_size < 3 {
            return;
        }
        let mut f4 = f2.clone();
        self.evaluator.square(&mut f4);
        outputs.push(RowOutput {
            ciphertext: f4.clone(),
            precision: 4,
        });

        if row_size < 5 {
            return;
        }
        let mut inner = scaled(&f2, 94);
        inner.add_assign(&scaled(&f4, 121));
        self.evaluator.square(&mut inner);
        let mut f8 = scaled(&f2, 112);
        f8.add_assign(&inner);
        outputs.push(RowOutput {
            ciphertext: f8.clone(),
            precision: 8,
        });

        if row_size < 9 {
            return;
        }
        let mut lhs = scaled(&f4, 15364);
        lhs.sub_assign(&scaled(&f8, 14115));
        let mut rhs = scaled(&f2, 28504);
        rhs.add_assign(&scaled(&f4, 8968));
        rhs.sub_assign(&f8);
        self.evaluator.multiply(&mut lhs, &rhs, false);
        let mut f16 = scaled(&f4, 11136);
        f16.sub_assign(&lhs);
        outputs.push(RowOutput {
            ciphertext: f16,
            precision: 16,
        });
    }

    /// Precisions double from `inner` while below the triangle, then jump to
    /// the triangle and finally the row size. All polynomials of the row are
    /// evaluated as one batch.
    fn composition<C: Ciphertext>(
        &self,
        x: &C,
        triangle_size: u32,
        row_size: u32,
        inner: u32,
        outputs: &mut Vec<RowOutput<C>>,
    ) -> Result<()> {
        let mut precisions = Vec::new();
        let mut exponent = 1u32;
        while (inner << (exponent - 1)) < triangle_size {
            let mut precision = inner << exponent;
            if precision > triangle_size {
                precision = if precision < row_size {
                    triangle_size
                } else {
                    row_size
                };
            }
            precisions.push(precision);
            exponent += 1;
        }
        if precisions.last().map_or(true, |p| *p < row_size) {
            precisions.push(row_size);
        }

        let prime = x.plaintext_prime();
        let polys = precisions
            .iter()
            .map(|target| self.source.require(prime, inner, *target).cloned())
            .collect::<Result<Vec<_>>>()?;
        debug!(prime, inner, ?precisions, "evaluating digit-retain polynomials");

        let results = evaluate_polynomials(&polys, x, self.lazy, self.parallel, self.evaluator)?;
        outputs.extend(
            results
                .into_iter()
                .zip(precisions)
                .map(|(ciphertext, precision)| RowOutput {
                    ciphertext,
                    precision,
                }),
        );
        Ok(())
    }
}
