// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Thin digit extraction: removes the lowest `digits` base-`p` digits of the
//! plaintext, one row of the trapezoid at a time.
//!
//! Row `i` holds the input shifted right by `i` digits. Its lowest digit is
//! lifted to every precision later rows need, subtracted from those rows and
//! divided out. Rows whose known precision already covers what they need are
//! copied forward instead of recomputed.

use crate::ciphertext::{Ciphertext, Evaluator, OpCounts};
use crate::config::ExtractionConfig;
use crate::row::{RowComposer, RowOutput};
use crate::table::DigitPolynomialSource;
use crate::{DigitExtractionError, Result};
use num_bigint::BigInt;
use recrypt_polynomial::prime_power;
use tracing::{debug, info, warn};

/// A trapezoid row: a ciphertext and the number of low digits of its
/// plaintext that are still exact.
#[derive(Debug, Clone)]
pub(crate) struct RowState<C> {
    pub(crate) ciphertext: C,
    pub(crate) precision: u32,
}

/// What one extraction spent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionReport {
    /// Operations recorded by the evaluator's counter, if it has one.
    pub operations: OpCounts,
    pub capacity_before: f64,
    pub capacity_after: f64,
}

/// Runs digit extraction against a polynomial source.
pub struct DigitExtractor<'a, S: ?Sized> {
    source: &'a S,
    evaluator: Evaluator,
    lazy: bool,
    parallel: bool,
}

impl<'a, S: DigitPolynomialSource + ?Sized> DigitExtractor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            evaluator: Evaluator::new(),
            lazy: false,
            parallel: false,
        }
    }

    /// Takes the evaluation flags from `config`.
    pub fn from_config(source: &'a S, config: &ExtractionConfig) -> Self {
        Self::new(source)
            .with_lazy(config.lazy)
            .with_parallel(config.parallel)
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Replaces the plaintext `x` of `ciphertext`, taken modulo
    /// `p^total_precision`, with `-(round(x / p^digits))` modulo
    /// `p^(total_precision - digits)`.
    ///
    /// `chains[i]` is the composition chain of row `i`; rows past the end
    /// reuse the last chain. For `p = 2` half of `2^digits` is added first so
    /// that the division rounds. On error the ciphertext is left untouched.
    pub fn extract_digits<C: Ciphertext>(
        &self,
        ciphertext: &mut C,
        digits: u32,
        total_precision: u32,
        chains: &[Vec<u32>],
    ) -> Result<ExtractionReport> {
        validate(&*ciphertext, digits, total_precision, chains)?;

        let before = self.operations();
        let capacity_before = ciphertext.capacity();
        let prime = ciphertext.plaintext_prime();

        let mut acc = ciphertext.clone();
        if prime == 2 {
            acc.add_scalar(&(prime_power(2, digits) / BigInt::from(2)));
        }
        let mut acc = self.sweep(acc, digits, total_precision, chains, |row, acc, rows| {
            let capacity = acc.capacity();
            debug!(
                row,
                capacity,
                precisions = ?rows.iter().map(|r| r.precision).collect::<Vec<_>>(),
                "extracted digit"
            );
            if capacity <= 0.0 {
                warn!(row, capacity, "noise budget exhausted during digit extraction");
            }
        })?;

        acc.negate();
        *ciphertext = acc;

        let operations = self.operations().map_or_else(OpCounts::default, |after| {
            let before = before.unwrap_or_default();
            OpCounts {
                multiplications: after.multiplications - before.multiplications,
                relinearizations: after.relinearizations - before.relinearizations,
            }
        });
        let report = ExtractionReport {
            operations,
            capacity_before,
            capacity_after: ciphertext.capacity(),
        };
        info!(
            prime,
            digits,
            total_precision,
            multiplications = report.operations.multiplications,
            capacity = report.capacity_after,
            "digit extraction finished"
        );
        Ok(report)
    }

    /// Runs one sweep per row over `acc`, calling `on_row` with the row
    /// index, the accumulator and every row state once the sweep is done.
    fn sweep<C: Ciphertext>(
        &self,
        mut acc: C,
        digits: u32,
        total_precision: u32,
        chains: &[Vec<u32>],
        mut on_row: impl FnMut(usize, &C, &[RowState<C>]),
    ) -> Result<C> {
        let composer = RowComposer::new(self.source, &self.evaluator)
            .with_lazy(self.lazy)
            .with_parallel(self.parallel);

        let rows_total = digits as usize;
        let mut rows = vec![
            RowState {
                ciphertext: acc.clone(),
                precision: total_precision,
            };
            rows_total
        ];

        for row in 0..rows_total {
            let chain = &chains[row.min(chains.len() - 1)];
            let shift = row as u32;
            let outputs = composer.compose_row(
                &rows[row].ciphertext,
                digits - shift,
                total_precision - shift,
                chain,
            )?;
            let Some(lowest) = outputs.last() else {
                return Err(DigitExtractionError::invalid_argument(format!(
                    "row {row} produced no outputs"
                )));
            };

            for next in row + 1..rows_total {
                let needed = next as u32 + 1;
                if next > row + 1 && rows[next - 1].precision + shift + 1 >= needed {
                    rows[next] = rows[next - 1].clone();
                    continue;
                }
                let output = usable_output(&outputs, shift, needed)?;
                let state = &mut rows[next];
                state.ciphertext.sub_assign(&output.ciphertext);
                state.ciphertext.divide_by_p();
                state.precision = state.precision.min(output.precision).saturating_sub(1);
            }

            let last = &rows[rows_total - 1];
            if rows_total > row + 1 && last.precision + shift + 1 >= total_precision {
                acc = last.ciphertext.clone();
            } else {
                acc.sub_assign(&lowest.ciphertext);
                acc.divide_by_p();
            }
            on_row(row, &acc, &rows);
        }
        Ok(acc)
    }

    fn operations(&self) -> Option<OpCounts> {
        self.evaluator.counter().map(|c| c.snapshot())
    }
}

/// The first output of a row that is exact for `needed` digits of the row
/// shifted by `shift`.
fn usable_output<C>(outputs: &[RowOutput<C>], shift: u32, needed: u32) -> Result<&RowOutput<C>> {
    outputs
        .iter()
        .find(|o| o.precision + shift >= needed)
        .ok_or_else(|| {
            DigitExtractionError::invalid_argument(format!(
                "no output of row {shift} reaches precision {}",
                needed - shift
            ))
        })
}

fn validate<C: Ciphertext>(
    ciphertext: &C,
    digits: u32,
    total_precision: u32,
    chains: &[Vec<u32>],
) -> Result<()> {
    if ciphertext.plaintext_prime() < 2 {
        return Err(DigitExtractionError::invalid_argument(
            "plaintext prime must be at least 2",
        ));
    }
    if digits == 0 {
        return Err(DigitExtractionError::invalid_argument(
            "at least one digit must be extracted",
        ));
    }
    if total_precision <= digits {
        return Err(DigitExtractionError::invalid_argument(format!(
            "total precision {total_precision} must exceed the {digits} extracted digits"
        )));
    }
    if ciphertext.plaintext_exponent() != total_precision {
        return Err(DigitExtractionError::invalid_argument(format!(
            "ciphertext plaintext exponent {} does not match total precision {total_precision}",
            ciphertext.plaintext_exponent()
        )));
    }
    if chains.is_empty() {
        return Err(DigitExtractionError::invalid_argument(
            "at least one composition chain is required",
        ));
    }
    for (i, chain) in chains.iter().enumerate() {
        // a row input is only known modulo p, so every chain starts there
        let valid = chain.first() == Some(&1) && chain.windows(2).all(|w| w[0] < w[1]);
        if !valid {
            return Err(DigitExtractionError::invalid_argument(format!(
                "composition chain {i} ({chain:?}) must start at 1 and be strictly increasing"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphertext::OpCounter;
    use crate::clear::{expected_extraction, ClearCiphertext};
    use crate::generator::generate_table;
    use crate::table::PolynomialTable;
    use std::sync::Arc;

    fn run(
        table: &PolynomialTable,
        values: &[i64],
        prime: u64,
        digits: u32,
        total_precision: u32,
        chains: &[Vec<u32>],
        lazy: bool,
    ) -> ClearCiphertext {
        let values: Vec<BigInt> = values.iter().map(|v| BigInt::from(*v)).collect();
        let mut ct = ClearCiphertext::encrypt(&values, prime, total_precision, 100_000.0);
        DigitExtractor::new(table)
            .with_lazy(lazy)
            .extract_digits(&mut ct, digits, total_precision, chains)
            .unwrap();
        ct.negate();
        assert_eq!(
            ct.decrypt(),
            expected_extraction(&values, prime, digits, total_precision)
        );
        assert_eq!(ct.plaintext_exponent(), total_precision - digits);
        ct
    }

    #[test]
    fn test_binary_extraction() {
        let table = generate_table(2, &[1, 16], 20).unwrap();
        let values: Vec<i64> = (0..300).map(|v| v * 13 + 5).collect();
        run(&table, &values, 2, 4, 20, &[vec![1]], false);
        run(&table, &values, 2, 4, 20, &[vec![1, 16]], true);
        run(&table, &values, 2, 4, 12, &[vec![1, 16], vec![1]], false);
    }

    #[test]
    fn test_ternary_extraction() {
        let table = generate_table(3, &[1, 2], 8).unwrap();
        let values: Vec<i64> = (0..200).map(|v| v * 31 - 1000).collect();
        run(&table, &values, 3, 3, 8, &[vec![1]], false);
        run(&table, &values, 3, 3, 8, &[vec![1, 2]], true);
    }

    #[test]
    fn test_single_digit() {
        let table = generate_table(5, &[1], 4).unwrap();
        run(&table, &[0, 1, 2, 3, 4, 312, 624], 5, 1, 4, &[vec![1]], false);
    }

    #[test]
    fn test_report_counts_operations() {
        let table = generate_table(2, &[1], 8).unwrap();
        let counter = Arc::new(OpCounter::new());
        let extractor =
            DigitExtractor::new(&table).with_evaluator(Evaluator::with_counter(counter.clone()));
        let mut ct = ClearCiphertext::encrypt(&[BigInt::from(77)], 2, 8, 5000.0);
        let report = extractor
            .extract_digits(&mut ct, 3, 8, &[vec![1, 16]])
            .unwrap();
        assert_eq!(report.operations, counter.snapshot());
        assert!(report.operations.multiplications > 0);
        assert!(report.capacity_after < report.capacity_before);
    }

    #[test]
    fn test_invalid_arguments_leave_ciphertext_untouched() {
        let table = generate_table(2, &[1], 8).unwrap();
        let extractor = DigitExtractor::new(&table);
        let original = ClearCiphertext::encrypt(&[BigInt::from(9)], 2, 8, 1000.0);
        let cases: Vec<(u32, u32, Vec<Vec<u32>>)> = vec![
            (0, 8, vec![vec![1]]),
            (8, 8, vec![vec![1]]),
            (3, 9, vec![vec![1]]),
            (3, 8, vec![]),
            (3, 8, vec![vec![]]),
            (3, 8, vec![vec![1, 1]]),
            (3, 8, vec![vec![0, 4]]),
        ];
        for (digits, total, chains) in cases {
            let mut ct = original.clone();
            assert!(matches!(
                extractor.extract_digits(&mut ct, digits, total, &chains),
                Err(DigitExtractionError::InvalidArgument { .. })
            ));
            assert_eq!(ct, original);
        }
    }

    #[test]
    fn test_chains_must_start_at_one() {
        for (prime, digits, total, chains) in [
            (3, 3, 6, vec![vec![2]]),
            (2, 4, 10, vec![vec![2, 16]]),
            (5, 2, 5, vec![vec![3]]),
            (2, 4, 10, vec![vec![1, 16], vec![4, 16]]),
        ] {
            let table = generate_table(prime, &[1], total).unwrap();
            let original = ClearCiphertext::encrypt(&[BigInt::from(7)], prime, total, 1000.0);
            let mut ct = original.clone();
            let err = DigitExtractor::new(&table)
                .extract_digits(&mut ct, digits, total, &chains)
                .unwrap_err();
            assert!(
                matches!(err, DigitExtractionError::InvalidArgument { .. }),
                "p={prime} chains={chains:?}: {err}"
            );
            assert_eq!(ct, original);
        }
    }

    fn row_precisions(
        table: &PolynomialTable,
        prime: u64,
        digits: u32,
        total_precision: u32,
        chains: &[Vec<u32>],
    ) -> Vec<Vec<u32>> {
        let ct = ClearCiphertext::encrypt(
            &[BigInt::from(5), BigInt::from(17)],
            prime,
            total_precision,
            100_000.0,
        );
        let mut sweeps = Vec::new();
        DigitExtractor::new(table)
            .sweep(ct, digits, total_precision, chains, |_, _, rows| {
                sweeps.push(rows.iter().map(|r| r.precision).collect::<Vec<_>>())
            })
            .unwrap();
        sweeps
    }

    #[test]
    fn test_row_precisions_per_sweep() {
        let table = generate_table(2, &[1, 16], 67).unwrap();
        assert_eq!(
            row_precisions(&table, 2, 8, 67, &[vec![1, 16]]),
            vec![
                vec![67, 1, 3, 3, 7, 7, 7, 7],
                vec![67, 1, 1, 2, 3, 6, 6, 6],
                vec![67, 1, 1, 1, 2, 3, 5, 5],
                vec![67, 1, 1, 1, 1, 2, 3, 4],
                vec![67, 1, 1, 1, 1, 1, 2, 3],
                vec![67, 1, 1, 1, 1, 1, 1, 2],
                vec![67, 1, 1, 1, 1, 1, 1, 1],
                vec![67, 1, 1, 1, 1, 1, 1, 1],
            ]
        );

        let table = generate_table(3, &[1, 2], 8).unwrap();
        assert_eq!(
            row_precisions(&table, 3, 3, 8, &[vec![1]]),
            vec![vec![8, 1, 2], vec![8, 1, 1], vec![8, 1, 1]]
        );
    }

    #[test]
    fn test_row_precisions_never_increase() {
        for (prime, digits, total, chains) in [
            (2, 4, 20, vec![vec![1, 16]]),
            (2, 4, 12, vec![vec![1, 16], vec![1]]),
            (2, 8, 67, vec![vec![1]]),
            (3, 3, 12, vec![vec![1, 6]]),
            (5, 3, 8, vec![vec![1, 2, 4]]),
        ] {
            let table = generate_table(prime, &[1, 2, 4, 6, 16], total).unwrap();
            let sweeps = row_precisions(&table, prime, digits, total, &chains);
            assert_eq!(sweeps.len(), digits as usize);

            let mut previous = vec![total; digits as usize];
            for (row, precisions) in sweeps.iter().enumerate() {
                for (j, (now, before)) in precisions.iter().zip(&previous).enumerate() {
                    assert!(now <= before, "p={prime} sweep {row} row {j}: {now} > {before}");
                    if j <= row {
                        assert_eq!(now, before, "finished row {j} changed in sweep {row}");
                    } else {
                        // row j still knows the digits later sweeps peel off
                        assert!(*now as usize + row >= j, "p={prime} sweep {row} row {j}");
                    }
                }
                previous = precisions.clone();
            }
        }
    }

    #[test]
    fn test_missing_polynomial_leaves_ciphertext_untouched() {
        let table = PolynomialTable::new();
        let original = ClearCiphertext::encrypt(&[BigInt::from(40)], 3, 6, 1000.0);
        let mut ct = original.clone();
        assert!(matches!(
            DigitExtractor::new(&table).extract_digits(&mut ct, 2, 6, &[vec![1]]),
            Err(DigitExtractionError::MissingPolynomial { prime: 3, .. })
        ));
        assert_eq!(ct, original);
    }
}
