// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Baby-step/giant-step parameter search for Paterson–Stockmeyer evaluation.

use crate::{DigitExtractionError, Result};
use recrypt_polynomial::Polynomial;
use tracing::debug;

/// Shape of a Paterson–Stockmeyer evaluation.
///
/// `k` baby-step powers `x^1..x^k` and `m` giant-step powers
/// `x^k, x^2k, .., x^(k*2^(m-1))`. Together they cover degrees up to `k * 2^m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleParameters {
    pub k: usize,
    pub m: usize,
    /// Predicted cost of the whole batch. Eager evaluation relinearizes every
    /// product, so this is the number of non-scalar multiplications. In lazy
    /// mode it is the number of relinearizations.
    pub multiplications: usize,
    /// Only odd baby-step powers are materialised.
    pub odd: bool,
}

impl ScheduleParameters {
    /// Largest degree this schedule can evaluate.
    pub fn capacity(&self) -> usize {
        self.k << self.m
    }
}

pub(crate) fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

pub(crate) fn floor_log2(n: usize) -> usize {
    debug_assert!(n > 0);
    (usize::BITS - 1 - n.leading_zeros()) as usize
}

/// Largest power of two not exceeding `n`.
pub(crate) fn floor_pow2(n: usize) -> usize {
    1 << floor_log2(n)
}

fn ceil_div(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

/// Cost of building `k` baby steps and `m` giant steps.
fn powers_cost(k: usize, m: usize, lazy: bool) -> usize {
    if lazy {
        if k == 1 {
            m.saturating_sub(1)
        } else {
            (k - 1) / 2 + m
        }
    } else if m == 0 {
        k - 1
    } else {
        k + m - 2
    }
}

/// Cost of the odd-only power table, together with the `k` the odd
/// construction needs: even, and when divisible by four, a sum of two powers
/// of two so that `x^k` is a product of two computed powers.
fn odd_powers_cost(k: usize, m: usize) -> (usize, usize) {
    if m == 0 {
        return (k, k / 2 + floor_log2(k));
    }
    let mut k = k;
    if k % 2 == 1 {
        k += 1;
    }
    if k % 4 == 0 && !(k - floor_pow2(k - 1)).is_power_of_two() {
        k += 2;
    }
    (k, k / 2 + floor_log2(k - 1) + m - 1)
}

/// Multiplications spent combining blocks of one polynomial of degree `degree`.
fn recursion_cost(degree: usize, k: usize, lazy: bool) -> usize {
    let mut cost = ceil_div(degree, k) - 1;
    if lazy {
        // Lazy mode pays one extra multiplication for the final block unless
        // the leftover block is short enough to fold into the baby steps.
        cost += 1;
        let rest = degree % k;
        if rest != 0 && rest <= k.div_ceil(2) {
            cost -= 1;
        }
    }
    cost
}

/// Picks the `(k, m)` that minimises the predicted multiplication count for
/// evaluating every polynomial in `polys` on the same input.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty batch or a polynomial of degree
/// zero or less.
pub fn best_parameters(polys: &[Polynomial], lazy: bool) -> Result<ScheduleParameters> {
    if polys.is_empty() {
        return Err(DigitExtractionError::invalid_argument(
            "cannot schedule an empty polynomial batch",
        ));
    }

    let mut degrees = Vec::with_capacity(polys.len());
    for (i, poly) in polys.iter().enumerate() {
        match poly.degree() {
            Some(d) if d > 0 => degrees.push(d),
            _ => {
                return Err(DigitExtractionError::invalid_argument(format!(
                    "polynomial {i} has degree <= 0"
                )))
            }
        }
    }
    let max_degree = degrees.iter().copied().max().unwrap_or(1);
    let all_odd = polys.iter().all(Polynomial::is_odd);

    // a linear batch is evaluated from x alone
    let mut best = (max_degree == 1).then_some(ScheduleParameters {
        k: 1,
        m: 0,
        multiplications: 0,
        odd: false,
    });
    for m in 0..=ceil_log2(max_degree) {
        let mut k = ceil_div(max_degree, 1 << m);

        let mut cost = powers_cost(k, m, lazy);
        let mut odd = false;
        if all_odd && !lazy {
            let (odd_k, odd_cost) = odd_powers_cost(k, m);
            if odd_cost < cost {
                k = odd_k;
                cost = odd_cost;
                odd = true;
            }
        }
        cost += degrees
            .iter()
            .map(|d| recursion_cost(*d, k, lazy))
            .sum::<usize>();

        if best.map_or(true, |b| cost < b.multiplications) {
            best = Some(ScheduleParameters {
                k,
                m,
                multiplications: cost,
                odd,
            });
        }
    }

    let best = best.ok_or_else(|| DigitExtractionError::invalid_argument("no schedule found"))?;
    debug!(
        k = best.k,
        m = best.m,
        multiplications = best.multiplications,
        odd = best.odd,
        polys = polys.len(),
        max_degree,
        "selected Paterson-Stockmeyer schedule"
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dense(degree: usize) -> Polynomial {
        Polynomial::from_i64s(&vec![1; degree + 1])
    }

    fn odd(degree: usize) -> Polynomial {
        let coeffs: Vec<i64> = (0..=degree).map(|i| (i % 2) as i64).collect();
        Polynomial::from_i64s(&coeffs)
    }

    #[test]
    fn test_log_helpers() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(floor_log2(1), 0);
        assert_eq!(floor_log2(9), 3);
        assert_eq!(floor_pow2(12), 8);
    }

    #[test]
    fn test_linear_polynomial_needs_nothing() {
        let params = best_parameters(&[dense(1)], false).unwrap();
        assert_eq!(params.k, 1);
        assert_eq!(params.m, 0);
        assert_eq!(params.multiplications, 0);
    }

    #[test]
    fn test_lazy_linear_batch_needs_nothing() {
        let params = best_parameters(&[dense(1), odd(1)], true).unwrap();
        assert_eq!((params.k, params.m), (1, 0));
        assert_eq!(params.multiplications, 0);
    }

    #[test]
    fn test_degree_seven_dense() {
        // m=0: 6; m=1 (k=4): 3 + 1 = 4; m=2 (k=2): 2 + 3 = 5; m=3 (k=1): 2 + 6 = 8
        let params = best_parameters(&[dense(7)], false).unwrap();
        assert_eq!((params.k, params.m), (4, 1));
        assert_eq!(params.multiplications, 4);
        assert!(!params.odd);
        assert!(params.capacity() >= 7);
    }

    #[test]
    fn test_odd_polynomials_use_odd_table_when_cheaper() {
        // m=1, k=8: odd table costs 4 + 2 + 0 = 6 against 7 for the full one,
        // plus one giant-step product.
        let params = best_parameters(&[odd(15)], false).unwrap();
        assert!(params.odd);
        assert_eq!((params.k, params.m), (8, 1));
        assert_eq!(params.multiplications, 7);
        let generic = best_parameters(&[dense(15)], false).unwrap();
        assert!(!generic.odd);
        assert_eq!(generic.multiplications, 7);
    }

    #[test]
    fn test_odd_k_is_adjusted_to_a_computable_power() {
        for degree in [27, 55, 111, 223] {
            let params = best_parameters(&[odd(degree)], false).unwrap();
            if params.odd && params.m > 0 {
                assert_eq!(params.k % 2, 0);
                if params.k % 4 == 0 {
                    assert!((params.k - floor_pow2(params.k - 1)).is_power_of_two());
                }
            }
            assert!(params.capacity() >= degree);
        }
    }

    #[test]
    fn test_lazy_never_selects_odd() {
        let params = best_parameters(&[odd(31), odd(15)], true).unwrap();
        assert!(!params.odd);
    }

    #[test]
    fn test_batch_accounts_for_every_polynomial() {
        let single = best_parameters(&[dense(20)], false).unwrap();
        let batch = best_parameters(&[dense(20), dense(20), dense(10)], false).unwrap();
        assert!(batch.multiplications > single.multiplications);
        assert!(batch.capacity() >= 20);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            best_parameters(&[], false),
            Err(DigitExtractionError::InvalidArgument { .. })
        ));
        assert!(matches!(
            best_parameters(&[Polynomial::from_i64s(&[4])], false),
            Err(DigitExtractionError::InvalidArgument { .. })
        ));
        assert!(best_parameters(&[dense(3), Polynomial::zero()], true).is_err());
    }

    proptest! {
        #[test]
        fn test_single_polynomial_never_worse_than_horner(degree in 1usize..300, lazy: bool) {
            let params = best_parameters(&[dense(degree)], lazy).unwrap();
            prop_assert!(params.multiplications <= degree - 1);
            prop_assert!(params.capacity() >= degree);
        }
    }
}
