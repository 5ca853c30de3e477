// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The homomorphic operations digit extraction needs, and the evaluator that
//! routes every non-scalar multiplication through a single counting point.

use crate::powers::DynamicPowers;
use crate::Result;
use num_bigint::BigInt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// A BGV ciphertext over the plaintext space `Z/p^e`, possibly holding a
/// vector of slots.
///
/// Implementations own all noise and key management. Digit extraction only
/// relies on the operations below; the tensor product must leave the
/// ciphertext non-canonical until `relinearize` is called.
pub trait Ciphertext: Clone + Send + Sync {
    /// An encryption of zero under the same key and plaintext space.
    fn zero_like(&self) -> Self;

    fn add_assign(&mut self, other: &Self);

    fn sub_assign(&mut self, other: &Self);

    fn negate(&mut self);

    fn add_scalar(&mut self, scalar: &BigInt);

    fn mul_scalar(&mut self, scalar: &BigInt);

    /// Multiplies without key switching.
    fn tensor_assign(&mut self, other: &Self);

    /// True when the ciphertext is in its two-part form.
    fn is_canonical(&self) -> bool;

    /// Key-switches back to the canonical two-part form.
    fn relinearize(&mut self);

    /// Divides the plaintext by `p` and reduces the plaintext space to `p^(e-1)`.
    ///
    /// Only valid when every slot is divisible by `p`.
    fn divide_by_p(&mut self);

    fn plaintext_prime(&self) -> u64;

    /// The exponent `e` of the plaintext modulus `p^e`.
    fn plaintext_exponent(&self) -> u32;

    /// Remaining noise budget in bits.
    fn capacity(&self) -> f64;
}

/// Counts of the expensive operations performed by an [`Evaluator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    pub multiplications: u64,
    pub relinearizations: u64,
}

/// Shared atomic counters for tensor products and relinearizations.
#[derive(Debug, Default)]
pub struct OpCounter {
    multiplications: AtomicU64,
    relinearizations: AtomicU64,
}

impl OpCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> OpCounts {
        OpCounts {
            multiplications: self.multiplications.load(Ordering::Relaxed),
            relinearizations: self.relinearizations.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.multiplications.store(0, Ordering::Relaxed);
        self.relinearizations.store(0, Ordering::Relaxed);
    }
}

/// Performs ciphertext multiplications and relinearizations, optionally
/// recording them in an [`OpCounter`].
///
/// Cloning an evaluator shares its counter.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    counter: Option<Arc<OpCounter>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(counter: Arc<OpCounter>) -> Self {
        Self {
            counter: Some(counter),
        }
    }

    pub fn counter(&self) -> Option<&Arc<OpCounter>> {
        self.counter.as_ref()
    }

    /// `lhs *= rhs`, relinearized unless `lazy` is set.
    ///
    /// Non-canonical operands are relinearized before the tensor product, so
    /// a lazy product always has three parts.
    pub fn multiply<C: Ciphertext>(&self, lhs: &mut C, rhs: &C, lazy: bool) {
        self.relinearize(lhs);
        if rhs.is_canonical() {
            lhs.tensor_assign(rhs);
        } else {
            let mut rhs = rhs.clone();
            self.relinearize(&mut rhs);
            lhs.tensor_assign(&rhs);
        }
        if let Some(counter) = &self.counter {
            counter.multiplications.fetch_add(1, Ordering::Relaxed);
        }
        if !lazy {
            self.relinearize(lhs);
        }
    }

    /// `c *= c`, always relinearized.
    pub fn square<C: Ciphertext>(&self, c: &mut C) {
        let rhs = c.clone();
        self.multiply(c, &rhs, false);
    }

    /// Relinearizes `c` if it is not canonical. Canonical inputs are left
    /// untouched and not counted.
    pub fn relinearize<C: Ciphertext>(&self, c: &mut C) {
        if c.is_canonical() {
            return;
        }
        c.relinearize();
        if let Some(counter) = &self.counter {
            counter.relinearizations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Raises `c` to `exponent` with minimal multiplicative depth.
    pub fn power<C: Ciphertext>(&self, c: &C, exponent: usize) -> Result<C> {
        trace!(exponent, "raising ciphertext to power");
        DynamicPowers::new(c.clone(), self).power(exponent)
    }
}
