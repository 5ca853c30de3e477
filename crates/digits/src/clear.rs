// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! A cleartext stand-in for BGV ciphertexts.
//!
//! `ClearCiphertext` keeps its slots in the clear modulo `p^e` and models the
//! parts of a real ciphertext that digit extraction cares about: the number
//! of ciphertext parts (grown by tensoring, reset by relinearization) and a
//! rough noise budget. It is used to simulate and test extraction schedules
//! without a FHE backend.

use crate::ciphertext::Ciphertext;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use recrypt_polynomial::{prime_power, reduce};

/// Bits of noise budget consumed by a tensor product on top of the plaintext size.
const TENSOR_NOISE_BITS: f64 = 12.0;
/// Bits consumed by key switching.
const RELINEARIZATION_NOISE_BITS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ClearCiphertext {
    slots: Vec<BigInt>,
    prime: u64,
    exponent: u32,
    parts: usize,
    capacity: f64,
}

impl ClearCiphertext {
    /// Encrypts `values` into the plaintext space `Z/prime^exponent` with a
    /// starting noise budget of `capacity` bits.
    pub fn encrypt(values: &[BigInt], prime: u64, exponent: u32, capacity: f64) -> Self {
        let modulus = prime_power(prime, exponent);
        Self {
            slots: values.iter().map(|v| reduce(v, &modulus)).collect(),
            prime,
            exponent,
            parts: 2,
            capacity,
        }
    }

    /// Slot values in `[0, p^e)`.
    pub fn decrypt(&self) -> Vec<BigInt> {
        self.slots.clone()
    }

    /// Number of ciphertext parts; two when canonical.
    pub fn parts(&self) -> usize {
        self.parts
    }

    pub fn modulus(&self) -> BigInt {
        prime_power(self.prime, self.exponent)
    }

    fn slot_bits(&self) -> f64 {
        self.exponent as f64 * (self.prime as f64).log2()
    }

    /// Brings both operands to the smaller plaintext space, as BGV does when
    /// combining ciphertexts with different plaintext moduli.
    fn align_with(&mut self, other: &Self) -> BigInt {
        debug_assert_eq!(self.prime, other.prime, "plaintext primes differ");
        debug_assert_eq!(self.slots.len(), other.slots.len(), "slot counts differ");
        if other.exponent < self.exponent {
            self.exponent = other.exponent;
        }
        let modulus = self.modulus();
        for slot in self.slots.iter_mut() {
            *slot = reduce(slot, &modulus);
        }
        modulus
    }

    fn combine(&mut self, other: &Self, op: impl Fn(&BigInt, &BigInt) -> BigInt) {
        let modulus = self.align_with(other);
        for (slot, rhs) in self.slots.iter_mut().zip(&other.slots) {
            *slot = reduce(&op(slot, rhs), &modulus);
        }
        self.parts = self.parts.max(other.parts);
        self.capacity = self.capacity.min(other.capacity);
    }
}

impl Ciphertext for ClearCiphertext {
    fn zero_like(&self) -> Self {
        Self {
            slots: vec![BigInt::zero(); self.slots.len()],
            prime: self.prime,
            exponent: self.exponent,
            parts: 2,
            capacity: self.capacity,
        }
    }

    fn add_assign(&mut self, other: &Self) {
        self.combine(other, |a, b| a + b);
    }

    fn sub_assign(&mut self, other: &Self) {
        self.combine(other, |a, b| a - b);
    }

    fn negate(&mut self) {
        let modulus = self.modulus();
        for slot in self.slots.iter_mut() {
            *slot = reduce(&-&*slot, &modulus);
        }
    }

    fn add_scalar(&mut self, scalar: &BigInt) {
        let modulus = self.modulus();
        for slot in self.slots.iter_mut() {
            *slot = reduce(&(&*slot + scalar), &modulus);
        }
    }

    fn mul_scalar(&mut self, scalar: &BigInt) {
        let modulus = self.modulus();
        for slot in self.slots.iter_mut() {
            *slot = reduce(&(&*slot * scalar), &modulus);
        }
        self.capacity -= scalar.bits() as f64;
    }

    fn tensor_assign(&mut self, other: &Self) {
        let parts = self.parts + other.parts - 1;
        let capacity = self.capacity.min(other.capacity) - self.slot_bits() - TENSOR_NOISE_BITS;
        self.combine(other, |a, b| a * b);
        self.parts = parts;
        self.capacity = capacity;
    }

    fn is_canonical(&self) -> bool {
        self.parts <= 2
    }

    fn relinearize(&mut self) {
        self.parts = 2;
        self.capacity -= RELINEARIZATION_NOISE_BITS;
    }

    fn divide_by_p(&mut self) {
        let p = BigInt::from(self.prime);
        self.slots = self
            .slots
            .iter()
            .map(|slot| {
                let (q, r) = slot.div_rem(&p);
                assert!(r.is_zero(), "slot {slot} is not divisible by {p}");
                q
            })
            .collect();
        self.exponent = self.exponent.saturating_sub(1);
    }

    fn plaintext_prime(&self) -> u64 {
        self.prime
    }

    fn plaintext_exponent(&self) -> u32 {
        self.exponent
    }

    fn capacity(&self) -> f64 {
        self.capacity
    }
}

/// The plaintext digit extraction leaves once its result is negated back:
/// `x` rounded to a multiple of `p^digits` (halves round up), shifted down,
/// modulo `p^(total_precision - digits)`.
pub fn expected_extraction(
    values: &[BigInt],
    prime: u64,
    digits: u32,
    total_precision: u32,
) -> Vec<BigInt> {
    let modulus = prime_power(prime, total_precision);
    let low = prime_power(prime, digits);
    let half = &low / BigInt::from(2);
    let high = prime_power(prime, total_precision - digits);
    values
        .iter()
        .map(|x| reduce(&(reduce(x, &modulus) + &half).div_floor(&low), &high))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphertext::{Evaluator, OpCounter};
    use std::sync::Arc;

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|v| BigInt::from(*v)).collect()
    }

    #[test]
    fn test_encrypt_reduces_into_plaintext_space() {
        let ct = ClearCiphertext::encrypt(&ints(&[-1, 9, 3]), 2, 3, 100.0);
        assert_eq!(ct.decrypt(), ints(&[7, 1, 3]));
        assert_eq!(ct.modulus(), BigInt::from(8));
        assert!(ct.is_canonical());
    }

    #[test]
    fn test_tensor_grows_parts_until_relinearized() {
        let counter = Arc::new(OpCounter::new());
        let eval = Evaluator::with_counter(counter.clone());
        let mut a = ClearCiphertext::encrypt(&ints(&[3, 5]), 3, 2, 200.0);
        let b = a.clone();

        eval.multiply(&mut a, &b, true);
        assert_eq!(a.parts(), 3);
        assert!(!a.is_canonical());
        assert_eq!(a.decrypt(), ints(&[0, 7]));
        assert!(a.capacity() < 200.0);

        eval.relinearize(&mut a);
        eval.relinearize(&mut a);
        assert_eq!(a.parts(), 2);
        assert_eq!(counter.snapshot().multiplications, 1);
        assert_eq!(counter.snapshot().relinearizations, 1);
    }

    #[test]
    fn test_divide_by_p_drops_one_digit() {
        let mut ct = ClearCiphertext::encrypt(&ints(&[6, 24]), 3, 4, 100.0);
        ct.divide_by_p();
        assert_eq!(ct.decrypt(), ints(&[2, 8]));
        assert_eq!(ct.plaintext_exponent(), 3);
    }

    #[test]
    #[should_panic(expected = "not divisible")]
    fn test_divide_by_p_rejects_nonzero_digit() {
        let mut ct = ClearCiphertext::encrypt(&ints(&[5]), 3, 4, 100.0);
        ct.divide_by_p();
    }

    #[test]
    fn test_mixed_plaintext_spaces_use_smaller_modulus() {
        let mut a = ClearCiphertext::encrypt(&ints(&[30]), 2, 5, 100.0);
        let b = ClearCiphertext::encrypt(&ints(&[5]), 2, 3, 100.0);
        a.sub_assign(&b);
        assert_eq!(a.plaintext_exponent(), 3);
        assert_eq!(a.decrypt(), ints(&[1]));
    }

    #[test]
    fn test_scalar_ops_and_negate() {
        let mut ct = ClearCiphertext::encrypt(&ints(&[2, 4]), 5, 2, 100.0);
        ct.mul_scalar(&BigInt::from(-3));
        ct.add_scalar(&BigInt::from(1));
        assert_eq!(ct.decrypt(), ints(&[20, 14]));
        ct.negate();
        assert_eq!(ct.decrypt(), ints(&[5, 11]));
        assert!(ct.zero_like().decrypt().iter().all(Zero::is_zero));
    }

    #[test]
    fn test_expected_extraction_rounds() {
        // 2^4 removed from 12-bit values, halves rounding up
        assert_eq!(
            expected_extraction(&ints(&[0, 7, 8, 9, 255, 1000]), 2, 4, 12),
            ints(&[0, 0, 1, 1, 16, 63])
        );
        // 13 = 9 + 4 rounds down, 14 = 9 + 5 rounds up
        assert_eq!(expected_extraction(&ints(&[13, 14]), 3, 2, 5), ints(&[1, 2]));
        // wraps modulo p^(e - digits)
        assert_eq!(expected_extraction(&ints(&[-1]), 2, 2, 6), ints(&[0]));
    }
}
