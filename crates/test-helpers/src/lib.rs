// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod utils;

use num_bigint::{BigInt, RandBigInt};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use recrypt_polynomial::prime_power;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use utils::*;

/// Routes tracing output of the current test to the test writer. Honors
/// `RUST_LOG`, defaulting to `debug`.
pub fn init_test_tracing() -> DefaultGuard {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().with_test_writer());
    tracing::subscriber::set_default(subscriber)
}

pub fn create_rng_from_u64(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// `count` uniform values in `[0, p^exponent)`.
pub fn random_slots(rng: &mut ChaCha20Rng, count: usize, prime: u64, exponent: u32) -> Vec<BigInt> {
    let modulus = prime_power(prime, exponent);
    (0..count)
        .map(|_| rng.gen_bigint_range(&BigInt::from(0), &modulus))
        .collect()
}
