// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::helpers::tables::load_tables;
use anyhow::{bail, Context, Result};
use clap::Args;
use num_bigint::{BigInt, RandBigInt};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use recrypt_digits::{
    expected_extraction, Ciphertext, ClearCiphertext, DigitExtractor, Evaluator,
    ExtractionConfig, ExtractionReport, OpCounter,
};
use recrypt_polynomial::prime_power;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Plaintext prime p
    #[arg(short, long)]
    pub prime: u64,

    /// Exponent e of the input plaintext space p^e
    #[arg(short = 'e', long)]
    pub precision: u32,

    /// Number of low digits to remove
    #[arg(short, long)]
    pub digits: u32,

    /// Slots per ciphertext
    #[arg(long, default_value_t = 8)]
    pub slots: usize,

    /// Seed for the random slot values
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Number of extractions to run
    #[arg(long, default_value_t = 1)]
    pub iterations: u32,

    /// Exclusive upper bound for slot values. Defaults to p^e
    #[arg(long)]
    pub max_input: Option<u64>,

    /// Starting noise budget of the simulated ciphertexts, in bits
    #[arg(long, default_value_t = 10_000.0)]
    pub capacity: f64,

    /// Defer relinearization. Overrides the configuration when set
    #[arg(long)]
    pub lazy: bool,

    /// Evaluate row polynomials in parallel. Overrides the configuration when set
    #[arg(long)]
    pub parallel: bool,
}

pub fn execute(mut config: ExtractionConfig, args: ExtractArgs) -> Result<()> {
    if args.iterations == 0 {
        bail!("At least one iteration is required");
    }
    config.lazy |= args.lazy;
    config.parallel |= args.parallel;

    let mut inners: Vec<u32> = config.composition_chains.iter().flatten().copied().collect();
    inners.sort_unstable();
    inners.dedup();
    let table = load_tables(&config, args.prime, &inners, args.precision)?;

    let counter = Arc::new(OpCounter::new());
    let extractor = DigitExtractor::from_config(&table, &config)
        .with_evaluator(Evaluator::with_counter(counter));

    let modulus = prime_power(args.prime, args.precision);
    let bound = match args.max_input {
        Some(max) => BigInt::from(max).min(modulus),
        None => modulus,
    };
    let mut rng = ChaCha20Rng::seed_from_u64(args.seed);

    let mut elapsed = Duration::ZERO;
    let mut failures = 0u32;
    let mut last: Option<ExtractionReport> = None;
    for iteration in 0..args.iterations {
        let values: Vec<BigInt> = (0..args.slots)
            .map(|_| rng.gen_bigint_range(&BigInt::from(0), &bound))
            .collect();
        let mut ct = ClearCiphertext::encrypt(&values, args.prime, args.precision, args.capacity);

        let start = Instant::now();
        let report = extractor
            .extract_digits(&mut ct, args.digits, args.precision, &config.composition_chains)
            .with_context(|| format!("Extraction {} failed", iteration))?;
        elapsed += start.elapsed();

        ct.negate();
        let expected = expected_extraction(&values, args.prime, args.digits, args.precision);
        if ct.decrypt() != expected {
            failures += 1;
            warn!(iteration, ?values, got = ?ct.decrypt(), ?expected, "Wrong extraction result");
        }
        last = Some(report);
    }

    let average = elapsed / args.iterations;
    info!(
        prime = args.prime,
        precision = args.precision,
        digits = args.digits,
        ?average,
        failures,
        "Extraction finished"
    );

    println!(
        "p = {}, e = {}, digits = {}, chains = {:?}, lazy = {}",
        args.prime, args.precision, args.digits, config.composition_chains, config.lazy
    );
    println!(
        "success: {}/{}",
        args.iterations - failures,
        args.iterations
    );
    println!("average time: {:?}", average);
    if let Some(report) = last {
        println!("multiplications: {}", report.operations.multiplications);
        println!("relinearizations: {}", report.operations.relinearizations);
        println!(
            "capacity consumed: {:.1} bits",
            report.capacity_before - report.capacity_after
        );
    }

    if failures > 0 {
        bail!("{} of {} extractions produced a wrong result", failures, args.iterations);
    }
    Ok(())
}
