// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use num_bigint::BigInt;
use recrypt_digits::{
    expected_extraction, generate_table, Ciphertext, ClearCiphertext, DigitExtractor, Evaluator,
    ExtractionConfig, OpCounter, PolynomialTable,
};
use recrypt_test_helpers::{create_rng_from_u64, init_test_tracing, random_slots, write_table_dir};
use std::sync::Arc;
use tempfile::tempdir;

const CAPACITY: f64 = 1_000_000.0;

fn extract(
    extractor: &DigitExtractor<'_, PolynomialTable>,
    values: &[BigInt],
    prime: u64,
    digits: u32,
    total_precision: u32,
    chains: &[Vec<u32>],
) -> Result<ClearCiphertext> {
    let mut ct = ClearCiphertext::encrypt(values, prime, total_precision, CAPACITY);
    extractor.extract_digits(&mut ct, digits, total_precision, chains)?;
    ct.negate();
    Ok(ct)
}

#[test]
fn test_binary_bootstrapping_parameters() -> Result<()> {
    let _guard = init_test_tracing();
    let (prime, digits, total) = (2, 8, 67);
    let table = generate_table(prime, &[1, 16], total)?;
    let values = random_slots(&mut create_rng_from_u64(42), 16, prime, total);
    let want = expected_extraction(&values, prime, digits, total);

    let mut mixed = vec![vec![1, 16]; 7];
    mixed.push(vec![1]);
    for chains in [vec![vec![1]], vec![vec![1, 16]], mixed] {
        for lazy in [false, true] {
            let extractor = DigitExtractor::new(&table).with_lazy(lazy);
            let ct = extract(&extractor, &values, prime, digits, total, &chains)?;
            assert_eq!(ct.decrypt(), want, "chains {chains:?}, lazy {lazy}");
            assert_eq!(ct.plaintext_exponent(), total - digits);
            assert!(ct.is_canonical());
        }
    }
    Ok(())
}

#[test]
fn test_odd_primes() -> Result<()> {
    for (prime, digits, total, chains) in [
        (3, 3, 12, vec![vec![1]]),
        (3, 3, 12, vec![vec![1, 6]]),
        (5, 3, 8, vec![vec![1, 2, 4]]),
        (17, 2, 4, vec![vec![1]]),
    ] {
        let table = generate_table(prime, &[1, 2, 4, 6], total)?;
        let values = random_slots(&mut create_rng_from_u64(prime), 12, prime, total);
        let extractor = DigitExtractor::new(&table).with_parallel(true);
        let ct = extract(&extractor, &values, prime, digits, total, &chains)?;
        assert_eq!(
            ct.decrypt(),
            expected_extraction(&values, prime, digits, total),
            "p={prime} digits={digits} e={total} chains={chains:?}"
        );
    }
    Ok(())
}

#[test]
fn test_report_matches_counter() -> Result<()> {
    let table = generate_table(3, &[1], 9)?;
    let counter = Arc::new(OpCounter::new());
    let extractor =
        DigitExtractor::new(&table).with_evaluator(Evaluator::with_counter(counter.clone()));
    let values = random_slots(&mut create_rng_from_u64(1), 4, 3, 9);

    let mut ct = ClearCiphertext::encrypt(&values, 3, 9, CAPACITY);
    let first = extractor.extract_digits(&mut ct, 4, 9, &[vec![1]])?;
    assert_eq!(first.operations, counter.snapshot());

    // a second run reports only its own operations
    let mut ct = ClearCiphertext::encrypt(&values, 3, 9, CAPACITY);
    let second = extractor.extract_digits(&mut ct, 4, 9, &[vec![1]])?;
    assert_eq!(second.operations, first.operations);
    assert!(second.capacity_after < second.capacity_before);
    Ok(())
}

#[test]
fn test_tables_from_directory() -> Result<()> {
    let dir = tempdir()?;
    write_table_dir(dir.path(), &generate_table(2, &[1, 16], 20)?)?;

    let config = ExtractionConfig {
        lazy: true,
        composition_chains: vec![vec![1, 16]],
        table_dir: dir.path().to_path_buf(),
        ..ExtractionConfig::default()
    };
    let table = PolynomialTable::load_dir(&config.table_dir)?;
    let extractor = DigitExtractor::from_config(&table, &config);

    let values = random_slots(&mut create_rng_from_u64(9), 8, 2, 20);
    let ct = extract(&extractor, &values, 2, 4, 20, &config.composition_chains)?;
    assert_eq!(ct.decrypt(), expected_extraction(&values, 2, 4, 20));
    Ok(())
}
