// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use recrypt_digits::{generate_table, ExtractionConfig, PolynomialTable};
use tracing::info;

/// Generated polynomials for the given inner precisions, overridden by any
/// table files found in the configured directory.
pub fn load_tables(
    config: &ExtractionConfig,
    prime: u64,
    inners: &[u32],
    max_precision: u32,
) -> Result<PolynomialTable> {
    let mut table = generate_table(prime, inners, max_precision)
        .context("Could not generate digit-retain polynomials")?;

    if config.table_dir.is_dir() {
        let loaded = PolynomialTable::load_dir(&config.table_dir)
            .with_context(|| format!("Could not load tables from {:?}", config.table_dir))?;
        info!(dir = ?config.table_dir, entries = loaded.len(), "Using table files");
        table.merge(loaded);
    }

    Ok(table)
}
