// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::tables::load_tables;
use anyhow::{bail, Result};
use clap::Args;
use recrypt_digits::{best_parameters, DigitPolynomialSource, ExtractionConfig};
use recrypt_polynomial::common_spacing;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Plaintext prime p
    #[arg(short, long)]
    pub prime: u64,

    /// Precision the input digit is already known to
    #[arg(short, long)]
    pub inner: u32,

    /// Target precisions of the batch, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub targets: Vec<u32>,

    /// Schedule for lazy relinearization
    #[arg(long)]
    pub lazy: bool,
}

pub fn execute(config: &ExtractionConfig, args: ScheduleArgs) -> Result<()> {
    let Some(max_target) = args.targets.iter().copied().max() else {
        bail!("At least one target precision is required");
    };
    let table = load_tables(config, args.prime, &[args.inner], max_target)?;

    let polys = args
        .targets
        .iter()
        .map(|target| table.require(args.prime, args.inner, *target).cloned())
        .collect::<recrypt_digits::Result<Vec<_>>>()?;
    for (target, poly) in args.targets.iter().zip(&polys) {
        println!(
            "poly{}_{}_{}: degree {}, odd = {}",
            args.prime,
            args.inner,
            target,
            poly.degree().unwrap_or(0),
            poly.is_odd()
        );
    }

    let spacing = common_spacing(&polys);
    let polys = if spacing > 1 {
        polys
            .iter()
            .map(|p| p.decimate(spacing))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        polys
    };
    let params = best_parameters(&polys, args.lazy)?;

    println!("spacing: {}", spacing);
    println!("k = {}, m = {}, odd = {}", params.k, params.m, params.odd);
    println!("capacity: degree {}", params.capacity());
    println!("multiplications: {}", params.multiplications);
    Ok(())
}
