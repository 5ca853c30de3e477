// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::extract::{self, ExtractArgs};
use crate::helpers::telemetry::setup_simple_tracing;
use crate::schedule::{self, ScheduleArgs};
use anyhow::{Context, Result};
use clap::{command, ArgAction, Parser, Subcommand};
use recrypt_digits::load_config;
use tracing::{debug, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "recrypt")]
#[command(about = "Thin digit extraction for BGV bootstrapping, simulated on cleartext ciphertexts", long_about = None)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `recrypt -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());

        let config = load_config(self.config.as_deref()).context("Could not load configuration")?;
        debug!(?config, "Config loaded");

        match self.command {
            Commands::Extract(args) => extract::execute(config, args)?,
            Commands::Schedule(args) => schedule::execute(&config, args)?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract digits from random cleartext ciphertexts and check the result
    Extract(ExtractArgs),

    /// Print the Paterson-Stockmeyer schedule for a batch of table polynomials
    Schedule(ScheduleArgs),
}
