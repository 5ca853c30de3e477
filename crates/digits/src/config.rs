// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "RECRYPT_";

/// Settings for a digit extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Defer relinearization of products feeding an addition.
    pub lazy: bool,
    /// Evaluate the polynomials of a row on the rayon pool.
    pub parallel: bool,
    /// Composition chain per trapezoid row. The last chain applies to all
    /// remaining rows.
    pub composition_chains: Vec<Vec<u32>>,
    /// Directory holding `poly{p}_{inner}_{target}.txt` files.
    pub table_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lazy: false,
            parallel: false,
            composition_chains: vec![vec![1]],
            table_dir: PathBuf::from("polynomials"),
        }
    }
}

/// Loads the configuration from defaults, then the YAML file at `path` if
/// given, then `RECRYPT_*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    let mut figment = Figment::from(Serialized::defaults(ExtractionConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    let config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
    Ok(config)
}
