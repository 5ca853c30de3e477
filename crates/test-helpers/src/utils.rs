// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use recrypt_digits::PolynomialTable;
use tracing::{error, trace};

pub fn write_file_with_dirs(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let abs_path: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    match abs_path.to_str() {
        Some(s) => trace!(path = s, "Writing to path"),
        None => error!(path=?abs_path, "Cannot parse path"),
    };

    if let Some(parent) = abs_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(&abs_path)?;
    file.write_all(content)?;
    trace!(path=?abs_path, "File written successfully!");
    Ok(())
}

/// Writes every entry of `table` as `poly{p}_{inner}_{target}.txt` under
/// `dir`, coefficients from the constant term upward.
pub fn write_table_dir(dir: &Path, table: &PolynomialTable) -> std::io::Result<()> {
    for (key, polynomial) in table.iter() {
        let content = polynomial
            .coefficients()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write_file_with_dirs(&dir.join(key.file_name()), content.as_bytes())?;
    }
    Ok(())
}
