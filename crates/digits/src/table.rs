// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Precomputed digit-retain polynomials.
//!
//! The polynomial keyed `(p, inner, target)` maps an input whose lowest digit
//! is known modulo `p^inner` to that digit modulo `p^target`. Tables are
//! produced offline and stored one polynomial per file, named
//! `poly{p}_{inner}_{target}.txt`, with whitespace-separated integer
//! coefficients from the constant term upward.

use crate::{DigitExtractionError, Result};
use once_cell::sync::Lazy;
use recrypt_polynomial::Polynomial;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub prime: u64,
    pub inner: u32,
    pub target: u32,
}

impl TableKey {
    pub fn new(prime: u64, inner: u32, target: u32) -> Self {
        Self {
            prime,
            inner,
            target,
        }
    }

    /// File name used for this entry in a table directory.
    pub fn file_name(&self) -> String {
        format!("poly{}_{}_{}.txt", self.prime, self.inner, self.target)
    }
}

/// Read-only access to digit-retain polynomials.
pub trait DigitPolynomialSource: Send + Sync {
    fn lookup(&self, prime: u64, inner: u32, target: u32) -> Option<&Polynomial>;

    /// Like `lookup`, but a missing entry is an error.
    fn require(&self, prime: u64, inner: u32, target: u32) -> Result<&Polynomial> {
        self.lookup(prime, inner, target)
            .ok_or(DigitExtractionError::MissingPolynomial {
                prime,
                inner,
                target,
            })
    }
}

/// In-memory polynomial table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolynomialTable {
    entries: BTreeMap<TableKey, Polynomial>,
}

static FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^poly(\d+)_(\d+)_(\d+)\.txt$").expect("valid table file pattern"));

/// Parses a table file name into its key, if it follows the naming scheme.
pub fn parse_file_name(name: &str) -> Option<TableKey> {
    let captures = FILE_NAME.captures(name)?;
    Some(TableKey {
        prime: captures[1].parse().ok()?,
        inner: captures[2].parse().ok()?,
        target: captures[3].parse().ok()?,
    })
}

impl PolynomialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: TableKey, polynomial: Polynomial) -> Option<Polynomial> {
        self.entries.insert(key, polynomial)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TableKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableKey, &Polynomial)> {
        self.entries.iter()
    }

    /// Extends the table with every entry of `other`, which wins on conflicts.
    pub fn merge(&mut self, other: PolynomialTable) {
        self.entries.extend(other.entries);
    }

    /// Loads every `poly{p}_{inner}_{target}.txt` file in `dir`.
    ///
    /// Files that do not follow the naming scheme are ignored. A file that
    /// names a target not above its inner precision, or whose content does
    /// not parse, is an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut table = Self::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(parse_file_name) else {
                continue;
            };
            if key.target <= key.inner {
                return Err(DigitExtractionError::table(format!(
                    "{}: target precision must exceed inner precision",
                    key.file_name()
                )));
            }

            let content = fs::read_to_string(entry.path())?;
            let polynomial: Polynomial = content.parse().map_err(|e| {
                DigitExtractionError::table(format!("{}: {e}", key.file_name()))
            })?;
            debug!(?key, degree = ?polynomial.degree(), "loaded digit-retain polynomial");
            table.insert(key, polynomial);
        }

        info!(dir = ?dir, entries = table.len(), "loaded polynomial table");
        Ok(table)
    }
}

impl DigitPolynomialSource for PolynomialTable {
    fn lookup(&self, prime: u64, inner: u32, target: u32) -> Option<&Polynomial> {
        self.entries.get(&TableKey::new(prime, inner, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_file_name() {
        assert_eq!(parse_file_name("poly2_1_16.txt"), Some(TableKey::new(2, 1, 16)));
        assert_eq!(
            parse_file_name("poly17_3_40.txt"),
            Some(TableKey::new(17, 3, 40))
        );
        assert_eq!(parse_file_name("poly2_1_16.txt.bak"), None);
        assert_eq!(parse_file_name("poly2_1.txt"), None);
        assert_eq!(parse_file_name("README.md"), None);
        assert_eq!(TableKey::new(3, 6, 37).file_name(), "poly3_6_37.txt");
    }

    #[test]
    fn test_lookup_and_require() {
        let mut table = PolynomialTable::new();
        table.insert(TableKey::new(2, 1, 2), Polynomial::from_i64s(&[0, 0, 1]));
        assert!(table.lookup(2, 1, 2).is_some());
        assert!(table.lookup(2, 1, 3).is_none());
        assert!(matches!(
            table.require(3, 1, 2),
            Err(DigitExtractionError::MissingPolynomial {
                prime: 3,
                inner: 1,
                target: 2
            })
        ));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut table = PolynomialTable::new();
        table.insert(TableKey::new(2, 1, 2), Polynomial::from_i64s(&[0, 1]));
        table.insert(TableKey::new(2, 1, 3), Polynomial::from_i64s(&[0, 1]));
        let mut other = PolynomialTable::new();
        other.insert(TableKey::new(2, 1, 2), Polynomial::from_i64s(&[0, 0, 1]));
        table.merge(other);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(2, 1, 2),
            Some(&Polynomial::from_i64s(&[0, 0, 1]))
        );
    }

    #[test]
    fn test_load_dir() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("poly3_1_2.txt"), "0 -2 0 3\n")?;
        fs::write(dir.path().join("poly3_1_3.txt"), "0 1 0 1 0 -12")?;
        fs::write(dir.path().join("notes.txt"), "not a table")?;

        let table = PolynomialTable::load_dir(dir.path())?;
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(3, 1, 2),
            Some(&Polynomial::from_i64s(&[0, -2, 0, 3]))
        );
        assert_eq!(
            table.keys().copied().collect::<Vec<_>>(),
            vec![TableKey::new(3, 1, 2), TableKey::new(3, 1, 3)]
        );
        Ok(())
    }

    #[test]
    fn test_load_dir_rejects_bad_files() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("poly2_1_5.txt"), "1 2 three")?;
        assert!(matches!(
            PolynomialTable::load_dir(dir.path()),
            Err(DigitExtractionError::Table { .. })
        ));

        let dir = tempdir()?;
        fs::write(dir.path().join("poly2_4_4.txt"), "0 1")?;
        assert!(matches!(
            PolynomialTable::load_dir(dir.path()),
            Err(DigitExtractionError::Table { .. })
        ));

        assert!(matches!(
            PolynomialTable::load_dir(dir.path().join("missing")),
            Err(DigitExtractionError::Io(_))
        ));
        Ok(())
    }
}
