use std::fs;
use std::path::{Path, PathBuf};

use tax_core::TaxReturn;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReturnLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reads return snapshots written as TOML.
///
/// Every section is optional; only `tax_year` and `filing_status` are
/// required. Filing status accepts either the long form
/// (`married_filing_jointly`) or the short code (`MFJ`).
///
/// ```
/// use tax_core::FilingStatus;
/// use tax_data::ReturnLoader;
///
/// let tax_return = ReturnLoader::from_toml_str(r#"
///     tax_year = 2025
///     filing_status = "HOH"
///
///     [[income.wages]]
///     employer = "Acme"
///     wages = "41000"
///     federal_withholding = "2900"
/// "#).unwrap();
///
/// assert_eq!(tax_return.filing_status, FilingStatus::HeadOfHousehold);
/// assert_eq!(tax_return.income.wages.len(), 1);
/// ```
pub struct ReturnLoader;

impl ReturnLoader {
    pub fn from_toml_str(source: &str) -> Result<TaxReturn, ReturnLoadError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<TaxReturn, ReturnLoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ReturnLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tax_return = Self::from_toml_str(&source)?;
        info!(
            path = %path.display(),
            tax_year = tax_return.tax_year,
            filing_status = tax_return.filing_status.as_str(),
            "return loaded"
        );
        Ok(tax_return)
    }
}
