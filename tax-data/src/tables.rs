use std::fs;
use std::path::{Path, PathBuf};

use tax_core::tables::{ReferenceTableError, ReferenceTables};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReferenceTableLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid reference tables: {0}")]
    Invalid(#[from] ReferenceTableError),
}

/// Loads a complete reference table set from TOML.
///
/// Tables are validated as they are loaded, so a defective file is rejected
/// here rather than at calculation time.
pub struct ReferenceTableLoader;

impl ReferenceTableLoader {
    pub fn from_toml_str(source: &str) -> Result<ReferenceTables, ReferenceTableLoadError> {
        let tables: ReferenceTables = toml::from_str(source)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<ReferenceTables, ReferenceTableLoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ReferenceTableLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tables = Self::from_toml_str(&source)?;
        info!(path = %path.display(), tax_year = tables.tax_year, "reference tables loaded");
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::FilingStatus;
    use tax_core::tables::tax_year_2025;

    use super::*;

    #[test]
    fn built_in_tables_survive_toml_round_trip() {
        let tables = tax_year_2025();

        let rendered = toml::to_string(&tables).unwrap();
        let reloaded = ReferenceTableLoader::from_toml_str(&rendered).unwrap();

        assert_eq!(reloaded, tables);
    }

    #[test]
    fn edited_toml_changes_loaded_values() {
        let mut tables = tax_year_2025();
        tables.tax_year = 2026;
        tables.standard_deduction.amounts.single = dec!(15750);
        let rendered = toml::to_string(&tables).unwrap();

        let reloaded = ReferenceTableLoader::from_toml_str(&rendered).unwrap();

        assert_eq!(reloaded.tax_year, 2026);
        assert_eq!(
            *reloaded.standard_deduction.amounts.get(FilingStatus::Single),
            dec!(15750)
        );
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let mut tables = tax_year_2025();
        tables.brackets.head_of_household.pop();
        let rendered = toml::to_string(&tables).unwrap();

        let result = ReferenceTableLoader::from_toml_str(&rendered);

        assert!(matches!(
            result,
            Err(ReferenceTableLoadError::Invalid(
                ReferenceTableError::BoundedTopBracket(FilingStatus::HeadOfHousehold)
            ))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = ReferenceTableLoader::from_toml_str("tax_year = ");

        assert!(matches!(result, Err(ReferenceTableLoadError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let result = ReferenceTableLoader::from_path("does/not/exist.toml");

        let Err(ReferenceTableLoadError::Io { path, .. }) = result else {
            panic!("expected Io error, got {result:?}");
        };
        assert_eq!(path, PathBuf::from("does/not/exist.toml"));
    }
}
