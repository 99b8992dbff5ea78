//! Command implementations behind the `tax-estimator` binary.
//!
//! Everything here returns text for `main` to print, so commands can be
//! exercised without a terminal.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tax_core::db::{RepositoryRegistry, StoredResult, StoredReturn};
use tax_core::tables::{ReferenceTables, tax_year_2025};
use tax_core::{CalculationResult, RepositoryError, ReturnRepository, TaxEngine, TaxReturn};
use tax_data::{InformationReturnLoader, ReferenceTableLoader, ReturnLoader, TaxBracketLoader};
use tax_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

use crate::report;

/// Registry with every storage backend compiled into the binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Where a `calculate` run reads its inputs from.
#[derive(Debug, Clone, Default)]
pub struct CalculateInputs {
    pub return_path: PathBuf,
    pub tables: Option<PathBuf>,
    pub brackets: Option<PathBuf>,
    pub income_csv: Option<PathBuf>,
}

/// Loads the reference tables: the TOML file when given, else the built-in
/// 2025 set, with bracket schedules optionally replaced from CSV.
pub fn load_tables(
    tables: Option<&Path>,
    brackets: Option<&Path>,
) -> Result<ReferenceTables> {
    let mut loaded = match tables {
        Some(path) => ReferenceTableLoader::from_path(path)
            .with_context(|| format!("Failed to load reference tables from {}", path.display()))?,
        None => {
            debug!("using built-in 2025 reference tables");
            tax_year_2025()
        }
    };

    if let Some(path) = brackets {
        let file = File::open(path)
            .with_context(|| format!("Failed to open bracket file {}", path.display()))?;
        let records = TaxBracketLoader::parse(file)
            .with_context(|| format!("Failed to parse bracket file {}", path.display()))?;
        TaxBracketLoader::apply(&mut loaded, &records)
            .with_context(|| format!("Invalid bracket schedules in {}", path.display()))?;
        info!(path = %path.display(), rows = records.len(), "bracket schedules replaced");
    }

    Ok(loaded)
}

/// Loads a return snapshot, appending information-return rows when a CSV is
/// given.
pub fn load_return(
    path: &Path,
    income_csv: Option<&Path>,
) -> Result<TaxReturn> {
    let mut tax_return = ReturnLoader::from_path(path)
        .with_context(|| format!("Failed to load return from {}", path.display()))?;

    if let Some(csv_path) = income_csv {
        let file = File::open(csv_path)
            .with_context(|| format!("Failed to open {}", csv_path.display()))?;
        let records = InformationReturnLoader::parse(file)
            .with_context(|| format!("Failed to parse {}", csv_path.display()))?;
        let applied = InformationReturnLoader::apply(&mut tax_return.income, &records)
            .with_context(|| format!("Invalid information return in {}", csv_path.display()))?;
        info!(path = %csv_path.display(), applied, "information returns added");
    }

    Ok(tax_return)
}

/// Loads inputs and runs the engine once.
pub fn calculate(inputs: &CalculateInputs) -> Result<(TaxReturn, CalculationResult)> {
    let tables = load_tables(inputs.tables.as_deref(), inputs.brackets.as_deref())?;
    let tax_return = load_return(&inputs.return_path, inputs.income_csv.as_deref())?;

    let engine = TaxEngine::new(&tables).context("Reference tables failed validation")?;
    let result = engine
        .calculate(&tax_return)
        .context("Calculation failed")?;

    Ok((tax_return, result))
}

/// Renders a result as a text report or pretty JSON.
pub fn render(
    result: &CalculationResult,
    json: bool,
) -> Result<String> {
    if json {
        let mut rendered =
            serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        rendered.push('\n');
        Ok(rendered)
    } else {
        Ok(report::render_result(result))
    }
}

/// Stores a return and its result; returns the new return id.
pub async fn save(
    repo: &dyn ReturnRepository,
    tax_return: &TaxReturn,
    result: &CalculationResult,
) -> Result<i64> {
    let stored = repo
        .save_return(tax_return)
        .await
        .context("Failed to save return")?;
    repo.save_result(stored.id, result)
        .await
        .context("Failed to save calculation result")?;
    info!(id = stored.id, "return saved");
    Ok(stored.id)
}

async fn latest_result(
    repo: &dyn ReturnRepository,
    id: i64,
) -> Result<Option<StoredResult>> {
    match repo.get_result(id).await {
        Ok(result) => Ok(Some(result)),
        Err(RepositoryError::NotFound) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to load result for return {id}")),
    }
}

/// Lists stored returns, newest first.
pub async fn list(
    repo: &dyn ReturnRepository,
    tax_year: Option<i32>,
) -> Result<String> {
    let returns = repo
        .list_returns(tax_year)
        .await
        .context("Failed to list returns")?;

    let mut entries: Vec<(StoredReturn, Option<StoredResult>)> = Vec::with_capacity(returns.len());
    for stored in returns {
        let result = latest_result(repo, stored.id).await?;
        entries.push((stored, result));
    }

    Ok(report::render_listing(&entries))
}

/// Shows one stored return and its stored result.
pub async fn show(
    repo: &dyn ReturnRepository,
    id: i64,
    json: bool,
) -> Result<String> {
    let stored = repo
        .get_return(id)
        .await
        .with_context(|| format!("Return {id} not found"))?;

    match latest_result(repo, id).await? {
        Some(result) => render(&result.result, json),
        None => Ok(format!(
            "Return {id}: tax year {}, {} (not yet calculated)\n",
            stored.tax_return.tax_year, stored.tax_return.filing_status
        )),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::FilingStatus;
    use tax_core::db::DbConfig;

    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../tax-data/tests/fixtures")
            .join(name)
    }

    async fn memory_repo() -> Box<dyn ReturnRepository> {
        build_registry()
            .create(&DbConfig::default())
            .await
            .expect("in-memory repository")
    }

    #[test]
    fn registry_offers_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[test]
    fn load_tables_defaults_to_built_in_set() {
        let tables = load_tables(None, None).unwrap();

        assert_eq!(tables, tax_year_2025());
    }

    #[test]
    fn load_tables_applies_bracket_override() {
        let tables = load_tables(
            Some(fixture("tables_2025.toml").as_path()),
            Some(fixture("brackets_2025.csv").as_path()),
        )
        .unwrap();

        assert_eq!(tables.brackets, tax_year_2025().brackets);
    }

    #[test]
    fn load_tables_reports_missing_file() {
        let err = load_tables(Some(Path::new("missing.toml")), None).unwrap_err();

        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn calculate_uses_information_returns() {
        let inputs = CalculateInputs {
            return_path: fixture("return_2025.toml"),
            income_csv: Some(fixture("information_returns.csv")),
            ..Default::default()
        };

        let (tax_return, result) = calculate(&inputs).unwrap();

        assert_eq!(tax_return.filing_status, FilingStatus::HeadOfHousehold);
        assert_eq!(tax_return.income.wages.len(), 2);
        assert_eq!(result.total_wages, dec!(42000));
        assert_eq!(result.refund_or_owed, dec!(3707.08));
    }

    #[test]
    fn render_json_round_trips() {
        let inputs = CalculateInputs {
            return_path: fixture("return_2025.toml"),
            ..Default::default()
        };
        let (_, result) = calculate(&inputs).unwrap();

        let json = render(&result, true).unwrap();
        let parsed: CalculationResult = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, result);
    }

    #[tokio::test]
    async fn save_then_list_and_show() {
        let repo = memory_repo().await;
        let inputs = CalculateInputs {
            return_path: fixture("return_2025.toml"),
            ..Default::default()
        };
        let (tax_return, result) = calculate(&inputs).unwrap();

        let id = save(repo.as_ref(), &tax_return, &result).await.unwrap();
        let listing = list(repo.as_ref(), Some(2025)).await.unwrap();
        let shown = show(repo.as_ref(), id, false).await.unwrap();

        assert!(listing.contains("HOH"));
        assert_eq!(shown, report::render_result(&result));
    }

    #[tokio::test]
    async fn show_uncalculated_return() {
        let repo = memory_repo().await;
        let stored = repo
            .save_return(&TaxReturn::new(2025, FilingStatus::Single))
            .await
            .unwrap();

        let shown = show(repo.as_ref(), stored.id, false).await.unwrap();

        assert_eq!(
            shown,
            format!("Return {}: tax year 2025, Single (not yet calculated)\n", stored.id)
        );
    }

    #[tokio::test]
    async fn show_missing_return_fails() {
        let repo = memory_repo().await;

        let err = show(repo.as_ref(), 404, false).await.unwrap_err();

        assert!(err.to_string().contains("404"));
    }
}
