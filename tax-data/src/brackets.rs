use std::collections::HashMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::calculations::tax_for_brackets;
use tax_core::tables::{ByFilingStatus, ReferenceTableError, ReferenceTables};
use tax_core::{FilingStatus, TaxBracket};
use thiserror::Error;
use tracing::debug;

use crate::deserialize_optional_decimal;

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error)]
pub enum TaxBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule '{schedule}' on row {row}")]
    InvalidSchedule { schedule: String, row: usize },

    #[error("Row {row} is for tax year {found}, expected {expected}")]
    TaxYearMismatch {
        row: usize,
        expected: i32,
        found: i32,
    },

    #[error(
        "Schedule {schedule} bracket at {min_income} lists base tax {found}, but the brackets below it give {expected}"
    )]
    BaseTaxMismatch {
        schedule: String,
        min_income: Decimal,
        expected: Decimal,
        found: Decimal,
    },

    #[error("Bracket schedule incomplete: {0}")]
    MissingSchedule(#[from] ReferenceTableError),
}

impl From<csv::Error> for TaxBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxBracketLoaderError::CsvParse(err.to_string())
    }
}

/// Maps IRS schedule codes to filing statuses.
///
/// - Schedule X → Single
/// - Schedule Y-1 → Married Filing Jointly
/// - Schedule Z → Head of Household
pub fn schedule_to_filing_status(schedule: &str) -> Option<FilingStatus> {
    match schedule {
        "X" => Some(FilingStatus::Single),
        "Y-1" => Some(FilingStatus::MarriedFilingJointly),
        "Z" => Some(FilingStatus::HeadOfHousehold),
        _ => None,
    }
}

/// A single row of a bracket schedule CSV.
///
/// - `tax_year`: the tax year (e.g. 2025)
/// - `schedule`: the IRS schedule code (X, Y-1, Z)
/// - `min_income`: the bottom of the bracket
/// - `max_income`: the top of the bracket (empty for the top bracket)
/// - `rate`: the marginal rate as a decimal (e.g. 0.10)
/// - `base_tax`: optional; tax owed at `min_income`, used as a cross-check
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub base_tax: Option<Decimal>,
}

/// Loader for bracket schedules published as CSV.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse bracket records from any CSV source.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxBracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into a schedule per filing status.
    ///
    /// Every row must belong to `tax_year` and name a known schedule, and
    /// every filing status must end up with a schedule. Rows are sorted by
    /// `min_income`; any `base_tax` column is checked against the brackets
    /// below it.
    pub fn into_schedules(
        records: &[TaxBracketRecord],
        tax_year: i32,
    ) -> Result<ByFilingStatus<Vec<TaxBracket>>, TaxBracketLoaderError> {
        let mut schedules: HashMap<FilingStatus, Vec<&TaxBracketRecord>> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            // Header is row 1.
            let row = index + 2;
            if record.tax_year != tax_year {
                return Err(TaxBracketLoaderError::TaxYearMismatch {
                    row,
                    expected: tax_year,
                    found: record.tax_year,
                });
            }
            let status = schedule_to_filing_status(&record.schedule).ok_or_else(|| {
                TaxBracketLoaderError::InvalidSchedule {
                    schedule: record.schedule.clone(),
                    row,
                }
            })?;
            schedules.entry(status).or_default().push(record);
        }

        let mut brackets = HashMap::new();
        for (status, mut rows) in schedules {
            rows.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            let schedule: Vec<TaxBracket> = rows
                .iter()
                .map(|r| TaxBracket::new(r.min_income, r.max_income, r.rate))
                .collect();
            Self::check_base_tax(&rows, &schedule)?;
            debug!(
                filing_status = status.as_str(),
                brackets = schedule.len(),
                "bracket schedule loaded"
            );
            brackets.insert(status, schedule);
        }

        Ok(ByFilingStatus::try_from_map(brackets, "tax_brackets")?)
    }

    /// Replace the bracket schedules of `tables` with those in `records`.
    pub fn apply(
        tables: &mut ReferenceTables,
        records: &[TaxBracketRecord],
    ) -> Result<(), TaxBracketLoaderError> {
        tables.brackets = Self::into_schedules(records, tables.tax_year)?;
        Ok(())
    }

    fn check_base_tax(
        rows: &[&TaxBracketRecord],
        schedule: &[TaxBracket],
    ) -> Result<(), TaxBracketLoaderError> {
        for record in rows {
            let Some(found) = record.base_tax else {
                continue;
            };
            let expected = tax_for_brackets(schedule, record.min_income);
            if found != expected {
                return Err(TaxBracketLoaderError::BaseTaxMismatch {
                    schedule: record.schedule.clone(),
                    min_income: record.min_income,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::tables::tax_year_2025;

    use super::*;

    const TEST_CSV: &str = r#"tax_year,schedule,min_income,max_income,rate,base_tax
2025,X,0,11925,0.10,0
2025,X,11925,48475,0.12,1192.50
2025,X,48475,103350,0.22,5578.50
2025,X,103350,197300,0.24,17651.00
2025,X,197300,250525,0.32,40199.00
2025,X,250525,626350,0.35,57231.00
2025,X,626350,,0.37,188769.75
2025,Y-1,0,23850,0.10,0
2025,Y-1,23850,96950,0.12,2385.00
2025,Y-1,96950,206700,0.22,11157.00
2025,Y-1,206700,394600,0.24,35302.00
2025,Y-1,394600,501050,0.32,80398.00
2025,Y-1,501050,751600,0.35,114462.00
2025,Y-1,751600,,0.37,202154.50
2025,Z,0,17000,0.10,0
2025,Z,17000,64850,0.12,1700.00
2025,Z,64850,103350,0.22,7442.00
2025,Z,103350,197300,0.24,15912.00
2025,Z,197300,250500,0.32,38460.00
2025,Z,250500,626350,0.35,55484.00
2025,Z,626350,,0.37,187031.50
"#;

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn parse_single_bracket() {
        let csv = "tax_year,schedule,min_income,max_income,rate,base_tax\n2025,X,0,11925,0.10,0";

        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(
            records,
            vec![TaxBracketRecord {
                tax_year: 2025,
                schedule: "X".to_string(),
                min_income: dec!(0),
                max_income: Some(dec!(11925)),
                rate: dec!(0.10),
                base_tax: Some(dec!(0)),
            }]
        );
    }

    #[test]
    fn parse_without_base_tax_column() {
        let csv = "tax_year,schedule,min_income,max_income,rate\n2025,Z,626350,,0.37";

        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(records[0].max_income, None);
        assert_eq!(records[0].base_tax, None);
    }

    #[test]
    fn parse_trims_whitespace() {
        let csv = "tax_year, schedule, min_income, max_income, rate\n2025, Y-1, 23850, 96950, 0.12";

        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(records[0].schedule, "Y-1");
        assert_eq!(records[0].max_income, Some(dec!(96950)));
    }

    #[test]
    fn parse_missing_column_fails() {
        let csv = "tax_year,schedule,min_income\n2025,X,0";

        let result = TaxBracketLoader::parse(csv.as_bytes());

        let Err(TaxBracketLoaderError::CsvParse(msg)) = result else {
            panic!("expected CsvParse error, got {result:?}");
        };
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn parse_bad_decimal_fails() {
        let csv = "tax_year,schedule,min_income,max_income,rate\n2025,X,abc,11925,0.10";

        let result = TaxBracketLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(TaxBracketLoaderError::CsvParse(_))));
    }

    // =========================================================================
    // into_schedules tests
    // =========================================================================

    #[test]
    fn into_schedules_matches_built_in_tables() {
        let records = TaxBracketLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let schedules = TaxBracketLoader::into_schedules(&records, 2025).unwrap();

        assert_eq!(schedules, tax_year_2025().brackets);
    }

    #[test]
    fn into_schedules_sorts_rows_by_min_income() {
        let csv = "tax_year,schedule,min_income,max_income,rate\n\
                   2025,X,11925,,0.12\n\
                   2025,X,0,11925,0.10\n\
                   2025,Y-1,0,,0.10\n\
                   2025,Z,0,,0.10";
        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        let schedules = TaxBracketLoader::into_schedules(&records, 2025).unwrap();

        assert_eq!(schedules.single[0].min_income, dec!(0));
        assert_eq!(schedules.single[1].min_income, dec!(11925));
    }

    #[test]
    fn into_schedules_rejects_unsupported_schedule() {
        let csv = "tax_year,schedule,min_income,max_income,rate\n\
                   2025,X,0,,0.10\n\
                   2025,Y-2,0,,0.10";
        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        let result = TaxBracketLoader::into_schedules(&records, 2025);

        let Err(TaxBracketLoaderError::InvalidSchedule { schedule, row }) = result else {
            panic!("expected InvalidSchedule, got {result:?}");
        };
        assert_eq!(schedule, "Y-2");
        assert_eq!(row, 3);
    }

    #[test]
    fn into_schedules_rejects_other_tax_year() {
        let csv = "tax_year,schedule,min_income,max_income,rate\n2024,X,0,,0.10";
        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        let result = TaxBracketLoader::into_schedules(&records, 2025);

        assert!(matches!(
            result,
            Err(TaxBracketLoaderError::TaxYearMismatch {
                row: 2,
                expected: 2025,
                found: 2024,
            })
        ));
    }

    #[test]
    fn into_schedules_requires_every_filing_status() {
        let csv = "tax_year,schedule,min_income,max_income,rate\n\
                   2025,X,0,,0.10\n\
                   2025,Z,0,,0.10";
        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        let result = TaxBracketLoader::into_schedules(&records, 2025);

        assert!(matches!(
            result,
            Err(TaxBracketLoaderError::MissingSchedule(
                ReferenceTableError::MissingEntry {
                    status: FilingStatus::MarriedFilingJointly,
                    ..
                }
            ))
        ));
    }

    #[test]
    fn into_schedules_checks_base_tax() {
        let csv = "tax_year,schedule,min_income,max_income,rate,base_tax\n\
                   2025,X,0,11925,0.10,0\n\
                   2025,X,11925,,0.12,1200.00\n\
                   2025,Y-1,0,,0.10,\n\
                   2025,Z,0,,0.10,";
        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        let result = TaxBracketLoader::into_schedules(&records, 2025);

        let Err(TaxBracketLoaderError::BaseTaxMismatch {
            expected, found, ..
        }) = result
        else {
            panic!("expected BaseTaxMismatch, got {result:?}");
        };
        assert_eq!(expected, dec!(1192.50));
        assert_eq!(found, dec!(1200.00));
    }

    #[test]
    fn apply_replaces_table_brackets() {
        let mut tables = tax_year_2025();
        let csv = "tax_year,schedule,min_income,max_income,rate\n\
                   2025,X,0,,0.15\n\
                   2025,Y-1,0,,0.15\n\
                   2025,Z,0,,0.15";
        let records = TaxBracketLoader::parse(csv.as_bytes()).unwrap();

        TaxBracketLoader::apply(&mut tables, &records).unwrap();

        assert_eq!(tables.brackets.single, vec![TaxBracket::new(dec!(0), None, dec!(0.15))]);
        assert_eq!(tables.validate(), Ok(()));
    }
}
