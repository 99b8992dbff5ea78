use std::fmt;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{DividendRecord, IncomeSection, InterestRecord, NonemployeeRecord, WageRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::deserialize_optional_decimal;

#[derive(Debug, Error)]
pub enum InformationReturnError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown form '{form}' on row {row}")]
    InvalidForm { form: String, row: usize },
}

impl From<csv::Error> for InformationReturnError {
    fn from(err: csv::Error) -> Self {
        InformationReturnError::CsvParse(err.to_string())
    }
}

/// Information-return forms that feed the income section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InformationReturnForm {
    W2,
    Interest1099,
    Dividend1099,
    Nonemployee1099,
}

impl InformationReturnForm {
    pub fn parse(form: &str) -> Option<Self> {
        match form.trim().to_ascii_uppercase().as_str() {
            "W-2" | "W2" => Some(Self::W2),
            "1099-INT" => Some(Self::Interest1099),
            "1099-DIV" => Some(Self::Dividend1099),
            "1099-NEC" => Some(Self::Nonemployee1099),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::W2 => "W-2",
            Self::Interest1099 => "1099-INT",
            Self::Dividend1099 => "1099-DIV",
            Self::Nonemployee1099 => "1099-NEC",
        }
    }
}

impl fmt::Display for InformationReturnForm {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of an information-return CSV.
///
/// - `form`: `W-2`, `1099-INT`, `1099-DIV`, or `1099-NEC`
/// - `payer`: employer or payer name
/// - `amount`: the form's primary income box
/// - `federal_withholding`: federal tax withheld (blank for none)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InformationReturnRecord {
    pub form: String,
    #[serde(default)]
    pub payer: String,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub federal_withholding: Option<Decimal>,
}

pub struct InformationReturnLoader;

impl InformationReturnLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<InformationReturnRecord>, InformationReturnError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records: Result<Vec<InformationReturnRecord>, _> = csv_reader.deserialize().collect();
        Ok(records?)
    }

    /// Appends each row to the matching list of `income`.
    ///
    /// Every form is checked before anything is appended, so a bad row
    /// leaves `income` untouched. Returns the number of rows applied.
    pub fn apply(
        income: &mut IncomeSection,
        records: &[InformationReturnRecord],
    ) -> Result<usize, InformationReturnError> {
        let forms = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                // Header is row 1.
                InformationReturnForm::parse(&record.form).ok_or_else(|| {
                    InformationReturnError::InvalidForm {
                        form: record.form.clone(),
                        row: index + 2,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (record, form) in records.iter().zip(forms) {
            if record.amount < Decimal::ZERO {
                warn!(form = %form, payer = %record.payer, amount = %record.amount, "negative information-return amount");
            }
            let withholding = record.federal_withholding.unwrap_or(Decimal::ZERO);
            let payer = record.payer.as_str();
            match form {
                InformationReturnForm::W2 => income
                    .wages
                    .push(WageRecord::new(payer, record.amount, withholding)),
                InformationReturnForm::Interest1099 => income
                    .interest
                    .push(InterestRecord::new(payer, record.amount, withholding)),
                InformationReturnForm::Dividend1099 => income
                    .dividends
                    .push(DividendRecord::new(payer, record.amount, withholding)),
                InformationReturnForm::Nonemployee1099 => income
                    .self_employment
                    .nonemployee_compensation
                    .push(NonemployeeRecord::new(payer, record.amount, withholding)),
            }
        }

        debug!(rows = records.len(), "information returns applied");
        Ok(records.len())
    }
}
