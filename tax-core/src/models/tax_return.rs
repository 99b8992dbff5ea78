//! Tax-return snapshot consumed by the calculation engine.
//!
//! A [`TaxReturn`] is a plain value assembled by the form layer (or loaded
//! from a file). Every section defaults to empty or zero, so a freshly
//! constructed return is a valid input that produces a zero-tax result.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FilingStatus;

/// Identifier attached to each information-return record.
///
/// Generated as a UUIDv7 when a record is constructed, or when a
/// deserialized record omits its `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RecordId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reportable boxes of one wage statement (Form W-2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub employer: String,
    /// Box 1: wages, tips, other compensation.
    pub wages: Decimal,
    /// Box 2: federal income tax withheld.
    #[serde(default)]
    pub federal_withholding: Decimal,
}

impl WageRecord {
    pub fn new(
        employer: impl Into<String>,
        wages: Decimal,
        federal_withholding: Decimal,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            employer: employer.into(),
            wages,
            federal_withholding,
        }
    }
}

/// Reportable boxes of one Form 1099-INT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub payer: String,
    /// Box 1: interest income.
    pub interest_income: Decimal,
    /// Box 4: federal income tax withheld.
    #[serde(default)]
    pub federal_withholding: Decimal,
}

impl InterestRecord {
    pub fn new(
        payer: impl Into<String>,
        interest_income: Decimal,
        federal_withholding: Decimal,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            payer: payer.into(),
            interest_income,
            federal_withholding,
        }
    }
}

/// Reportable boxes of one Form 1099-DIV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub payer: String,
    /// Box 1a: total ordinary dividends.
    pub ordinary_dividends: Decimal,
    /// Box 4: federal income tax withheld.
    #[serde(default)]
    pub federal_withholding: Decimal,
}

impl DividendRecord {
    pub fn new(
        payer: impl Into<String>,
        ordinary_dividends: Decimal,
        federal_withholding: Decimal,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            payer: payer.into(),
            ordinary_dividends,
            federal_withholding,
        }
    }
}

/// Reportable boxes of one Form 1099-NEC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonemployeeRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub payer: String,
    /// Box 1: nonemployee compensation.
    pub compensation: Decimal,
    /// Box 4: federal income tax withheld.
    #[serde(default)]
    pub federal_withholding: Decimal,
}

impl NonemployeeRecord {
    pub fn new(
        payer: impl Into<String>,
        compensation: Decimal,
        federal_withholding: Decimal,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            payer: payer.into(),
            compensation,
            federal_withholding,
        }
    }
}

/// Self-employment activity. Net profit is derived, never entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfEmploymentIncome {
    pub nonemployee_compensation: Vec<NonemployeeRecord>,
    /// Receipts not reported on a 1099-NEC.
    pub other_gross_receipts: Decimal,
    pub business_expenses: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeSection {
    pub wages: Vec<WageRecord>,
    pub interest: Vec<InterestRecord>,
    pub dividends: Vec<DividendRecord>,
    pub self_employment: SelfEmploymentIncome,
}

/// Above-the-line adjustments as entered. Caps are applied by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub student_loan_interest: Decimal,
    pub educator_expenses: Decimal,
    pub ira_contributions: Decimal,
    pub hsa_contributions: Decimal,
}

/// Inputs for the standard-vs-itemized decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionInputs {
    /// The filer can be claimed as a dependent on someone else's return.
    pub claimed_as_dependent: bool,
    pub medical_expenses: Decimal,
    /// State and local income, sales, and property taxes (before the cap).
    pub state_local_taxes: Decimal,
    pub mortgage_interest: Decimal,
    pub charitable_contributions: Decimal,
    pub other_itemized: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    #[serde(default)]
    pub name: String,
    /// Age at the end of the tax year.
    pub age: u8,
}

impl Dependent {
    pub fn new(
        name: impl Into<String>,
        age: u8,
    ) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// Qualified education expenses for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentExpenses {
    #[serde(default)]
    pub name: String,
    pub qualified_expenses: Decimal,
    /// Number of prior years the American Opportunity credit was claimed
    /// for this student.
    #[serde(default)]
    pub aotc_years_claimed: u8,
}

impl StudentExpenses {
    pub fn new(
        name: impl Into<String>,
        qualified_expenses: Decimal,
        aotc_years_claimed: u8,
    ) -> Self {
        Self {
            name: name.into(),
            qualified_expenses,
            aotc_years_claimed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditInputs {
    pub dependents: Vec<Dependent>,
    /// Investment income not reported on a 1099-INT or 1099-DIV
    /// (capital gains, rents, royalties). Counts toward the EITC ceiling.
    pub other_investment_income: Decimal,
    pub students: Vec<StudentExpenses>,
}

/// A complete return snapshot for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxReturn {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub income: IncomeSection,
    #[serde(default)]
    pub adjustments: Adjustments,
    #[serde(default)]
    pub deductions: DeductionInputs,
    #[serde(default)]
    pub credits: CreditInputs,
}

impl TaxReturn {
    /// An empty return: no income, no adjustments, no credits.
    pub fn new(
        tax_year: i32,
        filing_status: FilingStatus,
    ) -> Self {
        Self {
            tax_year,
            filing_status,
            income: IncomeSection::default(),
            adjustments: Adjustments::default(),
            deductions: DeductionInputs::default(),
            credits: CreditInputs::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn generated_record_ids_are_unique() {
        let a = WageRecord::new("Acme", dec!(1000), dec!(0));
        let b = WageRecord::new("Acme", dec!(1000), dec!(0));

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn new_return_has_empty_sections() {
        let tax_return = TaxReturn::new(2025, FilingStatus::Single);

        assert!(tax_return.income.wages.is_empty());
        assert!(tax_return.income.interest.is_empty());
        assert!(tax_return.income.dividends.is_empty());
        assert_eq!(tax_return.adjustments, Adjustments::default());
        assert!(!tax_return.deductions.claimed_as_dependent);
        assert!(tax_return.credits.dependents.is_empty());
    }

    #[test]
    fn record_id_displays_as_uuid() {
        let id = RecordId::generate();

        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
