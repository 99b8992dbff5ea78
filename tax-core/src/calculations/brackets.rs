//! Progressive bracket tax.
//!
//! Each bracket's rate applies only to the slice of taxable income inside
//! that bracket. The whole amount is never taxed at the top marginal rate.

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::models::{FilingStatus, TaxBracket};
use crate::tables::ByFilingStatus;

/// Tax on `taxable_income` under an ordered bracket schedule.
///
/// Income at or below zero is taxed at zero. Iteration stops at the first
/// bracket that starts at or above the income.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::FilingStatus;
/// use tax_core::calculations::tax_for_brackets;
/// use tax_core::tables::tax_year_2025;
///
/// let tables = tax_year_2025();
/// let single = tables.brackets.get(FilingStatus::Single);
///
/// // 1192.50 + 0.12 × (48475 − 11925) + 0.22 × (50000 − 48475)
/// assert_eq!(tax_for_brackets(single, dec!(50000)), dec!(5914.00));
/// ```
pub fn tax_for_brackets(
    brackets: &[TaxBracket],
    taxable_income: Decimal,
) -> Decimal {
    if taxable_income <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let tax = brackets
        .iter()
        .take_while(|bracket| bracket.min_income < taxable_income)
        .map(|bracket| bracket.tax_rate * bracket.income_in_bracket(taxable_income))
        .sum::<Decimal>();

    round_half_up(tax)
}

/// Bracket tax keyed by filing status.
#[derive(Debug, Clone, Copy)]
pub struct BracketTaxCalculator<'a> {
    brackets: &'a ByFilingStatus<Vec<TaxBracket>>,
}

impl<'a> BracketTaxCalculator<'a> {
    pub fn new(brackets: &'a ByFilingStatus<Vec<TaxBracket>>) -> Self {
        Self { brackets }
    }

    pub fn tax_for(
        &self,
        filing_status: FilingStatus,
        taxable_income: Decimal,
    ) -> Decimal {
        let tax = tax_for_brackets(self.brackets.get(filing_status), taxable_income);
        debug!(
            filing_status = filing_status.as_str(),
            taxable_income = %taxable_income,
            tax = %tax,
            "bracket tax computed"
        );
        tax
    }
}
