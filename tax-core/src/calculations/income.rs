//! Income aggregation.
//!
//! Sums each category of information-return records and derives
//! self-employment net profit. Profit is reported before the net-earnings
//! factor; that factor only matters to the SE tax stage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;
use crate::models::{IncomeSection, SelfEmploymentIncome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTotals {
    pub total_wages: Decimal,
    pub total_interest: Decimal,
    pub total_dividends: Decimal,
    pub nonemployee_compensation: Decimal,
    /// Negative when expenses exceed receipts.
    pub self_employment_profit: Decimal,
    pub gross_income: Decimal,
    /// Federal withholding from every record of every kind.
    pub total_withholding: Decimal,
}

/// Aggregates the income section of a return.
///
/// Empty sections sum to zero. Negative entries are summed as given and
/// logged so the caller can surface them.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::income::aggregate;
/// use tax_core::{IncomeSection, InterestRecord, WageRecord};
///
/// let income = IncomeSection {
///     wages: vec![
///         WageRecord::new("Acme", dec!(42000), dec!(3100)),
///         WageRecord::new("Globex", dec!(8000), dec!(400)),
///     ],
///     interest: vec![InterestRecord::new("First Bank", dec!(125.40), dec!(0))],
///     ..Default::default()
/// };
///
/// let totals = aggregate(&income);
///
/// assert_eq!(totals.gross_income, dec!(50125.40));
/// assert_eq!(totals.total_withholding, dec!(3500));
/// ```
pub fn aggregate(income: &IncomeSection) -> IncomeTotals {
    let total_wages = sum_amounts("wages", income.wages.iter().map(|w| w.wages));
    let total_interest = sum_amounts(
        "interest_income",
        income.interest.iter().map(|i| i.interest_income),
    );
    let total_dividends = sum_amounts(
        "ordinary_dividends",
        income.dividends.iter().map(|d| d.ordinary_dividends),
    );
    let nonemployee_compensation = sum_amounts(
        "nonemployee_compensation",
        income
            .self_employment
            .nonemployee_compensation
            .iter()
            .map(|n| n.compensation),
    );
    let self_employment_profit =
        self_employment_profit(&income.self_employment, nonemployee_compensation);

    let gross_income =
        round_half_up(total_wages + total_interest + total_dividends + self_employment_profit);
    let total_withholding = total_withholding(income);

    debug!(
        gross_income = %gross_income,
        total_withholding = %total_withholding,
        wage_records = income.wages.len(),
        "income aggregated"
    );

    IncomeTotals {
        total_wages,
        total_interest,
        total_dividends,
        nonemployee_compensation,
        self_employment_profit,
        gross_income,
        total_withholding,
    }
}

fn sum_amounts(
    field: &'static str,
    amounts: impl Iterator<Item = Decimal>,
) -> Decimal {
    let total = amounts.fold(Decimal::ZERO, |acc, amount| {
        if amount < Decimal::ZERO {
            warn!(field, amount = %amount, "negative income entry");
        }
        acc + amount
    });
    round_half_up(total)
}

/// 1099-NEC compensation plus other receipts, less business expenses.
fn self_employment_profit(
    self_employment: &SelfEmploymentIncome,
    nonemployee_compensation: Decimal,
) -> Decimal {
    let profit = nonemployee_compensation + self_employment.other_gross_receipts
        - self_employment.business_expenses;
    round_half_up(profit)
}

fn total_withholding(income: &IncomeSection) -> Decimal {
    let withheld = income
        .wages
        .iter()
        .map(|w| w.federal_withholding)
        .chain(income.interest.iter().map(|i| i.federal_withholding))
        .chain(income.dividends.iter().map(|d| d.federal_withholding))
        .chain(
            income
                .self_employment
                .nonemployee_compensation
                .iter()
                .map(|n| n.federal_withholding),
        );
    sum_amounts("federal_withholding", withheld)
}
