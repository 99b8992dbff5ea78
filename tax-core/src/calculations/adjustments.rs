//! Above-the-line adjustments and adjusted gross income.
//!
//! Each entered adjustment is capped at its published limit before summing.
//! The deductible half of SE tax is added uncapped. AGI is not floored: a
//! net loss produces a negative AGI that flows on to the deduction and
//! credit stages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{clamp_input, min, round_half_up};
use crate::models::Adjustments;
use crate::tables::AdjustmentLimits;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentsResult {
    pub student_loan_interest: Decimal,
    pub educator_expenses: Decimal,
    pub ira_contributions: Decimal,
    pub hsa_contributions: Decimal,
    pub self_employment_tax_deduction: Decimal,
    /// Capped adjustments plus the SE tax deduction.
    pub total_adjustments: Decimal,
    pub adjusted_gross_income: Decimal,
}

/// Applies adjustment caps and computes AGI.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::Adjustments;
/// use tax_core::calculations::AdjustmentsCalculator;
/// use tax_core::tables::tax_year_2025;
///
/// let tables = tax_year_2025();
/// let calculator = AdjustmentsCalculator::new(&tables.adjustments);
/// let adjustments = Adjustments {
///     student_loan_interest: dec!(3100),
///     ..Default::default()
/// };
///
/// let result = calculator.calculate(dec!(60000), &adjustments, dec!(0));
///
/// // Student loan interest is capped at 2500.
/// assert_eq!(result.adjusted_gross_income, dec!(57500));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentsCalculator<'a> {
    limits: &'a AdjustmentLimits,
}

impl<'a> AdjustmentsCalculator<'a> {
    pub fn new(limits: &'a AdjustmentLimits) -> Self {
        Self { limits }
    }

    pub fn calculate(
        &self,
        gross_income: Decimal,
        adjustments: &Adjustments,
        self_employment_tax_deduction: Decimal,
    ) -> AdjustmentsResult {
        let student_loan_interest = self.capped(
            "student_loan_interest",
            adjustments.student_loan_interest,
            self.limits.student_loan_interest,
        );
        let educator_expenses = self.capped(
            "educator_expenses",
            adjustments.educator_expenses,
            self.limits.educator_expenses,
        );
        let ira_contributions = self.capped(
            "ira_contributions",
            adjustments.ira_contributions,
            self.limits.ira_contributions,
        );
        let hsa_contributions = self.capped(
            "hsa_contributions",
            adjustments.hsa_contributions,
            self.limits.hsa_contributions,
        );

        let total_adjustments = round_half_up(
            student_loan_interest
                + educator_expenses
                + ira_contributions
                + hsa_contributions
                + self_employment_tax_deduction,
        );
        let adjusted_gross_income = round_half_up(gross_income - total_adjustments);

        debug!(
            total_adjustments = %total_adjustments,
            adjusted_gross_income = %adjusted_gross_income,
            "adjusted gross income computed"
        );

        AdjustmentsResult {
            student_loan_interest,
            educator_expenses,
            ira_contributions,
            hsa_contributions,
            self_employment_tax_deduction,
            total_adjustments,
            adjusted_gross_income,
        }
    }

    fn capped(
        &self,
        field: &'static str,
        amount: Decimal,
        cap: Decimal,
    ) -> Decimal {
        round_half_up(min(clamp_input(field, amount), cap))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn test_limits() -> AdjustmentLimits {
        AdjustmentLimits {
            student_loan_interest: dec!(2500),
            educator_expenses: dec!(300),
            ira_contributions: dec!(7000),
            hsa_contributions: dec!(4300),
        }
    }

    // =========================================================================
    // capped tests
    // =========================================================================

    #[test]
    fn capped_keeps_amount_under_limit() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);

        let result = calculator.capped("educator_expenses", dec!(180.50), dec!(300));

        assert_eq!(result, dec!(180.50));
    }

    #[test]
    fn capped_limits_amount_over_cap() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);

        let result = calculator.capped("ira_contributions", dec!(8000), dec!(7000));

        assert_eq!(result, dec!(7000));
    }

    #[test]
    fn capped_clamps_negative_entry() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);

        let result = calculator.capped("hsa_contributions", dec!(-1000), dec!(4300));

        assert_eq!(result, dec!(0));
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_without_adjustments_keeps_gross_income() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);

        let result = calculator.calculate(dec!(48000), &Adjustments::default(), dec!(0));

        assert_eq!(result.total_adjustments, dec!(0));
        assert_eq!(result.adjusted_gross_income, dec!(48000));
    }

    #[test]
    fn calculate_caps_each_field_independently() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);
        let adjustments = Adjustments {
            student_loan_interest: dec!(3000),
            educator_expenses: dec!(250),
            ira_contributions: dec!(9000),
            hsa_contributions: dec!(1000),
        };

        let result = calculator.calculate(dec!(80000), &adjustments, dec!(0));

        // 2500 + 250 + 7000 + 1000
        assert_eq!(result.total_adjustments, dec!(10750));
        assert_eq!(result.adjusted_gross_income, dec!(69250));
    }

    #[test]
    fn calculate_subtracts_self_employment_deduction() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);

        let result = calculator.calculate(dec!(40000), &Adjustments::default(), dec!(2825.91));

        assert_eq!(result.self_employment_tax_deduction, dec!(2825.91));
        assert_eq!(result.adjusted_gross_income, dec!(37174.09));
    }

    #[test]
    fn calculate_allows_negative_agi() {
        let limits = test_limits();
        let calculator = AdjustmentsCalculator::new(&limits);
        let adjustments = Adjustments {
            ira_contributions: dec!(7000),
            ..Default::default()
        };

        let result = calculator.calculate(dec!(-3000), &adjustments, dec!(0));

        assert_eq!(result.adjusted_gross_income, dec!(-10000));
    }
}
