//! Self-employment tax.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Net profit from self-employment (may be a loss) |
//! | 2    | Net earnings: step 1 × 92.35% |
//! | 3    | SE tax: step 2 × 15.3% when step 2 is positive |
//! | 4    | Deductible part of SE tax: step 3 × 50% |
//!
//! The combined rate is applied to all net earnings. There is no Social
//! Security wage-base cap and no minimum-earnings threshold.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::SelfEmploymentTaxCalculator;
//! use tax_core::tables::tax_year_2025;
//!
//! let tables = tax_year_2025();
//! let calculator = SelfEmploymentTaxCalculator::new(&tables.self_employment);
//!
//! let result = calculator.calculate(dec!(40000));
//!
//! assert_eq!(result.net_earnings, dec!(36940.00));
//! assert_eq!(result.self_employment_tax, dec!(5651.82));
//! assert_eq!(result.deduction, dec!(2825.91));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;
use crate::tables::SelfEmploymentParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmploymentTaxResult {
    pub net_profit: Decimal,
    /// Net profit after the employer-equivalent exclusion.
    pub net_earnings: Decimal,
    pub self_employment_tax: Decimal,
    /// Half of the SE tax, taken as an above-the-line adjustment.
    pub deduction: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct SelfEmploymentTaxCalculator<'a> {
    params: &'a SelfEmploymentParams,
}

impl<'a> SelfEmploymentTaxCalculator<'a> {
    pub fn new(params: &'a SelfEmploymentParams) -> Self {
        Self { params }
    }

    pub fn calculate(
        &self,
        net_profit: Decimal,
    ) -> SelfEmploymentTaxResult {
        let net_earnings = self.net_earnings(net_profit);
        let self_employment_tax = self.self_employment_tax(net_earnings);
        let deduction = self.deduction(self_employment_tax);

        debug!(
            net_profit = %net_profit,
            net_earnings = %net_earnings,
            self_employment_tax = %self_employment_tax,
            "self-employment tax computed"
        );

        SelfEmploymentTaxResult {
            net_profit,
            net_earnings,
            self_employment_tax,
            deduction,
        }
    }

    /// A loss produces negative net earnings, which are reported as-is.
    fn net_earnings(
        &self,
        net_profit: Decimal,
    ) -> Decimal {
        if net_profit < Decimal::ZERO {
            warn!(net_profit = %net_profit, "self-employment loss; no SE tax due");
        }
        round_half_up(net_profit * self.params.net_earnings_factor)
    }

    fn self_employment_tax(
        &self,
        net_earnings: Decimal,
    ) -> Decimal {
        if net_earnings <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_half_up(net_earnings * self.params.tax_rate)
    }

    fn deduction(
        &self,
        self_employment_tax: Decimal,
    ) -> Decimal {
        round_half_up(self_employment_tax * self.params.deduction_factor)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn test_params() -> SelfEmploymentParams {
        SelfEmploymentParams {
            net_earnings_factor: dec!(0.9235),
            tax_rate: dec!(0.153),
            deduction_factor: dec!(0.50),
        }
    }

    // =========================================================================
    // net_earnings tests
    // =========================================================================

    #[test]
    fn net_earnings_applies_factor() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.net_earnings(dec!(40000));

        // 40000 × 0.9235 = 36940
        assert_eq!(result, dec!(36940.00));
    }

    #[test]
    fn net_earnings_rounds_to_cents() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.net_earnings(dec!(1234.57));

        // 1234.57 × 0.9235 = 1140.125395
        assert_eq!(result, dec!(1140.13));
    }

    #[test]
    fn net_earnings_keeps_loss_negative() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.net_earnings(dec!(-10000));

        assert_eq!(result, dec!(-9235.00));
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_forty_thousand_profit() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.calculate(dec!(40000));

        // 36940 × 0.153 = 5651.82; half = 2825.91
        assert_eq!(
            result,
            SelfEmploymentTaxResult {
                net_profit: dec!(40000),
                net_earnings: dec!(36940.00),
                self_employment_tax: dec!(5651.82),
                deduction: dec!(2825.91),
            }
        );
    }

    #[test]
    fn calculate_zero_profit_is_zero_tax() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.calculate(dec!(0));

        assert_eq!(result.self_employment_tax, dec!(0));
        assert_eq!(result.deduction, dec!(0));
    }

    #[test]
    fn calculate_loss_is_zero_tax() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.calculate(dec!(-5000));

        assert_eq!(result.self_employment_tax, dec!(0));
        assert_eq!(result.deduction, dec!(0));
    }

    #[test]
    fn calculate_small_profit_is_taxed_without_threshold() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.calculate(dec!(300));

        // 300 × 0.9235 = 277.05; × 0.153 = 42.38865
        assert_eq!(result.self_employment_tax, dec!(42.39));
        assert_eq!(result.deduction, dec!(21.20)); // 21.195 rounds up
    }

    #[test]
    fn calculate_high_profit_has_no_wage_base_cap() {
        let params = test_params();
        let calculator = SelfEmploymentTaxCalculator::new(&params);

        let result = calculator.calculate(dec!(400000));

        // 400000 × 0.9235 = 369400; × 0.153 = 56518.20
        assert_eq!(result.self_employment_tax, dec!(56518.20));
    }
}
