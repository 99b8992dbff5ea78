//! Standard-versus-itemized deduction selection.
//!
//! Both paths are always computed so the result can show what was compared.
//! Itemizing is chosen only when strictly larger; a tie keeps the standard
//! deduction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{clamp_input, max, min, non_negative, round_half_up};
use crate::models::{DeductionInputs, DeductionKind, FilingStatus};
use crate::tables::{ItemizedDeductionLimits, StandardDeductionTable};

/// Itemized deduction lines after limits are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedBreakdown {
    /// AGI × floor rate. Negative when AGI is negative.
    pub medical_floor: Decimal,
    pub medical_allowed: Decimal,
    /// State and local taxes after the cap.
    pub state_local_taxes: Decimal,
    pub mortgage_interest: Decimal,
    pub charitable_contributions: Decimal,
    pub other_itemized: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionResult {
    pub standard_amount: Decimal,
    pub itemized: ItemizedBreakdown,
    pub deduction_used: DeductionKind,
    pub final_amount: Decimal,
}

/// Computes both deduction paths and picks the larger.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::DeductionSelector;
/// use tax_core::tables::tax_year_2025;
/// use tax_core::{DeductionInputs, DeductionKind, FilingStatus};
///
/// let tables = tax_year_2025();
/// let selector = DeductionSelector::new(&tables.standard_deduction, &tables.itemized);
/// let inputs = DeductionInputs {
///     mortgage_interest: dec!(11000),
///     state_local_taxes: dec!(12500),
///     ..Default::default()
/// };
///
/// let result = selector.select(FilingStatus::Single, &inputs, dec!(95000), dec!(95000));
///
/// // 11000 + min(12500, 10000) beats the 15000 standard deduction.
/// assert_eq!(result.deduction_used, DeductionKind::Itemized);
/// assert_eq!(result.final_amount, dec!(21000));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DeductionSelector<'a> {
    standard: &'a StandardDeductionTable,
    limits: &'a ItemizedDeductionLimits,
}

impl<'a> DeductionSelector<'a> {
    pub fn new(
        standard: &'a StandardDeductionTable,
        limits: &'a ItemizedDeductionLimits,
    ) -> Self {
        Self { standard, limits }
    }

    pub fn select(
        &self,
        filing_status: FilingStatus,
        inputs: &DeductionInputs,
        adjusted_gross_income: Decimal,
        earned_income: Decimal,
    ) -> DeductionResult {
        let standard_amount =
            self.standard_deduction(filing_status, inputs.claimed_as_dependent, earned_income);
        let itemized = self.itemized_deduction(inputs, adjusted_gross_income);

        let (deduction_used, final_amount) = if itemized.total > standard_amount {
            (DeductionKind::Itemized, itemized.total)
        } else {
            (DeductionKind::Standard, standard_amount)
        };

        debug!(
            standard = %standard_amount,
            itemized = %itemized.total,
            used = %deduction_used,
            "deduction selected"
        );

        DeductionResult {
            standard_amount,
            itemized,
            deduction_used,
            final_amount,
        }
    }

    /// Standard deduction for the filing status.
    ///
    /// A filer claimed as a dependent gets the larger of the dependent
    /// minimum and earned income plus the add-on, never more than the
    /// ordinary amount.
    pub fn standard_deduction(
        &self,
        filing_status: FilingStatus,
        claimed_as_dependent: bool,
        earned_income: Decimal,
    ) -> Decimal {
        let base = *self.standard.amounts.get(filing_status);
        if !claimed_as_dependent {
            return base;
        }

        let earned_based = non_negative(earned_income) + self.standard.dependent_earned_income_add_on;
        round_half_up(min(base, max(self.standard.dependent_minimum, earned_based)))
    }

    pub fn itemized_deduction(
        &self,
        inputs: &DeductionInputs,
        adjusted_gross_income: Decimal,
    ) -> ItemizedBreakdown {
        let medical_expenses = clamp_input("medical_expenses", inputs.medical_expenses);
        let medical_floor = self.medical_floor(adjusted_gross_income);
        let medical_allowed = self.medical_allowed(medical_expenses, medical_floor);

        let state_local_taxes = min(
            clamp_input("state_local_taxes", inputs.state_local_taxes),
            self.limits.salt_cap,
        );
        let mortgage_interest = clamp_input("mortgage_interest", inputs.mortgage_interest);
        let charitable_contributions =
            clamp_input("charitable_contributions", inputs.charitable_contributions);
        let other_itemized = clamp_input("other_itemized", inputs.other_itemized);

        let total = round_half_up(
            medical_allowed
                + state_local_taxes
                + mortgage_interest
                + charitable_contributions
                + other_itemized,
        );

        ItemizedBreakdown {
            medical_floor,
            medical_allowed,
            state_local_taxes,
            mortgage_interest,
            charitable_contributions,
            other_itemized,
            total,
        }
    }

    /// The floor is not clamped: a negative AGI gives a negative floor.
    fn medical_floor(
        &self,
        adjusted_gross_income: Decimal,
    ) -> Decimal {
        if adjusted_gross_income < Decimal::ZERO {
            warn!(
                adjusted_gross_income = %adjusted_gross_income,
                "negative AGI produces a negative medical expense floor"
            );
        }
        round_half_up(adjusted_gross_income * self.limits.medical_floor_rate)
    }

    /// Expenses above the floor. A negative floor is subtracted as is, so
    /// the allowance can exceed the expenses.
    fn medical_allowed(
        &self,
        medical_expenses: Decimal,
        medical_floor: Decimal,
    ) -> Decimal {
        round_half_up(non_negative(medical_expenses - medical_floor))
    }
}
