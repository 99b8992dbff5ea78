//! Engine entry points.
//!
//! [`TaxEngine`] validates a table set once and then computes any number of
//! returns against it. The stages run strictly forward:
//!
//! ```text
//! income → SE tax → adjustments (AGI) → deductions → bracket tax → credits → reconciliation
//! ```
//!
//! The engine holds nothing but a shared reference to the tables, so the
//! same input always yields the same result.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::calculations::adjustments::AdjustmentsCalculator;
use crate::calculations::brackets::BracketTaxCalculator;
use crate::calculations::common::{clamp_input, non_negative, round_half_up};
use crate::calculations::credits::{CreditCalculator, CreditContext};
use crate::calculations::deductions::DeductionSelector;
use crate::calculations::income;
use crate::calculations::reconciliation::{ReconciliationInput, reconcile};
use crate::calculations::self_employment::SelfEmploymentTaxCalculator;
use crate::models::{CalculationResult, TaxReturn};
use crate::tables::{ReferenceTableError, ReferenceTables};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("invalid reference tables: {0}")]
    Tables(#[from] ReferenceTableError),

    #[error("return is for tax year {return_year} but the tables are for {table_year}")]
    TaxYearMismatch { return_year: i32, table_year: i32 },
}

/// A validated table set ready to compute returns.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::TaxEngine;
/// use tax_core::tables::tax_year_2025;
/// use tax_core::{FilingStatus, TaxReturn, WageRecord};
///
/// let tables = tax_year_2025();
/// let engine = TaxEngine::new(&tables).unwrap();
///
/// let mut tax_return = TaxReturn::new(2025, FilingStatus::Single);
/// tax_return
///     .income
///     .wages
///     .push(WageRecord::new("Acme", dec!(65000), dec!(6200)));
///
/// let result = engine.calculate(&tax_return).unwrap();
///
/// // 65000 - 15000 standard deduction
/// assert_eq!(result.taxable_income, dec!(50000));
/// assert_eq!(result.income_tax, dec!(5914.00));
/// assert_eq!(result.refund_or_owed, dec!(286.00));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaxEngine<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> TaxEngine<'a> {
    /// # Errors
    ///
    /// Returns [`CalculationError::Tables`] if the table set is structurally
    /// invalid.
    pub fn new(tables: &'a ReferenceTables) -> Result<Self, CalculationError> {
        tables.validate()?;
        Ok(Self { tables })
    }

    pub fn tables(&self) -> &'a ReferenceTables {
        self.tables
    }

    /// Computes a complete result for one return.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::TaxYearMismatch`] if the return was
    /// prepared for a different year than the tables.
    #[instrument(skip_all, fields(tax_year = tax_return.tax_year, filing_status = tax_return.filing_status.as_str()))]
    pub fn calculate(
        &self,
        tax_return: &TaxReturn,
    ) -> Result<CalculationResult, CalculationError> {
        if tax_return.tax_year != self.tables.tax_year {
            return Err(CalculationError::TaxYearMismatch {
                return_year: tax_return.tax_year,
                table_year: self.tables.tax_year,
            });
        }

        let tables = self.tables;
        let filing_status = tax_return.filing_status;

        let income = income::aggregate(&tax_return.income);

        let self_employment = SelfEmploymentTaxCalculator::new(&tables.self_employment)
            .calculate(income.self_employment_profit);

        let adjustments = AdjustmentsCalculator::new(&tables.adjustments).calculate(
            income.gross_income,
            &tax_return.adjustments,
            self_employment.deduction,
        );
        let adjusted_gross_income = adjustments.adjusted_gross_income;

        let earned_income = self.earned_income(
            income.total_wages,
            income.self_employment_profit,
            self_employment.deduction,
        );
        let investment_income = round_half_up(
            income.total_interest
                + income.total_dividends
                + clamp_input(
                    "other_investment_income",
                    tax_return.credits.other_investment_income,
                ),
        );

        let deductions = DeductionSelector::new(&tables.standard_deduction, &tables.itemized)
            .select(
                filing_status,
                &tax_return.deductions,
                adjusted_gross_income,
                earned_income,
            );

        let taxable_income =
            round_half_up(non_negative(adjusted_gross_income - deductions.final_amount));
        let income_tax = BracketTaxCalculator::new(&tables.brackets).tax_for(filing_status, taxable_income);

        let context = CreditContext {
            filing_status,
            adjusted_gross_income,
            earned_income,
            investment_income,
        };
        let credits = CreditCalculator::new(&tables.credits).calculate(&context, &tax_return.credits);

        let reconciliation = reconcile(&ReconciliationInput {
            income_tax,
            self_employment_tax: self_employment.self_employment_tax,
            nonrefundable_credits: credits.total_nonrefundable(),
            refundable_credits: credits.total_refundable(),
            total_withholding: income.total_withholding,
        });

        debug!(
            adjusted_gross_income = %adjusted_gross_income,
            taxable_income = %taxable_income,
            total_tax = %reconciliation.total_tax,
            refund_or_owed = %reconciliation.refund_or_owed,
            "return calculated"
        );

        Ok(CalculationResult {
            tax_year: tax_return.tax_year,
            filing_status,
            total_wages: income.total_wages,
            total_interest: income.total_interest,
            total_dividends: income.total_dividends,
            self_employment_profit: income.self_employment_profit,
            gross_income: income.gross_income,
            total_adjustments: adjustments.total_adjustments,
            self_employment_net_earnings: self_employment.net_earnings,
            self_employment_tax_deduction: self_employment.deduction,
            adjusted_gross_income,
            standard_deduction_amount: deductions.standard_amount,
            itemized_deduction_amount: deductions.itemized.total,
            deduction_used: deductions.deduction_used,
            final_deduction_amount: deductions.final_amount,
            taxable_income,
            income_tax,
            self_employment_tax: self_employment.self_employment_tax,
            total_tax_before_credits: reconciliation.total_tax_before_credits,
            earned_income,
            investment_income,
            credits,
            total_credits: reconciliation.total_credits,
            total_tax: reconciliation.total_tax,
            total_withholding: income.total_withholding,
            refundable_credit_excess: reconciliation.refundable_credit_excess,
            total_payments: reconciliation.total_payments,
            refund_or_owed: reconciliation.refund_or_owed,
            is_refund: reconciliation.is_refund,
        })
    }

    /// Wages plus self-employment profit, less the SE tax deduction.
    fn earned_income(
        &self,
        total_wages: Decimal,
        self_employment_profit: Decimal,
        self_employment_tax_deduction: Decimal,
    ) -> Decimal {
        round_half_up(non_negative(
            total_wages + self_employment_profit - self_employment_tax_deduction,
        ))
    }
}

/// Validates `tables` and computes `tax_return` against them.
///
/// Prefer [`TaxEngine`] when computing more than one return per table set.
///
/// # Errors
///
/// See [`TaxEngine::new`] and [`TaxEngine::calculate`].
pub fn calculate(
    tables: &ReferenceTables,
    tax_return: &TaxReturn,
) -> Result<CalculationResult, CalculationError> {
    TaxEngine::new(tables)?.calculate(tax_return)
}
