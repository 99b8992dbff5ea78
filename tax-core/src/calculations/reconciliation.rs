//! Final reconciliation of liability, credits, and payments.
//!
//! Nonrefundable credits are applied first and can only bring liability to
//! zero. Refundable credits are applied next; whatever they exceed the
//! remaining liability by is paid out alongside withholding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationInput {
    pub income_tax: Decimal,
    pub self_employment_tax: Decimal,
    pub nonrefundable_credits: Decimal,
    pub refundable_credits: Decimal,
    pub total_withholding: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub total_tax_before_credits: Decimal,
    pub tax_after_nonrefundable_credits: Decimal,
    pub total_credits: Decimal,
    pub total_tax: Decimal,
    pub refundable_credit_excess: Decimal,
    pub total_payments: Decimal,
    /// Positive for a refund, negative for an amount owed.
    pub refund_or_owed: Decimal,
    pub is_refund: bool,
}

/// Reconciles liability against credits and withholding.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::reconciliation::{ReconciliationInput, reconcile};
///
/// let result = reconcile(&ReconciliationInput {
///     income_tax: dec!(1200),
///     self_employment_tax: dec!(0),
///     nonrefundable_credits: dec!(2000),
///     refundable_credits: dec!(1500),
///     total_withholding: dec!(300),
/// });
///
/// // The unused 800 of nonrefundable credit is lost; the refundable
/// // 1500 is paid out in full.
/// assert_eq!(result.total_tax, dec!(0));
/// assert_eq!(result.refund_or_owed, dec!(1800));
/// ```
pub fn reconcile(input: &ReconciliationInput) -> Reconciliation {
    let total_tax_before_credits = round_half_up(input.income_tax + input.self_employment_tax);
    let total_credits = round_half_up(input.nonrefundable_credits + input.refundable_credits);

    let tax_after_nonrefundable_credits =
        non_negative(total_tax_before_credits - input.nonrefundable_credits);
    let total_tax = non_negative(tax_after_nonrefundable_credits - input.refundable_credits);
    let refundable_credit_excess =
        non_negative(input.refundable_credits - tax_after_nonrefundable_credits);

    let total_payments = round_half_up(input.total_withholding + refundable_credit_excess);
    let refund_or_owed = round_half_up(total_payments - total_tax);
    let is_refund = refund_or_owed >= Decimal::ZERO;

    debug!(
        total_tax = %total_tax,
        total_payments = %total_payments,
        refund_or_owed = %refund_or_owed,
        "return reconciled"
    );

    Reconciliation {
        total_tax_before_credits,
        tax_after_nonrefundable_credits,
        total_credits,
        total_tax,
        refundable_credit_excess,
        total_payments,
        refund_or_owed,
        is_refund,
    }
}
