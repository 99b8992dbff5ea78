use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FilingStatus;

/// Which deduction path produced `final_deduction_amount`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    #[default]
    Standard,
    Itemized,
}

impl fmt::Display for DeductionKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Itemized => f.write_str("itemized"),
        }
    }
}

/// A single credit split into the part limited by liability and the part
/// that may be paid out as a refund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAmount {
    pub nonrefundable: Decimal,
    pub refundable: Decimal,
}

impl CreditAmount {
    pub const ZERO: CreditAmount = CreditAmount {
        nonrefundable: Decimal::ZERO,
        refundable: Decimal::ZERO,
    };

    pub fn total(&self) -> Decimal {
        self.nonrefundable + self.refundable
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBreakdown {
    pub child_tax_credit: CreditAmount,
    pub earned_income_credit: CreditAmount,
    pub american_opportunity_credit: CreditAmount,
    pub lifetime_learning_credit: CreditAmount,
}

impl CreditBreakdown {
    fn parts(&self) -> [CreditAmount; 4] {
        [
            self.child_tax_credit,
            self.earned_income_credit,
            self.american_opportunity_credit,
            self.lifetime_learning_credit,
        ]
    }

    pub fn total_nonrefundable(&self) -> Decimal {
        self.parts().iter().map(|c| c.nonrefundable).sum()
    }

    pub fn total_refundable(&self) -> Decimal {
        self.parts().iter().map(|c| c.refundable).sum()
    }

    pub fn total(&self) -> Decimal {
        self.total_nonrefundable() + self.total_refundable()
    }
}

/// Output of one engine run. Every intermediate total is recorded so the
/// result can be displayed or audited line by line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub tax_year: i32,
    pub filing_status: FilingStatus,

    // Income
    pub total_wages: Decimal,
    pub total_interest: Decimal,
    pub total_dividends: Decimal,
    pub self_employment_profit: Decimal,
    pub gross_income: Decimal,

    // Adjustments
    pub total_adjustments: Decimal,
    pub self_employment_net_earnings: Decimal,
    pub self_employment_tax_deduction: Decimal,
    pub adjusted_gross_income: Decimal,

    // Deductions
    pub standard_deduction_amount: Decimal,
    pub itemized_deduction_amount: Decimal,
    pub deduction_used: DeductionKind,
    pub final_deduction_amount: Decimal,
    pub taxable_income: Decimal,

    // Tax
    pub income_tax: Decimal,
    pub self_employment_tax: Decimal,
    pub total_tax_before_credits: Decimal,

    // Credits
    pub earned_income: Decimal,
    pub investment_income: Decimal,
    pub credits: CreditBreakdown,
    pub total_credits: Decimal,

    // Reconciliation
    pub total_tax: Decimal,
    pub total_withholding: Decimal,
    /// Refundable credits left over after liability reached zero.
    pub refundable_credit_excess: Decimal,
    pub total_payments: Decimal,
    /// Positive for a refund, negative for an amount owed.
    pub refund_or_owed: Decimal,
    pub is_refund: bool,
}

impl CalculationResult {
    pub fn refund_amount(&self) -> Decimal {
        if self.is_refund {
            self.refund_or_owed
        } else {
            Decimal::ZERO
        }
    }

    pub fn amount_owed(&self) -> Decimal {
        if self.is_refund {
            Decimal::ZERO
        } else {
            -self.refund_or_owed
        }
    }
}
