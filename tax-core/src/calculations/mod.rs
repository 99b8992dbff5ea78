//! Tax calculation stages.
//!
//! Each stage is a small calculator over one section of the reference
//! tables. [`TaxEngine`] chains them in order; the individual calculators are
//! public so a caller can reproduce a single line of the computation.

pub mod adjustments;
pub mod brackets;
pub mod common;
pub mod credits;
pub mod deductions;
pub mod engine;
pub mod income;
pub mod reconciliation;
pub mod self_employment;

pub use adjustments::{AdjustmentsCalculator, AdjustmentsResult};
pub use brackets::{BracketTaxCalculator, tax_for_brackets};
pub use credits::{CreditCalculator, CreditContext, CreditSpec, PhaseOut, RefundableRule};
pub use deductions::{DeductionResult, DeductionSelector, ItemizedBreakdown};
pub use engine::{CalculationError, TaxEngine, calculate};
pub use income::IncomeTotals;
pub use reconciliation::{Reconciliation, ReconciliationInput};
pub use self_employment::{SelfEmploymentTaxCalculator, SelfEmploymentTaxResult};
