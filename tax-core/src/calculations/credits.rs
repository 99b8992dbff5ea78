//! Credit engine.
//!
//! Every credit runs through the same three steps:
//!
//! 1. a base amount from the credit's own inputs,
//! 2. a stepped phase-out keyed on AGI ([`PhaseOut`]), floored at zero,
//! 3. a split into refundable and nonrefundable parts ([`RefundableRule`]).
//!
//! The credits differ only in how they build a [`CreditSpec`]. Applying the
//! split here, before reconciliation, keeps refundable amounts separate from
//! the nonrefundable sum so liability can be reduced in the right order.
//!
//! | Credit | Base | Reduction per $1,000 of AGI over threshold | Refundable |
//! |--------|------|-----------|------------|
//! | Child tax credit | $2,000 per child under 17 | $50 | up to $1,700 per child, 15% of earned income over $2,500 |
//! | Earned income credit | phase-in rate × earned income up to the threshold, up to max | phase-out rate × 1,000, by child count | all |
//! | American opportunity | 100% of first $2,000 + 25% of next $2,000 per student | $250 ($125 joint) | 40%, up to $1,000 per student |
//! | Lifetime learning | 20% of up to $10,000 | $200 ($100 joint) | none |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{clamp_input, min, non_negative, round_half_up};
use crate::models::{CreditAmount, CreditBreakdown, CreditInputs, Dependent, FilingStatus, StudentExpenses};
use crate::tables::{
    AmericanOpportunityParams, ChildTaxCreditParams, CreditTables, EarnedIncomeCreditParams,
    LifetimeLearningParams, PhaseOutSchedule,
};

/// How a credit shrinks as income rises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOut {
    None,
    /// A fixed reduction for each started step of income above `threshold`.
    Stepped {
        threshold: Decimal,
        step: Decimal,
        reduction_per_step: Decimal,
    },
}

impl PhaseOut {
    /// The filing status's row of a phase-out table.
    pub fn from_schedule(
        schedule: &PhaseOutSchedule,
        status: FilingStatus,
        step: Decimal,
    ) -> Self {
        Self::Stepped {
            threshold: *schedule.threshold.get(status),
            step,
            reduction_per_step: *schedule.reduction_per_step.get(status),
        }
    }

    /// Credit remaining after the phase-out, floored at zero.
    pub fn apply(
        &self,
        base: Decimal,
        income: Decimal,
    ) -> Decimal {
        let remaining = match *self {
            Self::None => base,
            Self::Stepped {
                threshold,
                step,
                reduction_per_step,
            } => {
                let steps = non_negative(((income - threshold) / step).ceil());
                base - steps * reduction_per_step
            }
        };
        round_half_up(non_negative(remaining))
    }
}

/// Which part of a phased credit may be paid out beyond liability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundableRule {
    None,
    Full,
    /// Refundable up to a fixed amount.
    Capped(Decimal),
    /// A share of the credit is refundable, up to a fixed amount.
    RateCapped { rate: Decimal, cap: Decimal },
}

impl RefundableRule {
    pub fn split(
        &self,
        credit: Decimal,
    ) -> CreditAmount {
        let refundable = match *self {
            Self::None => Decimal::ZERO,
            Self::Full => credit,
            Self::Capped(cap) => min(credit, non_negative(cap)),
            Self::RateCapped { rate, cap } => min(credit * rate, non_negative(cap)),
        };
        let refundable = round_half_up(refundable);
        CreditAmount {
            nonrefundable: credit - refundable,
            refundable,
        }
    }
}

/// One credit ready to run through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditSpec {
    pub name: &'static str,
    pub base: Decimal,
    /// Income the phase-out is keyed on.
    pub income: Decimal,
    pub phase_out: PhaseOut,
    pub refundable: RefundableRule,
}

impl CreditSpec {
    const NONE: CreditSpec = CreditSpec {
        name: "none",
        base: Decimal::ZERO,
        income: Decimal::ZERO,
        phase_out: PhaseOut::None,
        refundable: RefundableRule::None,
    };

    pub fn run(&self) -> CreditAmount {
        let base = round_half_up(non_negative(self.base));
        let phased = self.phase_out.apply(base, self.income);
        let amount = self.refundable.split(phased);
        debug!(
            credit = self.name,
            base = %base,
            phased = %phased,
            refundable = %amount.refundable,
            "credit computed"
        );
        amount
    }
}

/// Income figures the credits are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditContext {
    pub filing_status: FilingStatus,
    pub adjusted_gross_income: Decimal,
    pub earned_income: Decimal,
    pub investment_income: Decimal,
}

/// Computes every credit for a return.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::{CreditCalculator, CreditContext};
/// use tax_core::tables::tax_year_2025;
/// use tax_core::{CreditInputs, Dependent, FilingStatus};
///
/// let tables = tax_year_2025();
/// let calculator = CreditCalculator::new(&tables.credits);
/// let context = CreditContext {
///     filing_status: FilingStatus::MarriedFilingJointly,
///     adjusted_gross_income: dec!(30000),
///     earned_income: dec!(30000),
///     investment_income: dec!(0),
/// };
/// let inputs = CreditInputs {
///     dependents: vec![Dependent::new("Ada", 7), Dependent::new("Ben", 4)],
///     ..Default::default()
/// };
///
/// let credits = calculator.calculate(&context, &inputs);
///
/// // Below the joint phase-out start, the two-child maximum applies.
/// assert_eq!(credits.earned_income_credit.refundable, dec!(7152));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CreditCalculator<'a> {
    tables: &'a CreditTables,
}

impl<'a> CreditCalculator<'a> {
    pub fn new(tables: &'a CreditTables) -> Self {
        Self { tables }
    }

    fn phase_out(
        &self,
        schedule: &PhaseOutSchedule,
        status: FilingStatus,
    ) -> PhaseOut {
        PhaseOut::from_schedule(schedule, status, self.tables.phase_out_step)
    }

    pub fn calculate(
        &self,
        context: &CreditContext,
        inputs: &CreditInputs,
    ) -> CreditBreakdown {
        CreditBreakdown {
            child_tax_credit: self.child_tax_credit(context, &inputs.dependents).run(),
            earned_income_credit: self.earned_income_credit(context, &inputs.dependents).run(),
            american_opportunity_credit: self
                .american_opportunity_credit(context, &inputs.students)
                .run(),
            lifetime_learning_credit: self
                .lifetime_learning_credit(context, &inputs.students)
                .run(),
        }
    }

    fn child_tax_credit(
        &self,
        context: &CreditContext,
        dependents: &[Dependent],
    ) -> CreditSpec {
        let params: &ChildTaxCreditParams = &self.tables.child_tax_credit;
        let children = Decimal::from(count_under(dependents, params.qualifying_age_limit));

        let earned_income_limit = round_half_up(
            params.refundable_earned_income_rate
                * non_negative(context.earned_income - params.refundable_earned_income_floor),
        );
        let refundable_cap = min(children * params.refundable_per_child, earned_income_limit);

        CreditSpec {
            name: "child_tax_credit",
            base: children * params.amount_per_child,
            income: context.adjusted_gross_income,
            phase_out: self.phase_out(&params.phase_out, context.filing_status),
            refundable: RefundableRule::Capped(refundable_cap),
        }
    }

    /// Investment income over the limit disqualifies the credit before any
    /// phase-in or phase-out arithmetic.
    fn earned_income_credit(
        &self,
        context: &CreditContext,
        dependents: &[Dependent],
    ) -> CreditSpec {
        let params: &EarnedIncomeCreditParams = &self.tables.earned_income_credit;

        if context.investment_income > params.investment_income_limit {
            debug!(
                investment_income = %context.investment_income,
                limit = %params.investment_income_limit,
                "investment income over limit; earned income credit disallowed"
            );
            return CreditSpec::NONE;
        }
        if context.earned_income <= Decimal::ZERO {
            return CreditSpec::NONE;
        }

        let children = count_under(dependents, params.qualifying_age_limit);
        let schedule = params.schedule_for(children);
        let phase_in_income = min(context.earned_income, schedule.earned_income_threshold);
        let phased_in = min(
            schedule.max_credit,
            round_half_up(phase_in_income * schedule.phase_in_rate),
        );

        CreditSpec {
            name: "earned_income_credit",
            base: phased_in,
            income: context.adjusted_gross_income,
            phase_out: self.phase_out(&schedule.phase_out, context.filing_status),
            refundable: RefundableRule::Full,
        }
    }

    fn american_opportunity_credit(
        &self,
        context: &CreditContext,
        students: &[StudentExpenses],
    ) -> CreditSpec {
        let params: &AmericanOpportunityParams = &self.tables.american_opportunity;
        let eligible: Vec<_> = students
            .iter()
            .filter(|s| is_aotc_eligible(params, s))
            .collect();

        let base = eligible
            .iter()
            .map(|s| aotc_per_student(params, clamp_input("qualified_expenses", s.qualified_expenses)))
            .sum::<Decimal>();
        let refundable_cap = Decimal::from(eligible.len()) * params.max_refundable_per_student;

        CreditSpec {
            name: "american_opportunity_credit",
            base,
            income: context.adjusted_gross_income,
            phase_out: self.phase_out(&params.phase_out, context.filing_status),
            refundable: RefundableRule::RateCapped {
                rate: params.refundable_rate,
                cap: refundable_cap,
            },
        }
    }

    /// Students who do not qualify for the American opportunity credit pool
    /// their expenses here.
    fn lifetime_learning_credit(
        &self,
        context: &CreditContext,
        students: &[StudentExpenses],
    ) -> CreditSpec {
        let params: &LifetimeLearningParams = &self.tables.lifetime_learning;
        let aotc = &self.tables.american_opportunity;

        let pooled = students
            .iter()
            .filter(|s| !is_aotc_eligible(aotc, s))
            .map(|s| clamp_input("qualified_expenses", s.qualified_expenses))
            .sum::<Decimal>();

        CreditSpec {
            name: "lifetime_learning_credit",
            base: params.rate * min(pooled, params.max_expenses),
            income: context.adjusted_gross_income,
            phase_out: self.phase_out(&params.phase_out, context.filing_status),
            refundable: RefundableRule::None,
        }
    }
}

fn count_under(
    dependents: &[Dependent],
    age_limit: u8,
) -> usize {
    dependents.iter().filter(|d| d.age < age_limit).count()
}

fn is_aotc_eligible(
    params: &AmericanOpportunityParams,
    student: &StudentExpenses,
) -> bool {
    student.aotc_years_claimed < params.max_years_claimed
        && student.qualified_expenses > Decimal::ZERO
}

fn aotc_per_student(
    params: &AmericanOpportunityParams,
    expenses: Decimal,
) -> Decimal {
    let first_tier = min(expenses, params.first_tier_expenses);
    let second_tier = min(
        non_negative(expenses - params.first_tier_expenses),
        params.second_tier_expenses,
    );
    min(
        params.max_credit_per_student,
        first_tier + second_tier * params.second_tier_rate,
    )
}
