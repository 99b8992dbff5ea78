//! Reference tables consumed by the calculation engine.
//!
//! Everything that changes from one tax year to the next lives here as plain
//! data: bracket schedules, deduction amounts, adjustment caps, self-employment
//! rates, and credit parameters. The engine reads these tables but never
//! derives them, so a different year is supported by supplying a different
//! [`ReferenceTables`] value.
//!
//! Per-status data is held in [`ByFilingStatus`], which has one field per
//! [`FilingStatus`] variant. Lookups are therefore total by construction;
//! structural problems (gaps between brackets, a non-positive phase-out step,
//! rates outside `[0, 1]`) are caught by [`ReferenceTables::validate`].

mod year_2025;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FilingStatus, TaxBracket};

pub use year_2025::tax_year_2025;

/// Structural defects in a reference table set.
///
/// These indicate a configuration problem, never a user-input problem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceTableError {
    #[error("{table} table has no entry for filing status {status}")]
    MissingEntry {
        table: &'static str,
        status: FilingStatus,
    },

    #[error("bracket schedule for {0} is empty")]
    EmptyBrackets(FilingStatus),

    #[error("bracket schedule for {status} starts at {min}, expected 0")]
    BracketsNotAnchoredAtZero { status: FilingStatus, min: Decimal },

    #[error("bracket {index} for {status} has an empty or inverted range")]
    InvalidBracketRange { status: FilingStatus, index: usize },

    #[error("bracket {index} for {status} ends at {max} but the next starts at {next_min}")]
    BracketGap {
        status: FilingStatus,
        index: usize,
        max: Decimal,
        next_min: Decimal,
    },

    #[error("bracket {index} for {status} is unbounded but is not the last bracket")]
    UnboundedInnerBracket { status: FilingStatus, index: usize },

    #[error("top bracket for {0} must be unbounded")]
    BoundedTopBracket(FilingStatus),

    #[error("{field} must be between 0 and 1, got {value}")]
    InvalidRate { field: &'static str, value: Decimal },

    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("earned income credit needs schedules for 0, 1, 2 and 3+ children, got {0}")]
    EitcScheduleCount(usize),

    #[error("earned income credit schedule {index} is for {found} children")]
    EitcScheduleOrder { index: usize, found: u8 },

    #[error("credit phase-out step must be positive, got {0}")]
    InvalidPhaseOutStep(Decimal),

    #[error("standard deduction for dependents exceeds the regular amount for {0}")]
    DependentMinimumExceedsStandard(FilingStatus),
}

/// A value for every filing status.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::FilingStatus;
/// use tax_core::tables::ByFilingStatus;
///
/// let amounts = ByFilingStatus {
///     single: dec!(15000),
///     married_filing_jointly: dec!(30000),
///     head_of_household: dec!(22500),
/// };
///
/// assert_eq!(*amounts.get(FilingStatus::HeadOfHousehold), dec!(22500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByFilingStatus<T> {
    pub single: T,
    pub married_filing_jointly: T,
    pub head_of_household: T,
}

impl<T> ByFilingStatus<T> {
    pub fn get(
        &self,
        status: FilingStatus,
    ) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_filing_jointly,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilingStatus, &T)> {
        FilingStatus::ALL
            .into_iter()
            .map(move |status| (status, self.get(status)))
    }

    /// Builds a total mapping from keyed data, failing on the first status
    /// that has no entry.
    pub fn try_from_map(
        mut map: HashMap<FilingStatus, T>,
        table: &'static str,
    ) -> Result<Self, ReferenceTableError> {
        let mut take = |status| {
            map.remove(&status)
                .ok_or(ReferenceTableError::MissingEntry { table, status })
        };
        Ok(Self {
            single: take(FilingStatus::Single)?,
            married_filing_jointly: take(FilingStatus::MarriedFilingJointly)?,
            head_of_household: take(FilingStatus::HeadOfHousehold)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardDeductionTable {
    pub amounts: ByFilingStatus<Decimal>,
    /// Floor of the standard deduction for a filer claimed as a dependent.
    pub dependent_minimum: Decimal,
    /// Amount added to earned income for a filer claimed as a dependent.
    pub dependent_earned_income_add_on: Decimal,
}

/// Per-field caps on above-the-line adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLimits {
    pub student_loan_interest: Decimal,
    pub educator_expenses: Decimal,
    pub ira_contributions: Decimal,
    pub hsa_contributions: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedDeductionLimits {
    /// Cap on the state and local tax deduction.
    pub salt_cap: Decimal,
    /// Share of AGI that medical expenses must exceed.
    pub medical_floor_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmploymentParams {
    /// Share of profit treated as net earnings (92.35%).
    pub net_earnings_factor: Decimal,
    /// Combined Social Security and Medicare rate (15.3%).
    pub tax_rate: Decimal,
    /// Share of SE tax deductible as an adjustment (50%).
    pub deduction_factor: Decimal,
}

/// Where a credit starts to phase out and how much each started step of
/// income above that point takes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutSchedule {
    pub threshold: ByFilingStatus<Decimal>,
    pub reduction_per_step: ByFilingStatus<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTaxCreditParams {
    pub amount_per_child: Decimal,
    /// Children must be younger than this at year end.
    pub qualifying_age_limit: u8,
    pub phase_out: PhaseOutSchedule,
    pub refundable_per_child: Decimal,
    pub refundable_earned_income_floor: Decimal,
    pub refundable_earned_income_rate: Decimal,
}

/// Earned income credit parameters for one qualifying-child count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EitcSchedule {
    pub qualifying_children: u8,
    pub max_credit: Decimal,
    /// Earned income at which the phase-in reaches `max_credit`.
    pub earned_income_threshold: Decimal,
    pub phase_in_rate: Decimal,
    pub phase_out: PhaseOutSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedIncomeCreditParams {
    /// Investment income above this amount disqualifies the credit outright.
    pub investment_income_limit: Decimal,
    /// Children must be younger than this at year end.
    pub qualifying_age_limit: u8,
    /// Indexed by qualifying children; the last schedule covers 3 or more.
    pub schedules: Vec<EitcSchedule>,
}

impl EarnedIncomeCreditParams {
    pub fn schedule_for(
        &self,
        qualifying_children: usize,
    ) -> &EitcSchedule {
        let last = self.schedules.len().saturating_sub(1);
        &self.schedules[qualifying_children.min(last)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmericanOpportunityParams {
    /// Expenses credited at 100%.
    pub first_tier_expenses: Decimal,
    /// Expenses credited at `second_tier_rate`.
    pub second_tier_expenses: Decimal,
    pub second_tier_rate: Decimal,
    pub max_credit_per_student: Decimal,
    pub refundable_rate: Decimal,
    pub max_refundable_per_student: Decimal,
    /// A student stops qualifying once the credit was claimed this many years.
    pub max_years_claimed: u8,
    pub phase_out: PhaseOutSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeLearningParams {
    pub rate: Decimal,
    /// Expenses considered per return.
    pub max_expenses: Decimal,
    pub phase_out: PhaseOutSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTables {
    /// Income band every phase-out reduction is counted in ($1,000).
    pub phase_out_step: Decimal,
    pub child_tax_credit: ChildTaxCreditParams,
    pub earned_income_credit: EarnedIncomeCreditParams,
    pub american_opportunity: AmericanOpportunityParams,
    pub lifetime_learning: LifetimeLearningParams,
}

/// The complete table set for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub tax_year: i32,
    pub brackets: ByFilingStatus<Vec<TaxBracket>>,
    pub standard_deduction: StandardDeductionTable,
    pub adjustments: AdjustmentLimits,
    pub itemized: ItemizedDeductionLimits,
    pub self_employment: SelfEmploymentParams,
    pub credits: CreditTables,
}

impl ReferenceTables {
    /// Checks every structural invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReferenceTableError`] found.
    pub fn validate(&self) -> Result<(), ReferenceTableError> {
        for (status, brackets) in self.brackets.iter() {
            validate_brackets(status, brackets)?;
        }

        let std = &self.standard_deduction;
        for (status, amount) in std.amounts.iter() {
            non_negative("standard_deduction.amounts", *amount)?;
            if std.dependent_minimum > *amount {
                return Err(ReferenceTableError::DependentMinimumExceedsStandard(status));
            }
        }
        non_negative("standard_deduction.dependent_minimum", std.dependent_minimum)?;
        non_negative(
            "standard_deduction.dependent_earned_income_add_on",
            std.dependent_earned_income_add_on,
        )?;

        let adj = &self.adjustments;
        non_negative("adjustments.student_loan_interest", adj.student_loan_interest)?;
        non_negative("adjustments.educator_expenses", adj.educator_expenses)?;
        non_negative("adjustments.ira_contributions", adj.ira_contributions)?;
        non_negative("adjustments.hsa_contributions", adj.hsa_contributions)?;

        non_negative("itemized.salt_cap", self.itemized.salt_cap)?;
        rate("itemized.medical_floor_rate", self.itemized.medical_floor_rate)?;

        let se = &self.self_employment;
        if se.net_earnings_factor <= Decimal::ZERO {
            return Err(ReferenceTableError::InvalidRate {
                field: "self_employment.net_earnings_factor",
                value: se.net_earnings_factor,
            });
        }
        rate("self_employment.net_earnings_factor", se.net_earnings_factor)?;
        rate("self_employment.tax_rate", se.tax_rate)?;
        rate("self_employment.deduction_factor", se.deduction_factor)?;

        self.validate_credits()
    }

    fn validate_credits(&self) -> Result<(), ReferenceTableError> {
        if self.credits.phase_out_step <= Decimal::ZERO {
            return Err(ReferenceTableError::InvalidPhaseOutStep(
                self.credits.phase_out_step,
            ));
        }

        let ctc = &self.credits.child_tax_credit;
        non_negative("child_tax_credit.amount_per_child", ctc.amount_per_child)?;
        validate_phase_out("child_tax_credit", &ctc.phase_out)?;
        non_negative("child_tax_credit.refundable_per_child", ctc.refundable_per_child)?;
        rate(
            "child_tax_credit.refundable_earned_income_rate",
            ctc.refundable_earned_income_rate,
        )?;

        let eitc = &self.credits.earned_income_credit;
        if eitc.schedules.len() != 4 {
            return Err(ReferenceTableError::EitcScheduleCount(eitc.schedules.len()));
        }
        for (index, schedule) in eitc.schedules.iter().enumerate() {
            if usize::from(schedule.qualifying_children) != index {
                return Err(ReferenceTableError::EitcScheduleOrder {
                    index,
                    found: schedule.qualifying_children,
                });
            }
            non_negative("earned_income_credit.max_credit", schedule.max_credit)?;
            non_negative(
                "earned_income_credit.earned_income_threshold",
                schedule.earned_income_threshold,
            )?;
            rate("earned_income_credit.phase_in_rate", schedule.phase_in_rate)?;
            validate_phase_out("earned_income_credit", &schedule.phase_out)?;
        }

        let aotc = &self.credits.american_opportunity;
        rate("american_opportunity.second_tier_rate", aotc.second_tier_rate)?;
        rate("american_opportunity.refundable_rate", aotc.refundable_rate)?;
        validate_phase_out("american_opportunity", &aotc.phase_out)?;

        let llc = &self.credits.lifetime_learning;
        rate("lifetime_learning.rate", llc.rate)?;
        validate_phase_out("lifetime_learning", &llc.phase_out)
    }
}

fn validate_brackets(
    status: FilingStatus,
    brackets: &[TaxBracket],
) -> Result<(), ReferenceTableError> {
    let first = brackets
        .first()
        .ok_or(ReferenceTableError::EmptyBrackets(status))?;
    if first.min_income != Decimal::ZERO {
        return Err(ReferenceTableError::BracketsNotAnchoredAtZero {
            status,
            min: first.min_income,
        });
    }

    for (index, bracket) in brackets.iter().enumerate() {
        rate("brackets.tax_rate", bracket.tax_rate)?;

        match (bracket.max_income, brackets.get(index + 1)) {
            (Some(max), Some(next)) => {
                if max <= bracket.min_income {
                    return Err(ReferenceTableError::InvalidBracketRange { status, index });
                }
                if max != next.min_income {
                    return Err(ReferenceTableError::BracketGap {
                        status,
                        index,
                        max,
                        next_min: next.min_income,
                    });
                }
            }
            (None, Some(_)) => {
                return Err(ReferenceTableError::UnboundedInnerBracket { status, index });
            }
            (Some(_), None) => return Err(ReferenceTableError::BoundedTopBracket(status)),
            (None, None) => {}
        }
    }
    Ok(())
}

fn validate_phase_out(
    credit: &'static str,
    schedule: &PhaseOutSchedule,
) -> Result<(), ReferenceTableError> {
    for (_, threshold) in schedule.threshold.iter() {
        non_negative(credit, *threshold)?;
    }
    for (_, reduction) in schedule.reduction_per_step.iter() {
        non_negative(credit, *reduction)?;
    }
    Ok(())
}

fn rate(
    field: &'static str,
    value: Decimal,
) -> Result<(), ReferenceTableError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ReferenceTableError::InvalidRate { field, value });
    }
    Ok(())
}

fn non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), ReferenceTableError> {
    if value < Decimal::ZERO {
        return Err(ReferenceTableError::NegativeAmount { field, value });
    }
    Ok(())
}
