use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    AdjustmentLimits, AmericanOpportunityParams, ByFilingStatus, ChildTaxCreditParams,
    CreditTables, EarnedIncomeCreditParams, EitcSchedule, ItemizedDeductionLimits,
    LifetimeLearningParams, PhaseOutSchedule, ReferenceTables, SelfEmploymentParams,
    StandardDeductionTable,
};
use crate::models::TaxBracket;

const RATES: [Decimal; 7] = [
    dec!(0.10),
    dec!(0.12),
    dec!(0.22),
    dec!(0.24),
    dec!(0.32),
    dec!(0.35),
    dec!(0.37),
];

/// Builds a contiguous schedule from the lower bound of each bracket.
fn schedule(floors: [Decimal; 7]) -> Vec<TaxBracket> {
    floors
        .iter()
        .enumerate()
        .map(|(i, &min)| TaxBracket::new(min, floors.get(i + 1).copied(), RATES[i]))
        .collect()
}

fn per_status(
    single: Decimal,
    married_filing_jointly: Decimal,
    head_of_household: Decimal,
) -> ByFilingStatus<Decimal> {
    ByFilingStatus {
        single,
        married_filing_jointly,
        head_of_household,
    }
}

/// Phase-out where single and head-of-household filers share a threshold
/// and reduction.
fn phase_out(
    threshold: Decimal,
    joint_threshold: Decimal,
    reduction: Decimal,
    joint_reduction: Decimal,
) -> PhaseOutSchedule {
    PhaseOutSchedule {
        threshold: per_status(threshold, joint_threshold, threshold),
        reduction_per_step: per_status(reduction, joint_reduction, reduction),
    }
}

/// The phase-out reduction per $1,000 is the published rate × 1,000.
fn eitc(
    qualifying_children: u8,
    max_credit: Decimal,
    earned_income_threshold: Decimal,
    phase_in_rate: Decimal,
    reduction_per_step: Decimal,
    start: Decimal,
    joint_start: Decimal,
) -> EitcSchedule {
    EitcSchedule {
        qualifying_children,
        max_credit,
        earned_income_threshold,
        phase_in_rate,
        phase_out: phase_out(start, joint_start, reduction_per_step, reduction_per_step),
    }
}

/// Published figures for tax year 2025.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::FilingStatus;
/// use tax_core::tables::tax_year_2025;
///
/// let tables = tax_year_2025();
///
/// assert_eq!(tables.tax_year, 2025);
/// assert_eq!(*tables.standard_deduction.amounts.get(FilingStatus::Single), dec!(15000));
/// assert!(tables.validate().is_ok());
/// ```
pub fn tax_year_2025() -> ReferenceTables {
    ReferenceTables {
        tax_year: 2025,
        brackets: ByFilingStatus {
            single: schedule([
                dec!(0),
                dec!(11925),
                dec!(48475),
                dec!(103350),
                dec!(197300),
                dec!(250525),
                dec!(626350),
            ]),
            married_filing_jointly: schedule([
                dec!(0),
                dec!(23850),
                dec!(96950),
                dec!(206700),
                dec!(394600),
                dec!(501050),
                dec!(751600),
            ]),
            head_of_household: schedule([
                dec!(0),
                dec!(17000),
                dec!(64850),
                dec!(103350),
                dec!(197300),
                dec!(250500),
                dec!(626350),
            ]),
        },
        standard_deduction: StandardDeductionTable {
            amounts: per_status(dec!(15000), dec!(30000), dec!(22500)),
            dependent_minimum: dec!(1350),
            dependent_earned_income_add_on: dec!(450),
        },
        adjustments: AdjustmentLimits {
            student_loan_interest: dec!(2500),
            educator_expenses: dec!(300),
            ira_contributions: dec!(7000),
            hsa_contributions: dec!(4300),
        },
        itemized: ItemizedDeductionLimits {
            salt_cap: dec!(10000),
            medical_floor_rate: dec!(0.075),
        },
        self_employment: SelfEmploymentParams {
            net_earnings_factor: dec!(0.9235),
            tax_rate: dec!(0.153),
            deduction_factor: dec!(0.50),
        },
        credits: CreditTables {
            phase_out_step: dec!(1000),
            child_tax_credit: ChildTaxCreditParams {
                amount_per_child: dec!(2000),
                qualifying_age_limit: 17,
                phase_out: phase_out(dec!(200000), dec!(400000), dec!(50), dec!(50)),
                refundable_per_child: dec!(1700),
                refundable_earned_income_floor: dec!(2500),
                refundable_earned_income_rate: dec!(0.15),
            },
            earned_income_credit: EarnedIncomeCreditParams {
                investment_income_limit: dec!(11950),
                qualifying_age_limit: 19,
                schedules: vec![
                    eitc(0, dec!(649), dec!(8490), dec!(0.0765), dec!(76.50), dec!(10620), dec!(17730)),
                    eitc(1, dec!(4328), dec!(12730), dec!(0.34), dec!(159.80), dec!(23350), dec!(30470)),
                    eitc(2, dec!(7152), dec!(17880), dec!(0.40), dec!(210.60), dec!(23350), dec!(30470)),
                    eitc(3, dec!(8046), dec!(17880), dec!(0.45), dec!(210.60), dec!(23350), dec!(30470)),
                ],
            },
            american_opportunity: AmericanOpportunityParams {
                first_tier_expenses: dec!(2000),
                second_tier_expenses: dec!(2000),
                second_tier_rate: dec!(0.25),
                max_credit_per_student: dec!(2500),
                refundable_rate: dec!(0.40),
                max_refundable_per_student: dec!(1000),
                max_years_claimed: 4,
                phase_out: phase_out(dec!(80000), dec!(160000), dec!(250), dec!(125)),
            },
            lifetime_learning: LifetimeLearningParams {
                rate: dec!(0.20),
                max_expenses: dec!(10000),
                phase_out: phase_out(dec!(80000), dec!(160000), dec!(200), dec!(100)),
            },
        },
    }
}
