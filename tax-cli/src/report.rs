//! Plain-text rendering of engine output and stored returns.

use rust_decimal::Decimal;
use tax_core::db::{StoredResult, StoredReturn};
use tax_core::{CalculationResult, CreditAmount};

const LABEL_WIDTH: usize = 34;
const AMOUNT_WIDTH: usize = 16;

/// Formats a dollar amount with thousands separators, e.g. `-$1,234.50`.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

fn heading(
    out: &mut String,
    title: &str,
) {
    out.push_str(&format!("\n{title}\n"));
}

fn line(
    out: &mut String,
    label: &str,
    amount: Decimal,
) {
    out.push_str(&format!(
        "  {label:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}\n",
        format_money(amount)
    ));
}

fn text_line(
    out: &mut String,
    label: &str,
    value: &str,
) {
    out.push_str(&format!("  {label:<LABEL_WIDTH$}{value:>AMOUNT_WIDTH$}\n"));
}

fn credit_line(
    out: &mut String,
    label: &str,
    credit: CreditAmount,
) {
    if credit.total().is_zero() {
        return;
    }
    line(out, label, credit.total());
    if !credit.refundable.is_zero() && !credit.nonrefundable.is_zero() {
        line(out, "  refundable portion", credit.refundable);
    }
}

/// Renders a full line-by-line report of one calculation.
pub fn render_result(result: &CalculationResult) -> String {
    let mut out = format!("Tax year {}, {}\n", result.tax_year, result.filing_status);

    heading(&mut out, "Income");
    line(&mut out, "Wages", result.total_wages);
    line(&mut out, "Interest", result.total_interest);
    line(&mut out, "Ordinary dividends", result.total_dividends);
    line(&mut out, "Self-employment profit", result.self_employment_profit);
    line(&mut out, "Gross income", result.gross_income);

    heading(&mut out, "Adjustments");
    line(
        &mut out,
        "Deductible part of SE tax",
        result.self_employment_tax_deduction,
    );
    line(&mut out, "Total adjustments", result.total_adjustments);
    line(&mut out, "Adjusted gross income", result.adjusted_gross_income);

    heading(&mut out, "Deductions");
    line(&mut out, "Standard deduction", result.standard_deduction_amount);
    line(&mut out, "Itemized deductions", result.itemized_deduction_amount);
    text_line(&mut out, "Deduction used", &result.deduction_used.to_string());
    line(&mut out, "Taxable income", result.taxable_income);

    heading(&mut out, "Tax");
    line(&mut out, "Income tax", result.income_tax);
    line(&mut out, "Self-employment tax", result.self_employment_tax);
    line(&mut out, "Total before credits", result.total_tax_before_credits);

    heading(&mut out, "Credits");
    let credits = &result.credits;
    credit_line(&mut out, "Child tax credit", credits.child_tax_credit);
    credit_line(&mut out, "Earned income credit", credits.earned_income_credit);
    credit_line(
        &mut out,
        "American opportunity credit",
        credits.american_opportunity_credit,
    );
    credit_line(&mut out, "Lifetime learning credit", credits.lifetime_learning_credit);
    line(&mut out, "Total credits", result.total_credits);

    heading(&mut out, "Payments");
    line(&mut out, "Total tax", result.total_tax);
    line(&mut out, "Federal withholding", result.total_withholding);
    line(&mut out, "Refundable credit excess", result.refundable_credit_excess);
    line(&mut out, "Total payments", result.total_payments);

    out.push('\n');
    if result.is_refund {
        line(&mut out, "Refund", result.refund_amount());
    } else {
        line(&mut out, "Amount owed", result.amount_owed());
    }

    out
}

/// One row per stored return: id, year, status, saved time, and the
/// refund or amount owed when a result has been stored.
pub fn render_listing(entries: &[(StoredReturn, Option<StoredResult>)]) -> String {
    if entries.is_empty() {
        return "No saved returns.\n".to_string();
    }

    let mut out = format!(
        "{:>6}  {:>4}  {:<6}  {:<19}  {:>16}\n",
        "ID", "YEAR", "STATUS", "UPDATED", "REFUND (OWED)"
    );
    for (stored, result) in entries {
        let outcome = result
            .as_ref()
            .map(|r| format_money(r.result.refund_or_owed))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>6}  {:>4}  {:<6}  {:<19}  {:>16}\n",
            stored.id,
            stored.tax_return.tax_year,
            stored.tax_return.filing_status.as_str(),
            stored.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            outcome
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::tables::tax_year_2025;
    use tax_core::{FilingStatus, TaxReturn, WageRecord};

    use super::*;

    fn result_for(wages: Decimal) -> CalculationResult {
        let mut tax_return = TaxReturn::new(2025, FilingStatus::Single);
        tax_return
            .income
            .wages
            .push(WageRecord::new("Acme", wages, dec!(5000)));
        tax_core::calculate(&tax_year_2025(), &tax_return).unwrap()
    }

    // =========================================================================
    // format_money tests
    // =========================================================================

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(dec!(100000)), "$100,000.00");
        assert_eq!(format_money(dec!(999.5)), "$999.50");
    }

    #[test]
    fn format_money_handles_small_and_negative_amounts() {
        assert_eq!(format_money(dec!(0)), "$0.00");
        assert_eq!(format_money(dec!(-0.001)), "$0.00");
        assert_eq!(format_money(dec!(-1500.25)), "-$1,500.25");
    }

    // =========================================================================
    // render tests
    // =========================================================================

    #[test]
    fn render_result_shows_amount_owed() {
        // 65000 - 15000 = 50000 taxable → 5914 tax, 5000 withheld
        let result = result_for(dec!(65000));

        let report = render_result(&result);

        assert!(report.starts_with("Tax year 2025, Single\n"));
        assert!(report.contains("$50,000.00"));
        assert!(report.contains("$5,914.00"));
        assert!(report.contains("Amount owed"));
        assert!(report.contains("$914.00"));
    }

    #[test]
    fn render_result_aligns_amount_column() {
        let result = result_for(dec!(65000));

        let report = render_result(&result);

        assert!(report.ends_with('\n'));
        let amounts: Vec<&str> = report.lines().filter(|l| l.contains('$')).collect();
        assert!(!amounts.is_empty());
        for row in amounts {
            assert_eq!(row.len(), 2 + LABEL_WIDTH + AMOUNT_WIDTH, "{row}");
        }
    }

    #[test]
    fn render_result_omits_zero_credits() {
        let result = result_for(dec!(65000));

        let report = render_result(&result);

        assert!(!report.contains("Child tax credit"));
        assert!(report.contains("Total credits"));
    }

    #[test]
    fn render_listing_marks_returns_without_result() {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let stored = StoredReturn {
            id: 3,
            tax_return: TaxReturn::new(2025, FilingStatus::HeadOfHousehold),
            created_at: timestamp,
            updated_at: timestamp,
        };
        let result = StoredResult {
            return_id: 4,
            result: result_for(dec!(20000)),
            calculated_at: timestamp,
        };
        let with_result = StoredReturn {
            id: 4,
            ..stored.clone()
        };

        let listing = render_listing(&[(stored, None), (with_result, Some(result))]);

        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("HOH"));
        assert!(lines[1].contains("2026-03-01 09:30:00"));
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].contains('$'));
    }

    #[test]
    fn render_listing_empty() {
        assert_eq!(render_listing(&[]), "No saved returns.\n");
    }
}
