mod calculation_result;
mod filing_status;
mod tax_bracket;
mod tax_return;

pub use calculation_result::{CalculationResult, CreditAmount, CreditBreakdown, DeductionKind};
pub use filing_status::FilingStatus;
pub use tax_bracket::TaxBracket;
pub use tax_return::{
    Adjustments, CreditInputs, DeductionInputs, Dependent, DividendRecord, IncomeSection,
    InterestRecord, NonemployeeRecord, RecordId, SelfEmploymentIncome, StudentExpenses,
    TaxReturn, WageRecord,
};
