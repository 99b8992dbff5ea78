use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One slice of a progressive rate schedule.
///
/// `tax_rate` applies only to income within `[min_income, max_income)`.
/// The top bracket of a schedule has `max_income` of `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            tax_rate,
        }
    }

    /// Portion of `income` that falls inside this bracket.
    pub fn income_in_bracket(
        &self,
        income: Decimal,
    ) -> Decimal {
        if income <= self.min_income {
            return Decimal::ZERO;
        }
        let top = match self.max_income {
            Some(max) => income.min(max),
            None => income,
        };
        top - self.min_income
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn income_below_bracket_contributes_nothing() {
        let bracket = TaxBracket::new(dec!(11925), Some(dec!(48475)), dec!(0.12));

        assert_eq!(bracket.income_in_bracket(dec!(10000)), dec!(0));
        assert_eq!(bracket.income_in_bracket(dec!(11925)), dec!(0));
    }

    #[test]
    fn income_inside_bracket_is_partial_slice() {
        let bracket = TaxBracket::new(dec!(11925), Some(dec!(48475)), dec!(0.12));

        assert_eq!(bracket.income_in_bracket(dec!(20000)), dec!(8075));
    }

    #[test]
    fn income_above_bracket_is_full_width() {
        let bracket = TaxBracket::new(dec!(11925), Some(dec!(48475)), dec!(0.12));

        assert_eq!(bracket.income_in_bracket(dec!(90000)), dec!(36550));
    }

    #[test]
    fn unbounded_bracket_takes_everything_above_min() {
        let bracket = TaxBracket::new(dec!(626350), None, dec!(0.37));

        assert_eq!(bracket.income_in_bracket(dec!(700000)), dec!(73650));
    }
}
