//! Shared arithmetic for the calculation stages: cent rounding, floors, and
//! the clamp applied to out-of-domain inputs.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

/// Rounds to cents, with midpoints rounded away from zero.
///
/// Every monetary line produced by the engine passes through this function.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two amounts.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the smaller of two amounts.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// Floors an amount at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Replaces a negative input amount with zero, logging the clamp.
///
/// Used for entered amounts where a negative value has no meaning (an
/// adjustment or an itemized expense). Amounts that may legitimately be
/// negative, such as a business loss, are never passed through here.
pub fn clamp_input(
    field: &'static str,
    value: Decimal,
) -> Decimal {
    if value < Decimal::ZERO {
        warn!(field, value = %value, "negative input amount clamped to zero");
        return Decimal::ZERO;
    }
    value
}
