//! Currency rounding applied when payouts are persisted.
//!
//! The calculation itself never rounds; rounding once at the storage
//! boundary keeps the two-stage split from compounding error.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::ComputedPayout;

/// Decimal places kept for money.
pub const CURRENCY_SCALE: u32 = 2;

/// Decimal places kept for hours and percentage shares.
pub const SHARE_SCALE: u32 = 2;

/// Rounds an amount to cents, half away from zero.
///
/// # Examples
///
/// ```
/// use tip_pool_engine::calculation::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_currency(Decimal::from_str("33.335").unwrap()), Decimal::from_str("33.34").unwrap());
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn round_share(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the payout with its persisted columns rounded.
///
/// `total_amount` is recomputed from the rounded parts so that it always
/// equals `base_amount + bonus_amount` in storage. The audit details keep
/// their exact values.
pub fn round_for_storage(payout: &ComputedPayout) -> ComputedPayout {
    let base_amount = round_currency(payout.base_amount);
    let bonus_amount = round_currency(payout.bonus_amount);
    ComputedPayout {
        base_amount,
        bonus_amount,
        total_amount: base_amount + bonus_amount,
        hours_worked: round_share(payout.hours_worked),
        percentage_share: round_share(payout.percentage_share),
        ..payout.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CalculationDetails;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_currency_midpoint_away_from_zero() {
        assert_eq!(round_currency(dec("10.005")), dec("10.01"));
        assert_eq!(round_currency(dec("10.004")), dec("10.00"));
        assert_eq!(round_currency(dec("-10.005")), dec("-10.01"));
    }

    #[test]
    fn test_round_for_storage_rounds_amounts_and_keeps_details() {
        let third = dec("100") / dec("3");
        let payout = ComputedPayout {
            user_id: 1,
            shift_id: 2,
            base_amount: third,
            bonus_amount: Decimal::ZERO,
            total_amount: third,
            hours_worked: dec("5") / dec("3"),
            role: "server".to_string(),
            percentage_share: third,
            calculation_details: CalculationDetails {
                method: "equal".to_string(),
                percentage: None,
                role_allocation: dec("100"),
                role_hours: dec("5"),
                total_hours: dec("5"),
                multiplier: Decimal::ONE,
                individual_method: "equal".to_string(),
            },
        };

        let rounded = round_for_storage(&payout);
        assert_eq!(rounded.base_amount, dec("33.33"));
        assert_eq!(rounded.total_amount, dec("33.33"));
        assert_eq!(rounded.hours_worked, dec("1.67"));
        assert_eq!(rounded.percentage_share, dec("33.33"));
        assert_eq!(rounded.calculation_details, payout.calculation_details);
    }
}
