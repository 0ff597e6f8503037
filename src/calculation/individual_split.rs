//! Splitting a role's allocation among the shifts worked in that role.

use rust_decimal::Decimal;

use super::policy::IndividualMethod;

/// One shift's share of its role allocation.
///
/// `Equal` gives every shift the same amount. `HoursBased` is proportional
/// to the shift's hours; when the role logged no hours at all every share is
/// zero. Returns `None` when the share does not fit in a `Decimal`.
///
/// # Examples
///
/// ```
/// use tip_pool_engine::calculation::{split_individual, IndividualMethod};
/// use rust_decimal::Decimal;
///
/// let share = split_individual(
///     IndividualMethod::HoursBased,
///     Decimal::new(80, 0),
///     Decimal::new(6, 0),
///     Decimal::new(8, 0),
///     2,
/// );
/// assert_eq!(share, Some(Decimal::new(60, 0)));
/// ```
pub fn split_individual(
    method: IndividualMethod,
    role_allocation: Decimal,
    shift_hours: Decimal,
    role_hours: Decimal,
    shifts_in_role: usize,
) -> Option<Decimal> {
    match method {
        IndividualMethod::Equal => {
            if shifts_in_role == 0 {
                return Some(Decimal::ZERO);
            }
            role_allocation.checked_div(Decimal::from(shifts_in_role))
        }
        IndividualMethod::HoursBased => {
            if role_hours.is_zero() {
                return Some(Decimal::ZERO);
            }
            role_allocation
                .checked_mul(shift_hours)?
                .checked_div(role_hours)
        }
    }
}
