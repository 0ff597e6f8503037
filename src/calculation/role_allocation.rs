//! Role allocation.
//!
//! Groups the day's shifts by role and sizes each role's share of the pool
//! according to its resolved policy. Allocations are not normalized: a rule
//! whose percentages or multipliers are inconsistent may hand out more or
//! less than the pool.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::WorkedShift;

use super::policy::{AllocationMethod, ResolvedPolicy};

/// The shifts worked in one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGroup<'a> {
    /// Role name.
    pub role: &'a str,
    /// Shifts in input order.
    pub shifts: Vec<&'a WorkedShift>,
    /// Sum of hours over `shifts`.
    pub hours: Decimal,
}

/// Groups shifts by role, keeping roles in order of first appearance.
pub fn group_by_role(shifts: &[WorkedShift]) -> Vec<RoleGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<RoleGroup<'_>> = Vec::new();

    for shift in shifts {
        let slot = *index.entry(shift.role.as_str()).or_insert_with(|| {
            groups.push(RoleGroup {
                role: shift.role.as_str(),
                shifts: Vec::new(),
                hours: Decimal::ZERO,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.shifts.push(shift);
        group.hours += shift.hours_worked;
    }

    groups
}

/// Dollars allocated to one role.
///
/// # Arguments
///
/// * `policy` - The role's resolved policy
/// * `total_tips` - The pool total
/// * `role_hours` - Hours worked in the role
/// * `total_hours` - Hours worked across all roles
/// * `roles_present` - Number of roles with at least one shift
///
/// Hours-based methods yield zero when `total_hours` is zero. Returns `None`
/// when the allocation does not fit in a `Decimal`.
///
/// # Examples
///
/// ```
/// use tip_pool_engine::calculation::{allocate_role, ResolvedPolicy, AllocationMethod};
/// use rust_decimal::Decimal;
///
/// let policy = ResolvedPolicy {
///     method: AllocationMethod::HoursWeighted,
///     ..ResolvedPolicy::fallback()
/// };
/// let allocation = allocate_role(
///     &policy,
///     Decimal::new(100, 0),
///     Decimal::new(8, 0),
///     Decimal::new(10, 0),
///     2,
/// );
/// assert_eq!(allocation, Some(Decimal::new(80, 0)));
/// ```
pub fn allocate_role(
    policy: &ResolvedPolicy,
    total_tips: Decimal,
    role_hours: Decimal,
    total_hours: Decimal,
    roles_present: usize,
) -> Option<Decimal> {
    match policy.method {
        AllocationMethod::Percentage { percentage } => total_tips
            .checked_mul(percentage)?
            .checked_div(Decimal::ONE_HUNDRED),
        AllocationMethod::HoursWeighted => {
            hours_share(total_tips, role_hours, total_hours)?.checked_mul(policy.multiplier)
        }
        AllocationMethod::Equal => {
            if roles_present == 0 {
                return Some(Decimal::ZERO);
            }
            total_tips
                .checked_div(Decimal::from(roles_present))?
                .checked_mul(policy.multiplier)
        }
        AllocationMethod::HoursShare => hours_share(total_tips, role_hours, total_hours),
    }
}

fn hours_share(total_tips: Decimal, role_hours: Decimal, total_hours: Decimal) -> Option<Decimal> {
    if total_hours.is_zero() {
        return Some(Decimal::ZERO);
    }
    total_tips.checked_mul(role_hours)?.checked_div(total_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::policy::{IndividualMethod, PolicySource};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn worked(shift_id: i64, role: &str, hours: &str) -> WorkedShift {
        WorkedShift {
            shift_id,
            user_id: shift_id * 10,
            role: role.to_string(),
            hours_worked: dec(hours),
        }
    }

    fn policy(method: AllocationMethod, multiplier: &str) -> ResolvedPolicy {
        ResolvedPolicy {
            method,
            multiplier: dec(multiplier),
            individual: IndividualMethod::HoursBased,
            source: PolicySource::Role,
        }
    }

    #[test]
    fn test_group_by_role_keeps_first_seen_order() {
        let shifts = vec![
            worked(1, "server", "4"),
            worked(2, "chef", "2"),
            worked(3, "server", "4.5"),
        ];
        let groups = group_by_role(&shifts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].role, "server");
        assert_eq!(groups[0].hours, dec("8.5"));
        assert_eq!(groups[0].shifts.len(), 2);
        assert_eq!(groups[0].shifts[1].shift_id, 3);
        assert_eq!(groups[1].role, "chef");
        assert_eq!(groups[1].hours, dec("2"));
    }

    #[test]
    fn test_group_by_role_empty() {
        assert!(group_by_role(&[]).is_empty());
    }

    #[test]
    fn test_percentage_allocation() {
        let p = policy(
            AllocationMethod::Percentage {
                percentage: dec("15"),
            },
            "1",
        );
        assert_eq!(allocate_role(&p, dec("240"), dec("4"), dec("20"), 3), Some(dec("36")));
    }

    #[test]
    fn test_percentage_ignores_multiplier() {
        let p = policy(
            AllocationMethod::Percentage {
                percentage: dec("50"),
            },
            "3",
        );
        assert_eq!(allocate_role(&p, dec("100"), dec("4"), dec("20"), 3), Some(dec("50")));
    }

    #[test]
    fn test_hours_weighted_applies_multiplier() {
        let p = policy(AllocationMethod::HoursWeighted, "1.5");
        // 100 * 4/20 * 1.5 = 30
        assert_eq!(allocate_role(&p, dec("100"), dec("4"), dec("20"), 2), Some(dec("30")));
    }

    #[test]
    fn test_equal_divides_by_roles_present() {
        let p = policy(AllocationMethod::Equal, "1");
        assert_eq!(allocate_role(&p, dec("90"), dec("1"), dec("20"), 3), Some(dec("30")));
        let doubled = policy(AllocationMethod::Equal, "2");
        assert_eq!(allocate_role(&doubled, dec("90"), dec("1"), dec("20"), 3), Some(dec("60")));
    }

    #[test]
    fn test_hours_share_ignores_multiplier() {
        let p = policy(AllocationMethod::HoursShare, "4");
        assert_eq!(allocate_role(&p, dec("100"), dec("5"), dec("20"), 2), Some(dec("25")));
    }

    #[test]
    fn test_zero_total_hours_yields_zero_for_hours_methods() {
        let weighted = policy(AllocationMethod::HoursWeighted, "1");
        let share = policy(AllocationMethod::HoursShare, "1");
        assert_eq!(allocate_role(&weighted, dec("100"), dec("0"), dec("0"), 1), Some(Decimal::ZERO));
        assert_eq!(allocate_role(&share, dec("100"), dec("0"), dec("0"), 1), Some(Decimal::ZERO));
    }

    #[test]
    fn test_overflowing_multiplier_yields_none() {
        let p = policy(AllocationMethod::HoursWeighted, "79228162514264337593543950335");
        assert_eq!(allocate_role(&p, dec("100"), dec("4"), dec("4"), 1), None);
        let equal = policy(AllocationMethod::Equal, "79228162514264337593543950335");
        assert_eq!(allocate_role(&equal, dec("100"), dec("4"), dec("4"), 1), None);
    }

    #[test]
    fn test_equal_still_allocates_with_zero_hours() {
        let p = policy(AllocationMethod::Equal, "1");
        assert_eq!(allocate_role(&p, dec("100"), dec("0"), dec("0"), 2), Some(dec("50")));
    }
}
