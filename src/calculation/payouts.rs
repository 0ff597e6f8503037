//! Payout calculation.
//!
//! Splits the pool across roles, then across the shifts within each role.
//! The result is deterministic for identical inputs: roles appear in order of
//! their first shift, shifts in input order.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationDetails, ComputedPayout, RulesDocument, WorkedShift};

use super::individual_split::split_individual;
use super::policy::{AllocationMethod, resolve_policy};
use super::role_allocation::{allocate_role, group_by_role};

/// Calculates one payout per shift.
///
/// # Arguments
///
/// * `shifts` - Completed shifts for the pool's date
/// * `total_tips` - The pool total
/// * `rules` - The distribution rule document
///
/// # Returns
///
/// Unrounded payouts, or [`EngineError::InvalidDistributionRule`] if a role's
/// policy cannot be applied or its amounts overflow.
///
/// # Examples
///
/// ```
/// use tip_pool_engine::calculation::calculate_payouts;
/// use tip_pool_engine::models::{RulesDocument, WorkedShift};
/// use rust_decimal::Decimal;
///
/// let shifts = vec![
///     WorkedShift { shift_id: 1, user_id: 1, role: "server".into(), hours_worked: Decimal::new(4, 0) },
///     WorkedShift { shift_id: 2, user_id: 2, role: "server".into(), hours_worked: Decimal::new(4, 0) },
///     WorkedShift { shift_id: 3, user_id: 3, role: "chef".into(), hours_worked: Decimal::new(2, 0) },
/// ];
/// let rules = RulesDocument::from_value(&serde_json::json!({
///     "default": { "method": "hours_weighted", "multiplier": 1 }
/// }));
///
/// let payouts = calculate_payouts(&shifts, Decimal::new(100, 0), &rules).unwrap();
/// let amounts: Vec<Decimal> = payouts.iter().map(|p| p.total_amount).collect();
/// assert_eq!(amounts, vec![Decimal::new(40, 0), Decimal::new(40, 0), Decimal::new(20, 0)]);
/// ```
pub fn calculate_payouts(
    shifts: &[WorkedShift],
    total_tips: Decimal,
    rules: &RulesDocument,
) -> EngineResult<Vec<ComputedPayout>> {
    let groups = group_by_role(shifts);
    let total_hours: Decimal = groups.iter().map(|g| g.hours).sum();
    let roles_present = groups.len();

    let mut payouts = Vec::with_capacity(shifts.len());
    let mut distributed = Decimal::ZERO;

    for group in &groups {
        let overflow = || EngineError::InvalidDistributionRule {
            role: group.role.to_string(),
            message: "allocation exceeds the representable amount".to_string(),
        };

        let policy = resolve_policy(rules, group.role)?;
        let role_allocation = allocate_role(
            &policy,
            total_tips,
            group.hours,
            total_hours,
            roles_present,
        )
        .ok_or_else(overflow)?;

        debug!(
            role = group.role,
            method = policy.method.label(),
            source = ?policy.source,
            role_hours = %group.hours,
            role_allocation = %role_allocation,
            "Allocated role share"
        );

        let percentage = match policy.method {
            AllocationMethod::Percentage { percentage } => Some(percentage),
            _ => None,
        };

        for shift in &group.shifts {
            let share = split_individual(
                policy.individual,
                role_allocation,
                shift.hours_worked,
                group.hours,
                group.shifts.len(),
            )
            .ok_or_else(overflow)?;
            distributed = distributed.checked_add(share).ok_or_else(overflow)?;
            let percentage_share = if total_tips > Decimal::ZERO {
                share
                    .checked_div(total_tips)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or_else(overflow)?
            } else {
                Decimal::ZERO
            };

            payouts.push(ComputedPayout {
                user_id: shift.user_id,
                shift_id: shift.shift_id,
                base_amount: share,
                bonus_amount: Decimal::ZERO,
                total_amount: share,
                hours_worked: shift.hours_worked,
                role: group.role.to_string(),
                percentage_share,
                calculation_details: CalculationDetails {
                    method: policy.method.label().to_string(),
                    percentage,
                    role_allocation,
                    role_hours: group.hours,
                    total_hours,
                    multiplier: policy.multiplier,
                    individual_method: policy.individual.label().to_string(),
                },
            });
        }
    }

    Ok(payouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn worked(shift_id: i64, user_id: i64, role: &str, hours: &str) -> WorkedShift {
        WorkedShift {
            shift_id,
            user_id,
            role: role.to_string(),
            hours_worked: dec(hours),
        }
    }

    fn rules(value: serde_json::Value) -> RulesDocument {
        RulesDocument::from_value(&value)
    }

    fn sum(payouts: &[ComputedPayout]) -> Decimal {
        payouts.iter().map(|p| p.total_amount).sum()
    }

    /// The two-server, one-chef day from the pool walkthrough.
    #[test]
    fn test_hours_weighted_walkthrough() {
        let shifts = vec![
            worked(1, 101, "server", "4"),
            worked(2, 102, "server", "4"),
            worked(3, 103, "chef", "2"),
        ];
        let doc = rules(json!({ "default": { "method": "hours_weighted", "multiplier": 1 } }));

        let payouts = calculate_payouts(&shifts, dec("100"), &doc).unwrap();

        assert_eq!(payouts.len(), 3);
        assert_eq!(payouts[0].user_id, 101);
        assert_eq!(payouts[0].total_amount, dec("40"));
        assert_eq!(payouts[0].percentage_share, dec("40"));
        assert_eq!(payouts[1].total_amount, dec("40"));
        assert_eq!(payouts[2].user_id, 103);
        assert_eq!(payouts[2].total_amount, dec("20"));
        assert_eq!(payouts[2].percentage_share, dec("20"));
        assert_eq!(sum(&payouts), dec("100"));

        let details = &payouts[0].calculation_details;
        assert_eq!(details.method, "hours_weighted");
        assert_eq!(details.role_allocation, dec("80"));
        assert_eq!(details.role_hours, dec("8"));
        assert_eq!(details.total_hours, dec("10"));
        assert_eq!(details.multiplier, Decimal::ONE);
        assert_eq!(details.individual_method, "hours_based");
    }

    #[test]
    fn test_percentage_roles_partition_the_pool() {
        let shifts = vec![
            worked(1, 1, "server", "6"),
            worked(2, 2, "server", "3"),
            worked(3, 3, "bartender", "5"),
            worked(4, 4, "busser", "4"),
        ];
        let doc = rules(json!({
            "roles": {
                "server": { "method": "percentage", "percentage": 70 },
                "bartender": { "method": "percentage", "percentage": 20 },
                "busser": { "method": "percentage", "percentage": 10 }
            }
        }));

        let payouts = calculate_payouts(&shifts, dec("300"), &doc).unwrap();

        // server: 210 split 6:3
        assert_eq!(payouts[0].total_amount, dec("140"));
        assert_eq!(payouts[1].total_amount, dec("70"));
        assert_eq!(payouts[2].total_amount, dec("60"));
        assert_eq!(payouts[3].total_amount, dec("30"));
        assert_eq!(payouts[0].calculation_details.percentage, Some(dec("70")));
        assert_eq!(sum(&payouts), dec("300"));
    }

    #[test]
    fn test_equal_individual_split_ignores_hours() {
        let shifts = vec![
            worked(1, 1, "server", "2"),
            worked(2, 2, "server", "7"),
            worked(3, 3, "server", "3"),
        ];
        let doc = rules(json!({
            "roles": { "server": { "method": "hours_weighted", "individualMethod": "equal" } }
        }));

        let payouts = calculate_payouts(&shifts, dec("90"), &doc).unwrap();
        assert!(payouts.iter().all(|p| p.base_amount == dec("30")));
        assert!(payouts.iter().all(|p| p.calculation_details.individual_method == "equal"));
    }

    #[test]
    fn test_fallback_policy_splits_roles_equally() {
        let shifts = vec![
            worked(1, 1, "server", "8"),
            worked(2, 2, "host", "2"),
        ];
        let payouts = calculate_payouts(&shifts, dec("100"), &RulesDocument::default()).unwrap();
        assert_eq!(payouts[0].total_amount, dec("50"));
        assert_eq!(payouts[1].total_amount, dec("50"));
        assert_eq!(payouts[0].calculation_details.method, "equal");
    }

    #[test]
    fn test_unknown_method_uses_plain_hours_share() {
        let shifts = vec![
            worked(1, 1, "server", "3"),
            worked(2, 2, "chef", "1"),
        ];
        let doc = rules(json!({ "default": { "method": "tenure", "multiplier": 5 } }));
        let payouts = calculate_payouts(&shifts, dec("80"), &doc).unwrap();
        assert_eq!(payouts[0].total_amount, dec("60"));
        assert_eq!(payouts[1].total_amount, dec("20"));
        assert_eq!(payouts[0].calculation_details.method, "hours_share");
    }

    #[test]
    fn test_multipliers_can_over_distribute() {
        let shifts = vec![
            worked(1, 1, "server", "5"),
            worked(2, 2, "chef", "5"),
        ];
        let doc = rules(json!({
            "roles": {
                "server": { "method": "hours_weighted", "multiplier": 1.5 },
                "chef": { "method": "hours_weighted", "multiplier": 1 }
            }
        }));
        let payouts = calculate_payouts(&shifts, dec("100"), &doc).unwrap();
        assert_eq!(payouts[0].total_amount, dec("75"));
        assert_eq!(payouts[1].total_amount, dec("50"));
        assert_eq!(sum(&payouts), dec("125"));
    }

    #[test]
    fn test_zero_hour_shifts_receive_nothing_under_hours_methods() {
        let shifts = vec![
            worked(1, 1, "server", "0"),
            worked(2, 2, "chef", "0"),
        ];
        let doc = rules(json!({ "default": { "method": "hours_weighted" } }));
        let payouts = calculate_payouts(&shifts, dec("100"), &doc).unwrap();
        assert_eq!(payouts.len(), 2);
        assert!(payouts.iter().all(|p| p.total_amount.is_zero()));
    }

    #[test]
    fn test_invalid_role_policy_fails_whole_calculation() {
        let shifts = vec![worked(1, 1, "bartender", "4")];
        let doc = rules(json!({ "roles": { "bartender": { "method": "percentage" } } }));
        let err = calculate_payouts(&shifts, dec("50"), &doc).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDistributionRule { .. }));
    }

    #[test]
    fn test_huge_multiplier_is_an_invalid_rule_not_a_panic() {
        let shifts = vec![worked(1, 1, "server", "4")];
        let doc = rules(json!({
            "roles": {
                "server": { "method": "hours_weighted", "multiplier": "79228162514264337593543950335" }
            }
        }));
        let err = calculate_payouts(&shifts, dec("100"), &doc).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidDistributionRule { ref role, .. } if role == "server"
        ));
    }

    #[test]
    fn test_roles_summing_past_decimal_range_are_rejected() {
        let shifts = vec![
            worked(1, 1, "server", "4"),
            worked(2, 2, "chef", "4"),
        ];
        let doc = rules(json!({ "default": { "method": "equal", "multiplier": 3 } }));
        let err = calculate_payouts(&shifts, Decimal::MAX / dec("2"), &doc).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDistributionRule { .. }));
    }

    #[test]
    fn test_non_string_method_falls_back_to_hours_share() {
        let shifts = vec![
            worked(1, 1, "server", "3"),
            worked(2, 2, "chef", "1"),
        ];
        let doc = rules(json!({ "default": { "method": 5, "individualMethod": ["equal"] } }));
        let payouts = calculate_payouts(&shifts, dec("40"), &doc).unwrap();
        assert_eq!(payouts[0].total_amount, dec("30"));
        assert_eq!(payouts[1].total_amount, dec("10"));
        assert_eq!(payouts[0].calculation_details.method, "hours_share");
        assert_eq!(payouts[0].calculation_details.individual_method, "hours_based");
    }

    #[test]
    fn test_no_shifts_yields_no_payouts() {
        let payouts = calculate_payouts(&[], dec("50"), &RulesDocument::default()).unwrap();
        assert!(payouts.is_empty());
    }

    fn shift_strategy() -> impl Strategy<Value = Vec<WorkedShift>> {
        let roles = prop::sample::select(vec!["server", "chef", "bartender", "busser"]);
        prop::collection::vec((roles, 1u32..=48), 1..12).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (role, quarter_hours))| WorkedShift {
                    shift_id: i as i64 + 1,
                    user_id: i as i64 + 100,
                    role: role.to_string(),
                    hours_worked: Decimal::new(quarter_hours as i64 * 25, 2),
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_hours_weighted_conserves_pool(
            shifts in shift_strategy(),
            cents in 1i64..=500_000,
        ) {
            let total = Decimal::new(cents, 2);
            let doc = rules(json!({ "default": { "method": "hours_weighted", "multiplier": 1 } }));
            let payouts = calculate_payouts(&shifts, total, &doc).unwrap();
            let diff = (sum(&payouts) - total).abs();
            prop_assert!(diff <= dec("0.000001"), "diff {} for total {}", diff, total);
        }

        #[test]
        fn prop_hours_based_share_matches_hour_ratio(
            shifts in shift_strategy(),
            cents in 1i64..=500_000,
        ) {
            let total = Decimal::new(cents, 2);
            let doc = rules(json!({ "default": { "method": "equal" } }));
            let payouts = calculate_payouts(&shifts, total, &doc).unwrap();
            for payout in &payouts {
                let details = &payout.calculation_details;
                let expected = details.role_allocation * payout.hours_worked / details.role_hours;
                prop_assert!((payout.base_amount - expected).abs() <= dec("0.000001"));
            }
        }

        #[test]
        fn prop_equal_split_is_uniform_within_role(
            shifts in shift_strategy(),
            cents in 1i64..=500_000,
        ) {
            let total = Decimal::new(cents, 2);
            let doc = rules(json!({ "default": { "method": "hours_weighted", "individualMethod": "equal" } }));
            let payouts = calculate_payouts(&shifts, total, &doc).unwrap();
            for a in &payouts {
                for b in payouts.iter().filter(|b| b.role == a.role) {
                    prop_assert_eq!(a.base_amount, b.base_amount);
                }
            }
        }

        #[test]
        fn prop_percentages_under_100_never_over_distribute(
            shifts in shift_strategy(),
            cents in 1i64..=500_000,
            server_pct in 0u32..=50,
            kitchen_pct in 0u32..=50,
        ) {
            let total = Decimal::new(cents, 2);
            let doc = rules(json!({
                "default": { "method": "percentage", "percentage": 0 },
                "roles": {
                    "server": { "method": "percentage", "percentage": server_pct },
                    "chef": { "method": "percentage", "percentage": kitchen_pct }
                }
            }));
            let payouts = calculate_payouts(&shifts, total, &doc).unwrap();
            prop_assert!(sum(&payouts) <= total + dec("0.000001"));
        }
    }
}
