//! Tip pool models: the per-date pool row, its status machine, and the
//! shapes returned by calculation and summary queries.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TipPayout;

/// Status of a tip pool.
///
/// `Calculated` is set by every calculation; `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Payouts computed, still open for recalculation.
    Calculated,
    /// Numbers locked in; payouts approved.
    Finalized,
}

impl PoolStatus {
    /// Returns the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolStatus::Calculated => "calculated",
            PoolStatus::Finalized => "finalized",
        }
    }
}

impl std::str::FromStr for PoolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calculated" => Ok(PoolStatus::Calculated),
            "finalized" => Ok(PoolStatus::Finalized),
            other => Err(format!("unknown pool status '{}'", other)),
        }
    }
}

/// One tip pool per calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipPool {
    /// Pool id.
    pub id: i64,
    /// The business date the pool covers (unique).
    pub shift_date: NaiveDate,
    /// Sum of positive tips on closed orders for the date.
    pub total_tips: Decimal,
    /// Number of orders contributing to `total_tips`.
    pub total_orders: i64,
    /// The rule used by the latest calculation.
    pub distribution_rule_id: Option<i64>,
    /// Current status.
    pub status: PoolStatus,
    /// When the latest calculation ran.
    pub calculated_at: Option<DateTime<Utc>>,
    /// Who ran the latest calculation.
    pub calculated_by: Option<i64>,
    /// When the pool was finalized.
    pub distributed_at: Option<DateTime<Utc>>,
    /// Who finalized the pool.
    pub finalized_by: Option<i64>,
}

impl TipPool {
    /// Returns true once the pool has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.status == PoolStatus::Finalized
    }
}

/// Values written by the calculation upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolUpsert {
    /// Date the pool is keyed on.
    pub shift_date: NaiveDate,
    /// Aggregate tips.
    pub total_tips: Decimal,
    /// Aggregate order count.
    pub total_orders: i64,
    /// Rule used.
    pub distribution_rule_id: i64,
    /// Calculation time.
    pub calculated_at: DateTime<Utc>,
    /// Calculating user.
    pub calculated_by: i64,
}

/// Summary block returned alongside a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSummary {
    /// Correlates logs and notifications for this calculation.
    pub calculation_id: Uuid,
    /// Pool total.
    pub total_tips: Decimal,
    /// Contributing order count.
    pub total_orders: i64,
    /// Number of shifts paid out.
    pub total_staff: usize,
    /// Name of the rule used.
    pub distribution_rule: String,
    /// Sum of persisted payout totals.
    pub total_distributed: Decimal,
}

/// The result of `calculate_tip_pool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolCalculation {
    /// The upserted pool row.
    pub pool: TipPool,
    /// The freshly inserted payouts.
    pub payouts: Vec<TipPayout>,
    /// Totals and rule name.
    pub summary: CalculationSummary,
}

/// The result of `finalize_tip_pool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeOutcome {
    /// Always true on return; failures surface as errors.
    pub success: bool,
    /// The pool after finalization.
    pub pool: TipPool,
    /// Payouts moved from pending to approved by this call.
    pub approved_payouts: u64,
    /// True when the pool was already finalized and nothing changed.
    pub already_finalized: bool,
}

/// A pool row enriched for summary listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipPoolSummary {
    /// The pool itself.
    #[serde(flatten)]
    pub pool: TipPool,
    /// Name of the rule used, if any.
    pub rule_name: Option<String>,
    /// Description of the rule used.
    pub rule_description: Option<String>,
    /// Number of payouts owned by the pool.
    pub payout_count: i64,
    /// Sum of payout totals.
    pub total_distributed: Decimal,
    /// Display name of the finalizing user.
    pub finalized_by_name: Option<String>,
}

/// A pool with its payouts, for detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipPoolDetails {
    /// The pool.
    pub pool: TipPool,
    /// Name of the rule used.
    pub rule_name: Option<String>,
    /// The payouts owned by the pool.
    pub payouts: Vec<TipPayout>,
}

/// An inclusive date range for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day, inclusive.
    pub start: Option<NaiveDate>,
    /// Last day, inclusive.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range bounded on both sides.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_pool_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PoolStatus::Calculated).unwrap(),
            "\"calculated\""
        );
        assert_eq!(
            serde_json::to_string(&PoolStatus::Finalized).unwrap(),
            "\"finalized\""
        );
        assert_eq!(PoolStatus::from_str("finalized"), Ok(PoolStatus::Finalized));
        assert!(PoolStatus::from_str("distributed").is_err());
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let range = DateRange::between(date("2026-02-01"), date("2026-02-07"));
        assert!(range.contains(date("2026-02-01")));
        assert!(range.contains(date("2026-02-07")));
        assert!(!range.contains(date("2026-01-31")));
        assert!(!range.contains(date("2026-02-08")));
    }

    #[test]
    fn test_open_ended_ranges() {
        let from_only = DateRange {
            start: Some(date("2026-02-01")),
            end: None,
        };
        assert!(from_only.contains(date("2030-01-01")));
        assert!(!from_only.contains(date("2026-01-01")));
        let open = DateRange {
            start: None,
            end: None,
        };
        assert!(open.contains(date("1999-12-31")));
    }
}
