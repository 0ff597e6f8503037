//! Tip payout models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PoolStatus;

/// Status of a single payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Awaiting pool finalization.
    Pending,
    /// Locked in by finalization.
    Approved,
}

impl PayoutStatus {
    /// Returns the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Approved => "approved",
        }
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "approved" => Ok(PayoutStatus::Approved),
            other => Err(format!("unknown payout status '{}'", other)),
        }
    }
}

/// Snapshot of the numbers behind a payout, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationDetails {
    /// Role allocation method applied.
    pub method: String,
    /// Percentage used by the `percentage` method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
    /// Dollars allocated to the whole role.
    pub role_allocation: Decimal,
    /// Hours worked by the role.
    pub role_hours: Decimal,
    /// Hours worked by everyone on the date.
    pub total_hours: Decimal,
    /// Multiplier from the policy.
    pub multiplier: Decimal,
    /// Split method within the role.
    pub individual_method: String,
}

/// A payout produced by the calculation, before persistence.
///
/// Amounts are unrounded; the store rounds them to currency precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedPayout {
    /// Recipient.
    pub user_id: i64,
    /// Shift the payout is earned on.
    pub shift_id: i64,
    /// Share of the role allocation.
    pub base_amount: Decimal,
    /// Reserved; always zero.
    pub bonus_amount: Decimal,
    /// `base_amount + bonus_amount`.
    pub total_amount: Decimal,
    /// Hours on the shift.
    pub hours_worked: Decimal,
    /// Role worked.
    pub role: String,
    /// Percentage of the pool total.
    pub percentage_share: Decimal,
    /// Audit snapshot.
    pub calculation_details: CalculationDetails,
}

/// A persisted payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipPayout {
    /// Payout id.
    pub id: i64,
    /// Owning pool.
    pub tip_pool_id: i64,
    /// Recipient.
    pub user_id: i64,
    /// Shift the payout is earned on.
    pub shift_id: i64,
    /// Share of the role allocation, rounded to currency precision.
    pub base_amount: Decimal,
    /// Reserved; always zero.
    pub bonus_amount: Decimal,
    /// `base_amount + bonus_amount`.
    pub total_amount: Decimal,
    /// Hours on the shift.
    pub hours_worked: Decimal,
    /// Role worked.
    pub role: String,
    /// Percentage of the pool total.
    pub percentage_share: Decimal,
    /// Audit snapshot.
    pub calculation_details: CalculationDetails,
    /// Pending until the pool is finalized.
    pub status: PayoutStatus,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

/// A payout joined with its pool, for a user's payout history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayout {
    /// The payout.
    #[serde(flatten)]
    pub payout: TipPayout,
    /// Pool date.
    pub shift_date: NaiveDate,
    /// Pool total.
    pub pool_total_tips: Decimal,
    /// Pool status.
    pub pool_status: PoolStatus,
    /// Rule used by the pool.
    pub rule_name: Option<String>,
}
