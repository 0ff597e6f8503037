//! Core data models for the Tip Pool Engine.
//!
//! This module contains the records the engine reads (shifts, closed orders,
//! distribution rules) and the records it owns (pools, payouts, disputes).

mod dispute;
mod distribution_rule;
mod order;
mod payout;
mod shift;
mod tip_pool;

pub use dispute::{DisputeOutcome, DisputeResolution, DisputeStatus, NewDispute, TipDispute};
pub use distribution_rule::{
    DistributionRule, NewDistributionRule, PolicySpec, RuleDiagnostic, RulesDocument,
};
pub use order::{ClosedOrder, TipTotals};
pub use payout::{CalculationDetails, ComputedPayout, PayoutStatus, TipPayout, UserPayout};
pub use shift::{NewShift, Shift, ShiftStatus, WorkedShift, hours_between};
pub use tip_pool::{
    CalculationSummary, DateRange, FinalizeOutcome, PoolCalculation, PoolStatus, PoolUpsert,
    TipPool, TipPoolDetails, TipPoolSummary,
};
