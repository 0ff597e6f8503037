//! Calculation logic for the Tip Pool Engine.
//!
//! This module contains the pure, deterministic part of the engine: policy
//! resolution for each role, role allocation, the split of a role's
//! allocation among its shifts, payout assembly, and the currency rounding
//! applied at the storage boundary.

mod individual_split;
mod payouts;
mod policy;
mod role_allocation;
mod rounding;

pub use individual_split::split_individual;
pub use payouts::calculate_payouts;
pub use policy::{
    AllocationMethod, IndividualMethod, PolicySource, ResolvedPolicy, resolve_policy,
};
pub use role_allocation::{RoleGroup, allocate_role, group_by_role};
pub use rounding::{CURRENCY_SCALE, SHARE_SCALE, round_currency, round_for_storage};
