//! Storage for the Tip Pool Engine.
//!
//! [`TipStore`] is the seam between the engine and the relational store that
//! holds orders, shifts, rules, pools and payouts. Two backends ship with the
//! crate: [`MemoryStore`] for tests and single-process use, and [`PgStore`]
//! for PostgreSQL.
//!
//! ## Transaction semantics
//!
//! Every method that establishes calculation inputs or writes pool state
//! takes `&mut Self::Tx`. The lifecycle is:
//!
//! 1. `begin()` starts a transaction
//! 2. reads and writes go through `&mut tx`
//! 3. `commit(tx)` makes them visible, or `rollback(tx)` discards them
//!
//! Dropping a transaction without committing MUST discard its writes.
//!
//! Read-only query methods run outside any transaction and must not be
//! called while the same task holds an open transaction.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::StoreResult;
use crate::models::{
    ClosedOrder, ComputedPayout, DateRange, DisputeResolution, DistributionRule, NewDispute,
    NewDistributionRule, NewShift, PoolUpsert, Shift, TipDispute, TipPayout, TipPool,
    TipPoolDetails, TipPoolSummary, UserPayout, WorkedShift,
};

pub use memory::{MemoryStore, MemoryTx};
pub use postgres::PgStore;

/// Transactional storage used by [`TipPoolEngine`](crate::engine::TipPoolEngine).
///
/// Implementations must be `Send + Sync + 'static` so the engine can live in
/// axum application state.
#[async_trait]
pub trait TipStore: Send + Sync + 'static {
    /// The transaction handle.
    type Tx: Send;

    // ── Transaction lifecycle ────────────────────────────────────────────────

    /// Starts a transaction.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Commits a transaction.
    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    /// Rolls a transaction back.
    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;

    // ── Calculation inputs (within transaction) ──────────────────────────────

    /// Looks up a rule by id, returning it only if it is active.
    async fn find_active_rule(
        &self,
        tx: &mut Self::Tx,
        rule_id: i64,
    ) -> StoreResult<Option<DistributionRule>>;

    /// Closed orders with a positive tip whose closing date is `date`.
    async fn closed_orders_on(
        &self,
        tx: &mut Self::Tx,
        date: NaiveDate,
    ) -> StoreResult<Vec<ClosedOrder>>;

    /// Completed shifts with a clock-out time that started on `date`, in id
    /// order.
    async fn completed_shifts_on(
        &self,
        tx: &mut Self::Tx,
        date: NaiveDate,
    ) -> StoreResult<Vec<WorkedShift>>;

    /// The pool for `date`, if one exists.
    async fn pool_for_date(
        &self,
        tx: &mut Self::Tx,
        date: NaiveDate,
    ) -> StoreResult<Option<TipPool>>;

    /// The pool with `pool_id`, locked for update where the backend supports
    /// row locks.
    async fn pool_for_update(&self, tx: &mut Self::Tx, pool_id: i64)
    -> StoreResult<Option<TipPool>>;

    // ── Pool writes (within transaction) ─────────────────────────────────────

    /// Inserts the pool for the date or overwrites its totals, rule, and
    /// status. Finalization fields are cleared.
    async fn upsert_pool(&self, tx: &mut Self::Tx, upsert: &PoolUpsert) -> StoreResult<TipPool>;

    /// Deletes every payout owned by the pool. Returns the number removed.
    async fn delete_payouts(&self, tx: &mut Self::Tx, pool_id: i64) -> StoreResult<u64>;

    /// Persists a payout with status `pending`, rounding amounts to currency
    /// precision.
    async fn insert_payout(
        &self,
        tx: &mut Self::Tx,
        pool_id: i64,
        payout: &ComputedPayout,
    ) -> StoreResult<TipPayout>;

    /// Marks the pool finalized.
    async fn finalize_pool(
        &self,
        tx: &mut Self::Tx,
        pool_id: i64,
        finalized_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<TipPool>;

    /// Moves the pool's pending payouts to approved. Returns the number moved.
    async fn approve_pending_payouts(&self, tx: &mut Self::Tx, pool_id: i64) -> StoreResult<u64>;

    // ── Disputes (within transaction) ────────────────────────────────────────

    /// A payout by id.
    async fn payout_by_id(
        &self,
        tx: &mut Self::Tx,
        payout_id: i64,
    ) -> StoreResult<Option<TipPayout>>;

    /// Opens a dispute.
    async fn insert_dispute(
        &self,
        tx: &mut Self::Tx,
        dispute: &NewDispute,
        at: DateTime<Utc>,
    ) -> StoreResult<TipDispute>;

    /// A dispute by id, locked for update where supported.
    async fn dispute_for_update(
        &self,
        tx: &mut Self::Tx,
        dispute_id: i64,
    ) -> StoreResult<Option<TipDispute>>;

    /// Records a dispute outcome.
    async fn close_dispute(
        &self,
        tx: &mut Self::Tx,
        dispute_id: i64,
        resolution: &DisputeResolution,
        at: DateTime<Utc>,
    ) -> StoreResult<TipDispute>;

    // ── Queries (outside transaction) ────────────────────────────────────────

    /// Pools in `range`, newest first. With `user_id`, only pools holding a
    /// payout for that user.
    async fn pool_summaries(
        &self,
        range: DateRange,
        user_id: Option<i64>,
    ) -> StoreResult<Vec<TipPoolSummary>>;

    /// A user's payouts whose pool date falls in `range`, newest first.
    async fn user_payouts(&self, user_id: i64, range: DateRange) -> StoreResult<Vec<UserPayout>>;

    /// A pool with its payouts.
    async fn pool_details(&self, pool_id: i64) -> StoreResult<Option<TipPoolDetails>>;

    /// Number of payouts owned by the pool.
    async fn count_payouts(&self, pool_id: i64) -> StoreResult<i64>;

    /// Disputes raised against the pool's payouts, oldest first.
    async fn disputes_for_pool(&self, pool_id: i64) -> StoreResult<Vec<TipDispute>>;

    // ── Collaborator writes ──────────────────────────────────────────────────

    /// Stores a new, active distribution rule.
    async fn insert_rule(
        &self,
        rule: &NewDistributionRule,
        at: DateTime<Utc>,
    ) -> StoreResult<DistributionRule>;

    /// All active rules, by id.
    async fn active_rules(&self) -> StoreResult<Vec<DistributionRule>>;

    /// Stores a completed shift.
    async fn insert_shift(&self, shift: &NewShift, hours_worked: Decimal) -> StoreResult<Shift>;
}
