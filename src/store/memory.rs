//! In-process [`TipStore`] backend.
//!
//! All tables live behind one async mutex. A transaction holds the lock for
//! its whole lifetime and works on a copy of the tables, which replaces the
//! shared state on commit. Transactions are therefore fully serialized, and
//! a dropped transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::calculation::round_for_storage;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    ClosedOrder, ComputedPayout, DateRange, DisputeResolution, DisputeStatus, DistributionRule,
    NewDispute, NewDistributionRule, NewShift, PayoutStatus, PoolStatus, PoolUpsert, Shift,
    ShiftStatus, TipDispute, TipPayout, TipPool, TipPoolDetails, TipPoolSummary, UserPayout,
    WorkedShift,
};

use super::TipStore;

#[derive(Debug, Clone, Default)]
struct Sequences {
    shift: i64,
    order: i64,
    rule: i64,
    pool: i64,
    payout: i64,
    dispute: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<i64, String>,
    orders: BTreeMap<i64, ClosedOrder>,
    shifts: BTreeMap<i64, Shift>,
    rules: BTreeMap<i64, DistributionRule>,
    pools: BTreeMap<i64, TipPool>,
    payouts: BTreeMap<i64, TipPayout>,
    disputes: BTreeMap<i64, TipDispute>,
}

impl Tables {
    fn pool_mut(&mut self, pool_id: i64) -> StoreResult<&mut TipPool> {
        self.pools.get_mut(&pool_id).ok_or(StoreError::MissingRow {
            entity: "tip pool",
            id: pool_id,
        })
    }

    fn rule(&self, rule_id: Option<i64>) -> Option<&DistributionRule> {
        rule_id.and_then(|id| self.rules.get(&id))
    }

    fn payouts_of(&self, pool_id: i64) -> impl Iterator<Item = &TipPayout> {
        self.payouts.values().filter(move |p| p.tip_pool_id == pool_id)
    }
}

/// In-memory store.
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use tip_pool_engine::store::{MemoryStore, TipStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.add_user(7, "Avery Stone").await;
/// let tx = store.begin().await.unwrap();
/// store.commit(tx).await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

/// An open [`MemoryStore`] transaction.
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

impl std::fmt::Debug for MemoryTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTx")
            .field("pools", &self.work.pools.len())
            .field("payouts", &self.work.payouts.len())
            .finish()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a staff member's display name.
    pub async fn add_user(&self, user_id: i64, name: impl Into<String>) {
        self.tables.lock().await.users.insert(user_id, name.into());
    }

    /// Adds a closed order. An `id` of 0 is replaced by the next sequence value.
    pub async fn add_closed_order(&self, mut order: ClosedOrder) -> ClosedOrder {
        let mut tables = self.tables.lock().await;
        if order.id == 0 {
            order.id = next(&mut tables.seq.order);
        }
        tables.orders.insert(order.id, order.clone());
        order
    }

    /// Adds a shift in any status. An `id` of 0 is replaced by the next
    /// sequence value.
    pub async fn add_shift(&self, mut shift: Shift) -> Shift {
        let mut tables = self.tables.lock().await;
        if shift.id == 0 {
            shift.id = next(&mut tables.seq.shift);
        }
        tables.shifts.insert(shift.id, shift.clone());
        shift
    }

    /// Activates or deactivates a rule. Returns false if the rule is unknown.
    pub async fn set_rule_active(&self, rule_id: i64, is_active: bool) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.rules.get_mut(&rule_id) {
            Some(rule) => {
                rule.is_active = is_active;
                true
            }
            None => false,
        }
    }

    /// The pool for a date, read outside any transaction.
    pub async fn pool_by_date(&self, date: NaiveDate) -> Option<TipPool> {
        let tables = self.tables.lock().await;
        tables.pools.values().find(|p| p.shift_date == date).cloned()
    }

    /// Payouts owned by a pool, in insertion order.
    pub async fn payouts_for_pool(&self, pool_id: i64) -> Vec<TipPayout> {
        let tables = self.tables.lock().await;
        tables.payouts_of(pool_id).cloned().collect()
    }
}

#[async_trait]
impl TipStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }

    async fn commit(&self, tx: MemoryTx) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = tx;
        *guard = work;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }

    async fn find_active_rule(
        &self,
        tx: &mut MemoryTx,
        rule_id: i64,
    ) -> StoreResult<Option<DistributionRule>> {
        Ok(tx
            .work
            .rules
            .get(&rule_id)
            .filter(|rule| rule.is_active)
            .cloned())
    }

    async fn closed_orders_on(
        &self,
        tx: &mut MemoryTx,
        date: NaiveDate,
    ) -> StoreResult<Vec<ClosedOrder>> {
        Ok(tx
            .work
            .orders
            .values()
            .filter(|order| order.contributes_to(date))
            .cloned()
            .collect())
    }

    async fn completed_shifts_on(
        &self,
        tx: &mut MemoryTx,
        date: NaiveDate,
    ) -> StoreResult<Vec<WorkedShift>> {
        Ok(tx
            .work
            .shifts
            .values()
            .filter(|shift| shift.counts_toward(date))
            .filter_map(Shift::to_worked)
            .collect())
    }

    async fn pool_for_date(
        &self,
        tx: &mut MemoryTx,
        date: NaiveDate,
    ) -> StoreResult<Option<TipPool>> {
        Ok(tx
            .work
            .pools
            .values()
            .find(|pool| pool.shift_date == date)
            .cloned())
    }

    async fn pool_for_update(&self, tx: &mut MemoryTx, pool_id: i64) -> StoreResult<Option<TipPool>> {
        Ok(tx.work.pools.get(&pool_id).cloned())
    }

    async fn upsert_pool(&self, tx: &mut MemoryTx, upsert: &PoolUpsert) -> StoreResult<TipPool> {
        let tables = &mut tx.work;
        let existing = tables
            .pools
            .values()
            .find(|pool| pool.shift_date == upsert.shift_date)
            .map(|pool| pool.id);
        let id = match existing {
            Some(id) => id,
            None => next(&mut tables.seq.pool),
        };

        let pool = TipPool {
            id,
            shift_date: upsert.shift_date,
            total_tips: upsert.total_tips,
            total_orders: upsert.total_orders,
            distribution_rule_id: Some(upsert.distribution_rule_id),
            status: PoolStatus::Calculated,
            calculated_at: Some(upsert.calculated_at),
            calculated_by: Some(upsert.calculated_by),
            distributed_at: None,
            finalized_by: None,
        };
        tables.pools.insert(id, pool.clone());
        Ok(pool)
    }

    async fn delete_payouts(&self, tx: &mut MemoryTx, pool_id: i64) -> StoreResult<u64> {
        let tables = &mut tx.work;
        let before = tables.payouts.len();
        tables.payouts.retain(|_, payout| payout.tip_pool_id != pool_id);
        // disputes cascade with their payout
        let payouts = &tables.payouts;
        tables
            .disputes
            .retain(|_, dispute| payouts.contains_key(&dispute.tip_payout_id));
        Ok((before - tables.payouts.len()) as u64)
    }

    async fn insert_payout(
        &self,
        tx: &mut MemoryTx,
        pool_id: i64,
        payout: &ComputedPayout,
    ) -> StoreResult<TipPayout> {
        let rounded = round_for_storage(payout);
        let id = next(&mut tx.work.seq.payout);
        let row = TipPayout {
            id,
            tip_pool_id: pool_id,
            user_id: rounded.user_id,
            shift_id: rounded.shift_id,
            base_amount: rounded.base_amount,
            bonus_amount: rounded.bonus_amount,
            total_amount: rounded.total_amount,
            hours_worked: rounded.hours_worked,
            role: rounded.role,
            percentage_share: rounded.percentage_share,
            calculation_details: rounded.calculation_details,
            status: PayoutStatus::Pending,
            created_at: Utc::now(),
        };
        tx.work.payouts.insert(id, row.clone());
        Ok(row)
    }

    async fn finalize_pool(
        &self,
        tx: &mut MemoryTx,
        pool_id: i64,
        finalized_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<TipPool> {
        let pool = tx.work.pool_mut(pool_id)?;
        pool.status = PoolStatus::Finalized;
        pool.distributed_at = Some(at);
        pool.finalized_by = Some(finalized_by);
        Ok(pool.clone())
    }

    async fn approve_pending_payouts(&self, tx: &mut MemoryTx, pool_id: i64) -> StoreResult<u64> {
        let mut approved = 0;
        for payout in tx.work.payouts.values_mut() {
            if payout.tip_pool_id == pool_id && payout.status == PayoutStatus::Pending {
                payout.status = PayoutStatus::Approved;
                approved += 1;
            }
        }
        Ok(approved)
    }

    async fn payout_by_id(
        &self,
        tx: &mut MemoryTx,
        payout_id: i64,
    ) -> StoreResult<Option<TipPayout>> {
        Ok(tx.work.payouts.get(&payout_id).cloned())
    }

    async fn insert_dispute(
        &self,
        tx: &mut MemoryTx,
        dispute: &NewDispute,
        at: DateTime<Utc>,
    ) -> StoreResult<TipDispute> {
        let id = next(&mut tx.work.seq.dispute);
        let row = TipDispute {
            id,
            tip_payout_id: dispute.tip_payout_id,
            user_id: dispute.user_id,
            reason: dispute.reason.clone(),
            status: DisputeStatus::Open,
            resolution_notes: None,
            resolved_by: None,
            created_at: at,
            resolved_at: None,
        };
        tx.work.disputes.insert(id, row.clone());
        Ok(row)
    }

    async fn dispute_for_update(
        &self,
        tx: &mut MemoryTx,
        dispute_id: i64,
    ) -> StoreResult<Option<TipDispute>> {
        Ok(tx.work.disputes.get(&dispute_id).cloned())
    }

    async fn close_dispute(
        &self,
        tx: &mut MemoryTx,
        dispute_id: i64,
        resolution: &DisputeResolution,
        at: DateTime<Utc>,
    ) -> StoreResult<TipDispute> {
        let dispute = tx
            .work
            .disputes
            .get_mut(&dispute_id)
            .ok_or(StoreError::MissingRow {
                entity: "tip dispute",
                id: dispute_id,
            })?;
        dispute.status = resolution.outcome.into();
        dispute.resolution_notes = resolution.notes.clone();
        dispute.resolved_by = Some(resolution.resolved_by);
        dispute.resolved_at = Some(at);
        Ok(dispute.clone())
    }

    async fn pool_summaries(
        &self,
        range: DateRange,
        user_id: Option<i64>,
    ) -> StoreResult<Vec<TipPoolSummary>> {
        let tables = self.tables.lock().await;
        let mut summaries: Vec<TipPoolSummary> = tables
            .pools
            .values()
            .filter(|pool| range.contains(pool.shift_date))
            .filter(|pool| {
                user_id.is_none_or(|user| tables.payouts_of(pool.id).any(|p| p.user_id == user))
            })
            .map(|pool| {
                let rule = tables.rule(pool.distribution_rule_id);
                let (payout_count, total_distributed) = tables
                    .payouts_of(pool.id)
                    .fold((0i64, Decimal::ZERO), |(count, sum), p| {
                        (count + 1, sum + p.total_amount)
                    });
                TipPoolSummary {
                    pool: pool.clone(),
                    rule_name: rule.map(|r| r.name.clone()),
                    rule_description: rule.and_then(|r| r.description.clone()),
                    payout_count,
                    total_distributed,
                    finalized_by_name: pool
                        .finalized_by
                        .and_then(|id| tables.users.get(&id).cloned()),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.pool.shift_date.cmp(&a.pool.shift_date));
        Ok(summaries)
    }

    async fn user_payouts(&self, user_id: i64, range: DateRange) -> StoreResult<Vec<UserPayout>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<UserPayout> = tables
            .payouts
            .values()
            .filter(|payout| payout.user_id == user_id)
            .filter_map(|payout| {
                let pool = tables.pools.get(&payout.tip_pool_id)?;
                if !range.contains(pool.shift_date) {
                    return None;
                }
                Some(UserPayout {
                    payout: payout.clone(),
                    shift_date: pool.shift_date,
                    pool_total_tips: pool.total_tips,
                    pool_status: pool.status,
                    rule_name: tables
                        .rule(pool.distribution_rule_id)
                        .map(|r| r.name.clone()),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.shift_date
                .cmp(&a.shift_date)
                .then(a.payout.id.cmp(&b.payout.id))
        });
        Ok(rows)
    }

    async fn pool_details(&self, pool_id: i64) -> StoreResult<Option<TipPoolDetails>> {
        let tables = self.tables.lock().await;
        Ok(tables.pools.get(&pool_id).map(|pool| TipPoolDetails {
            pool: pool.clone(),
            rule_name: tables
                .rule(pool.distribution_rule_id)
                .map(|r| r.name.clone()),
            payouts: tables.payouts_of(pool_id).cloned().collect(),
        }))
    }

    async fn count_payouts(&self, pool_id: i64) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.payouts_of(pool_id).count() as i64)
    }

    async fn disputes_for_pool(&self, pool_id: i64) -> StoreResult<Vec<TipDispute>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .disputes
            .values()
            .filter(|dispute| {
                tables
                    .payouts
                    .get(&dispute.tip_payout_id)
                    .is_some_and(|p| p.tip_pool_id == pool_id)
            })
            .cloned()
            .collect())
    }

    async fn insert_rule(
        &self,
        rule: &NewDistributionRule,
        at: DateTime<Utc>,
    ) -> StoreResult<DistributionRule> {
        let mut tables = self.tables.lock().await;
        let id = next(&mut tables.seq.rule);
        let row = DistributionRule {
            id,
            name: rule.name.clone(),
            description: rule.description.clone(),
            rules: rule.rules.clone(),
            is_active: true,
            created_by: rule.created_by,
            created_at: at,
        };
        tables.rules.insert(id, row.clone());
        Ok(row)
    }

    async fn active_rules(&self) -> StoreResult<Vec<DistributionRule>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rules
            .values()
            .filter(|rule| rule.is_active)
            .cloned()
            .collect())
    }

    async fn insert_shift(&self, shift: &NewShift, hours_worked: Decimal) -> StoreResult<Shift> {
        let mut tables = self.tables.lock().await;
        let id = next(&mut tables.seq.shift);
        let row = Shift {
            id,
            user_id: shift.user_id,
            role: shift.role.clone(),
            location: shift.location.clone(),
            start_time: shift.start_time,
            end_time: Some(shift.end_time),
            hours_worked: Some(hours_worked),
            status: ShiftStatus::Completed,
        };
        tables.shifts.insert(id, row.clone());
        Ok(row)
    }
}
