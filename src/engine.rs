//! The tip pool engine.
//!
//! [`TipPoolEngine`] ties the pure calculation in [`crate::calculation`] to a
//! [`TipStore`]. Calculation and finalization each run in one store
//! transaction: either every write lands or none does, and the error that
//! caused a rollback is returned unchanged.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{calculate_payouts, round_currency};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationSummary, DateRange, DisputeResolution, DistributionRule, FinalizeOutcome,
    NewDispute, NewDistributionRule, NewShift, PoolCalculation, PoolUpsert, RulesDocument, Shift,
    TipDispute, TipPoolDetails, TipPoolSummary, TipTotals, UserPayout,
};
use crate::notify::{Notifier, NullNotifier, PoolEvent};
use crate::store::TipStore;

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Reject recalculation of a finalized pool instead of reopening it.
    #[serde(default)]
    pub lock_finalized_pools: bool,
}

/// Calculates, stores, and finalizes daily tip pools.
///
/// # Example
///
/// ```
/// use tip_pool_engine::engine::{EngineSettings, TipPoolEngine};
/// use tip_pool_engine::models::NewDistributionRule;
/// use tip_pool_engine::notify::NullNotifier;
/// use tip_pool_engine::store::MemoryStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let engine = TipPoolEngine::new(MemoryStore::new(), NullNotifier, EngineSettings::default());
/// let rule = engine
///     .create_distribution_rule(NewDistributionRule {
///         name: "Hours weighted".into(),
///         description: None,
///         rules: serde_json::json!({ "default": { "method": "hours_weighted" } }),
///         created_by: Some(1),
///     })
///     .await
///     .unwrap();
/// assert!(rule.is_active);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TipPoolEngine<S, N = NullNotifier> {
    store: S,
    notifier: N,
    settings: EngineSettings,
}

impl<S: TipStore, N: Notifier> TipPoolEngine<S, N> {
    /// Creates an engine over `store`, publishing to `notifier`.
    pub fn new(store: S, notifier: N, settings: EngineSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    // ── Calculation ──────────────────────────────────────────────────────────

    /// Calculates (or recalculates) the pool for `date` with the given rule.
    ///
    /// Existing payouts for the date are replaced. On any error nothing is
    /// persisted and a previously stored pool is left as it was.
    ///
    /// # Errors
    ///
    /// * [`EngineError::RuleNotFound`] if the rule is missing or inactive
    /// * [`EngineError::NoTipsForDate`] if no closed order carries a tip
    /// * [`EngineError::NoShiftsForDate`] if no shift was completed
    /// * [`EngineError::PoolFinalized`] if the pool is finalized and
    ///   `lock_finalized_pools` is set
    /// * [`EngineError::InvalidDistributionRule`] if a role's policy cannot be
    ///   applied
    pub async fn calculate_tip_pool(
        &self,
        date: NaiveDate,
        distribution_rule_id: i64,
        calculated_by: i64,
    ) -> EngineResult<PoolCalculation> {
        let calculation_id = Uuid::new_v4();
        info!(
            calculation_id = %calculation_id,
            shift_date = %date,
            distribution_rule_id,
            calculated_by,
            "Calculating tip pool"
        );

        let mut tx = self.store.begin().await?;
        let result = self
            .calculate_in(&mut tx, calculation_id, date, distribution_rule_id, calculated_by)
            .await;
        let calculation = match result {
            Ok(calculation) => {
                self.store.commit(tx).await?;
                calculation
            }
            Err(err) => {
                self.abort(tx, calculation_id, &err).await;
                return Err(err);
            }
        };

        info!(
            calculation_id = %calculation_id,
            pool_id = calculation.pool.id,
            shift_date = %date,
            total_tips = %calculation.summary.total_tips,
            total_distributed = %calculation.summary.total_distributed,
            payouts = calculation.payouts.len(),
            "Tip pool calculated"
        );
        self.notifier.publish(PoolEvent::PoolCalculated {
            calculation_id,
            pool_id: calculation.pool.id,
            shift_date: date,
            total_tips: calculation.pool.total_tips,
            payout_count: calculation.payouts.len(),
        });
        Ok(calculation)
    }

    async fn calculate_in(
        &self,
        tx: &mut S::Tx,
        calculation_id: Uuid,
        date: NaiveDate,
        rule_id: i64,
        calculated_by: i64,
    ) -> EngineResult<PoolCalculation> {
        let rule = self
            .store
            .find_active_rule(tx, rule_id)
            .await?
            .ok_or(EngineError::RuleNotFound { rule_id })?;

        let orders = self.store.closed_orders_on(tx, date).await?;
        let totals = TipTotals::from_orders(&orders);
        if totals.total_tips <= Decimal::ZERO {
            return Err(EngineError::NoTipsForDate { date });
        }

        let shifts = self.store.completed_shifts_on(tx, date).await?;
        if shifts.is_empty() {
            return Err(EngineError::NoShiftsForDate { date });
        }

        if let Some(existing) = self.store.pool_for_date(tx, date).await? {
            if existing.is_finalized() {
                if self.settings.lock_finalized_pools {
                    return Err(EngineError::PoolFinalized {
                        pool_id: existing.id,
                        date,
                    });
                }
                warn!(
                    calculation_id = %calculation_id,
                    pool_id = existing.id,
                    shift_date = %date,
                    "Recalculating a finalized pool; approved payouts will be replaced"
                );
            }
        }

        let document = rule.document();
        log_diagnostics(calculation_id, &rule, &document);

        // computed before the first write
        let computed = calculate_payouts(&shifts, totals.total_tips, &document)?;
        let allocated: Decimal = computed.iter().map(|p| p.total_amount).sum();
        if round_currency(allocated) != round_currency(totals.total_tips) {
            warn!(
                calculation_id = %calculation_id,
                rule_id,
                total_tips = %totals.total_tips,
                allocated = %allocated,
                "Distribution rule does not allocate exactly the pool total"
            );
        }

        let pool = self
            .store
            .upsert_pool(
                tx,
                &PoolUpsert {
                    shift_date: date,
                    total_tips: totals.total_tips,
                    total_orders: totals.total_orders,
                    distribution_rule_id: rule.id,
                    calculated_at: Utc::now(),
                    calculated_by,
                },
            )
            .await?;

        let removed = self.store.delete_payouts(tx, pool.id).await?;
        if removed > 0 {
            debug!(calculation_id = %calculation_id, pool_id = pool.id, removed, "Replaced payouts");
        }

        let mut payouts = Vec::with_capacity(computed.len());
        for payout in &computed {
            payouts.push(self.store.insert_payout(tx, pool.id, payout).await?);
        }

        let total_distributed = payouts.iter().map(|p| p.total_amount).sum();
        let summary = CalculationSummary {
            calculation_id,
            total_tips: totals.total_tips,
            total_orders: totals.total_orders,
            total_staff: shifts.len(),
            distribution_rule: rule.name,
            total_distributed,
        };

        Ok(PoolCalculation {
            pool,
            payouts,
            summary,
        })
    }

    /// Finalizes a pool and approves its pending payouts.
    ///
    /// Finalizing an already finalized pool writes nothing and reports
    /// success with `already_finalized` set.
    pub async fn finalize_tip_pool(
        &self,
        tip_pool_id: i64,
        finalized_by: i64,
    ) -> EngineResult<FinalizeOutcome> {
        let mut tx = self.store.begin().await?;
        let operation_id = Uuid::new_v4();

        let result = self.finalize_in(&mut tx, tip_pool_id, finalized_by).await;
        let outcome = match result {
            Ok(outcome) => {
                self.store.commit(tx).await?;
                outcome
            }
            Err(err) => {
                self.abort(tx, operation_id, &err).await;
                return Err(err);
            }
        };

        if outcome.already_finalized {
            info!(pool_id = tip_pool_id, finalized_by, "Tip pool already finalized");
            return Ok(outcome);
        }

        info!(
            pool_id = tip_pool_id,
            shift_date = %outcome.pool.shift_date,
            finalized_by,
            approved_payouts = outcome.approved_payouts,
            "Tip pool finalized"
        );
        if let Some(finalized_at) = outcome.pool.distributed_at {
            self.notifier.publish(PoolEvent::PoolFinalized {
                pool_id: tip_pool_id,
                shift_date: outcome.pool.shift_date,
                finalized_by,
                finalized_at,
                approved_payouts: outcome.approved_payouts,
            });
        }
        Ok(outcome)
    }

    async fn finalize_in(
        &self,
        tx: &mut S::Tx,
        pool_id: i64,
        finalized_by: i64,
    ) -> EngineResult<FinalizeOutcome> {
        let pool = self
            .store
            .pool_for_update(tx, pool_id)
            .await?
            .ok_or(EngineError::PoolNotFound { pool_id })?;

        if pool.is_finalized() {
            return Ok(FinalizeOutcome {
                success: true,
                pool,
                approved_payouts: 0,
                already_finalized: true,
            });
        }

        let pool = self
            .store
            .finalize_pool(tx, pool_id, finalized_by, Utc::now())
            .await?;
        let approved_payouts = self.store.approve_pending_payouts(tx, pool_id).await?;

        Ok(FinalizeOutcome {
            success: true,
            pool,
            approved_payouts,
            already_finalized: false,
        })
    }

    async fn abort(&self, tx: S::Tx, operation_id: Uuid, err: &EngineError) {
        warn!(operation_id = %operation_id, error = %err, "Rolling back");
        if let Err(rollback_err) = self.store.rollback(tx).await {
            warn!(
                operation_id = %operation_id,
                error = %rollback_err,
                "Rollback failed; the transaction is discarded with its connection"
            );
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Pools whose date lies in `[start_date, end_date]`, newest first.
    ///
    /// With `user_id`, only pools in which that user holds a payout.
    pub async fn get_tip_pool_summary(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        user_id: Option<i64>,
    ) -> EngineResult<Vec<TipPoolSummary>> {
        check_range(Some(start_date), Some(end_date))?;
        let summaries = self
            .store
            .pool_summaries(DateRange::between(start_date, end_date), user_id)
            .await?;
        Ok(summaries)
    }

    /// A user's payouts, optionally limited to pool dates in a range.
    pub async fn get_user_payouts(
        &self,
        user_id: i64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> EngineResult<Vec<UserPayout>> {
        check_range(start_date, end_date)?;
        let range = DateRange {
            start: start_date,
            end: end_date,
        };
        Ok(self.store.user_payouts(user_id, range).await?)
    }

    /// A pool with its payouts.
    pub async fn get_tip_pool(&self, tip_pool_id: i64) -> EngineResult<TipPoolDetails> {
        self.store
            .pool_details(tip_pool_id)
            .await?
            .ok_or(EngineError::PoolNotFound {
                pool_id: tip_pool_id,
            })
    }

    /// Number of payouts a pool owns.
    pub async fn count_payouts(&self, tip_pool_id: i64) -> EngineResult<i64> {
        Ok(self.store.count_payouts(tip_pool_id).await?)
    }

    // ── Rules and shifts ─────────────────────────────────────────────────────

    /// Stores a new active distribution rule.
    ///
    /// The document is stored verbatim and only interpreted when a pool is
    /// calculated. Diagnostics found now are logged, never rejected.
    pub async fn create_distribution_rule(
        &self,
        rule: NewDistributionRule,
    ) -> EngineResult<DistributionRule> {
        let document = RulesDocument::from_value(&rule.rules);
        for diagnostic in document.diagnostics() {
            warn!(
                rule_name = %rule.name,
                code = %diagnostic.code,
                "{}",
                diagnostic.message
            );
        }

        let stored = self.store.insert_rule(&rule, Utc::now()).await?;
        info!(rule_id = stored.id, rule_name = %stored.name, "Distribution rule created");
        Ok(stored)
    }

    /// Active distribution rules.
    pub async fn get_distribution_rules(&self) -> EngineResult<Vec<DistributionRule>> {
        Ok(self.store.active_rules().await?)
    }

    /// Records a completed shift, deriving hours from its clock times.
    pub async fn record_shift(&self, shift: NewShift) -> EngineResult<Shift> {
        let hours_worked = shift.validate()?;
        let stored = self.store.insert_shift(&shift, hours_worked).await?;
        debug!(
            shift_id = stored.id,
            user_id = stored.user_id,
            role = %stored.role,
            hours_worked = %hours_worked,
            "Shift recorded"
        );
        Ok(stored)
    }

    // ── Disputes ─────────────────────────────────────────────────────────────

    /// Opens a dispute against a payout.
    pub async fn open_dispute(
        &self,
        tip_payout_id: i64,
        user_id: i64,
        reason: impl Into<String>,
    ) -> EngineResult<TipDispute> {
        let dispute = NewDispute {
            tip_payout_id,
            user_id,
            reason: reason.into(),
        };

        let mut tx = self.store.begin().await?;
        let operation_id = Uuid::new_v4();
        let result = self.open_dispute_in(&mut tx, &dispute).await;

        match result {
            Ok(opened) => {
                self.store.commit(tx).await?;
                info!(
                    dispute_id = opened.id,
                    payout_id = tip_payout_id,
                    user_id,
                    "Tip dispute opened"
                );
                Ok(opened)
            }
            Err(err) => {
                self.abort(tx, operation_id, &err).await;
                Err(err)
            }
        }
    }

    /// Closes an open dispute with an outcome. Payout amounts are unchanged.
    pub async fn resolve_dispute(
        &self,
        dispute_id: i64,
        resolution: DisputeResolution,
    ) -> EngineResult<TipDispute> {
        let mut tx = self.store.begin().await?;
        let operation_id = Uuid::new_v4();
        let result = self.resolve_dispute_in(&mut tx, dispute_id, &resolution).await;

        match result {
            Ok(closed) => {
                self.store.commit(tx).await?;
                info!(
                    dispute_id,
                    status = closed.status.as_str(),
                    resolved_by = resolution.resolved_by,
                    "Tip dispute closed"
                );
                Ok(closed)
            }
            Err(err) => {
                self.abort(tx, operation_id, &err).await;
                Err(err)
            }
        }
    }

    async fn open_dispute_in(&self, tx: &mut S::Tx, dispute: &NewDispute) -> EngineResult<TipDispute> {
        let payout_id = dispute.tip_payout_id;
        self.store
            .payout_by_id(tx, payout_id)
            .await?
            .ok_or(EngineError::PayoutNotFound { payout_id })?;
        Ok(self.store.insert_dispute(tx, dispute, Utc::now()).await?)
    }

    async fn resolve_dispute_in(
        &self,
        tx: &mut S::Tx,
        dispute_id: i64,
        resolution: &DisputeResolution,
    ) -> EngineResult<TipDispute> {
        let current = self
            .store
            .dispute_for_update(tx, dispute_id)
            .await?
            .ok_or(EngineError::DisputeNotFound { dispute_id })?;
        if !current.status.is_open() {
            return Err(EngineError::DisputeClosed { dispute_id });
        }
        Ok(self
            .store
            .close_dispute(tx, dispute_id, resolution, Utc::now())
            .await?)
    }

    /// Disputes raised against a pool's payouts.
    pub async fn list_disputes(&self, tip_pool_id: i64) -> EngineResult<Vec<TipDispute>> {
        Ok(self.store.disputes_for_pool(tip_pool_id).await?)
    }
}

fn check_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> EngineResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(EngineError::InvalidDateRange { start, end }),
        _ => Ok(()),
    }
}

fn log_diagnostics(calculation_id: Uuid, rule: &DistributionRule, document: &RulesDocument) {
    for diagnostic in document.diagnostics() {
        warn!(
            calculation_id = %calculation_id,
            rule_id = rule.id,
            code = %diagnostic.code,
            "{}",
            diagnostic.message
        );
    }
}
