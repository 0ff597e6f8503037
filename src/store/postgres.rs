//! PostgreSQL [`TipStore`] backend.
//!
//! Queries are built at runtime with `query_as` so the crate compiles without
//! a live database. Row structs mirror the table layout in
//! `migrations/0001_tip_pools.sql` and convert into the domain models,
//! failing with [`StoreError::Decode`] on unexpected enum text.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, Transaction};
use tracing::info;

use crate::calculation::round_for_storage;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    CalculationDetails, ClosedOrder, ComputedPayout, DateRange, DisputeResolution, DisputeStatus,
    DistributionRule, NewDispute, NewDistributionRule, NewShift, PayoutStatus, PoolStatus,
    PoolUpsert, Shift, ShiftStatus, TipDispute, TipPayout, TipPool, TipPoolDetails,
    TipPoolSummary, UserPayout, WorkedShift, hours_between,
};

use super::TipStore;

const POOL_COLUMNS: &str = "id, shift_date, total_tips, total_orders, distribution_rule_id, \
     status, calculated_at, calculated_by, distributed_at, finalized_by";

const PAYOUT_COLUMNS: &str = "id, tip_pool_id, user_id, shift_id, base_amount, bonus_amount, \
     total_amount, hours_worked, role, percentage_share, calculation_details, status, created_at";

const DISPUTE_COLUMNS: &str = "id, tip_payout_id, user_id, reason, status, resolution_notes, \
     resolved_by, created_at, resolved_at";

const RULE_COLUMNS: &str = "id, name, description, rules, is_active, created_by, created_at";

fn parse_status<T>(entity: &'static str, raw: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
        .map_err(|message| StoreError::Decode { entity, message })
}

// ── Row types ────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct PoolRow {
    id: i64,
    shift_date: NaiveDate,
    total_tips: Decimal,
    total_orders: i64,
    distribution_rule_id: Option<i64>,
    status: String,
    calculated_at: Option<DateTime<Utc>>,
    calculated_by: Option<i64>,
    distributed_at: Option<DateTime<Utc>>,
    finalized_by: Option<i64>,
}

impl TryFrom<PoolRow> for TipPool {
    type Error = StoreError;

    fn try_from(row: PoolRow) -> StoreResult<Self> {
        Ok(TipPool {
            id: row.id,
            shift_date: row.shift_date,
            total_tips: row.total_tips,
            total_orders: row.total_orders,
            distribution_rule_id: row.distribution_rule_id,
            status: parse_status::<PoolStatus>("tip pool", &row.status)?,
            calculated_at: row.calculated_at,
            calculated_by: row.calculated_by,
            distributed_at: row.distributed_at,
            finalized_by: row.finalized_by,
        })
    }
}

#[derive(Debug, FromRow)]
struct PayoutRow {
    id: i64,
    tip_pool_id: i64,
    user_id: i64,
    shift_id: i64,
    base_amount: Decimal,
    bonus_amount: Decimal,
    total_amount: Decimal,
    hours_worked: Decimal,
    role: String,
    percentage_share: Decimal,
    calculation_details: Json<CalculationDetails>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PayoutRow> for TipPayout {
    type Error = StoreError;

    fn try_from(row: PayoutRow) -> StoreResult<Self> {
        Ok(TipPayout {
            id: row.id,
            tip_pool_id: row.tip_pool_id,
            user_id: row.user_id,
            shift_id: row.shift_id,
            base_amount: row.base_amount,
            bonus_amount: row.bonus_amount,
            total_amount: row.total_amount,
            hours_worked: row.hours_worked,
            role: row.role,
            percentage_share: row.percentage_share,
            calculation_details: row.calculation_details.0,
            status: parse_status::<PayoutStatus>("tip payout", &row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DisputeRow {
    id: i64,
    tip_payout_id: i64,
    user_id: i64,
    reason: String,
    status: String,
    resolution_notes: Option<String>,
    resolved_by: Option<i64>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<DisputeRow> for TipDispute {
    type Error = StoreError;

    fn try_from(row: DisputeRow) -> StoreResult<Self> {
        Ok(TipDispute {
            id: row.id,
            tip_payout_id: row.tip_payout_id,
            user_id: row.user_id,
            reason: row.reason,
            status: parse_status::<DisputeStatus>("tip dispute", &row.status)?,
            resolution_notes: row.resolution_notes,
            resolved_by: row.resolved_by,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RuleRow {
    id: i64,
    name: String,
    description: Option<String>,
    rules: Json<serde_json::Value>,
    is_active: bool,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<RuleRow> for DistributionRule {
    fn from(row: RuleRow) -> Self {
        DistributionRule {
            id: row.id,
            name: row.name,
            description: row.description,
            rules: row.rules.0,
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct WorkedShiftRow {
    id: i64,
    user_id: i64,
    role: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
}

#[derive(Debug, FromRow)]
struct ShiftRow {
    id: i64,
    user_id: i64,
    role: String,
    location: Option<String>,
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    hours_worked: Option<Decimal>,
    status: String,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = StoreError;

    fn try_from(row: ShiftRow) -> StoreResult<Self> {
        Ok(Shift {
            id: row.id,
            user_id: row.user_id,
            role: row.role,
            location: row.location,
            start_time: row.start_time,
            end_time: row.end_time,
            hours_worked: row.hours_worked,
            status: parse_status::<ShiftStatus>("shift", &row.status)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    server_id: Option<i64>,
    tip_amount: Decimal,
    closed_at: NaiveDateTime,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    pool: PoolRow,
    rule_name: Option<String>,
    rule_description: Option<String>,
    payout_count: i64,
    total_distributed: Decimal,
    finalized_by_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct UserPayoutRow {
    #[sqlx(flatten)]
    payout: PayoutRow,
    shift_date: NaiveDate,
    pool_total_tips: Decimal,
    pool_status: String,
    rule_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct DetailsRow {
    #[sqlx(flatten)]
    pool: PoolRow,
    rule_name: Option<String>,
}

// ── Store ────────────────────────────────────────────────────────────────────

/// PostgreSQL store backed by an `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn payouts_of(&self, pool_id: i64) -> StoreResult<Vec<TipPayout>> {
        let rows = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM tip_payouts WHERE tip_pool_id = $1 ORDER BY id"
        ))
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TipPayout::try_from).collect()
    }
}

#[async_trait]
impl TipStore for PgStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.rollback().await?;
        Ok(())
    }

    async fn find_active_rule(
        &self,
        tx: &mut Self::Tx,
        rule_id: i64,
    ) -> StoreResult<Option<DistributionRule>> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM tip_distribution_rules WHERE id = $1 AND is_active"
        ))
        .bind(rule_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(DistributionRule::from))
    }

    async fn closed_orders_on(
        &self,
        tx: &mut Self::Tx,
        date: NaiveDate,
    ) -> StoreResult<Vec<ClosedOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"SELECT id, server_id, tip_amount, closed_at
               FROM orders
               WHERE status = 'closed'
                 AND closed_at IS NOT NULL
                 AND closed_at::date = $1
                 AND tip_amount > 0
               ORDER BY id"#,
        )
        .bind(date)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| ClosedOrder {
                id: row.id,
                server_id: row.server_id,
                tip_amount: row.tip_amount,
                closed_at: row.closed_at,
            })
            .collect())
    }

    async fn completed_shifts_on(
        &self,
        tx: &mut Self::Tx,
        date: NaiveDate,
    ) -> StoreResult<Vec<WorkedShift>> {
        let rows = sqlx::query_as::<_, WorkedShiftRow>(
            r#"SELECT id, user_id, role, start_time, end_time
               FROM shifts
               WHERE status = 'completed'
                 AND end_time IS NOT NULL
                 AND start_time::date = $1
               ORDER BY id"#,
        )
        .bind(date)
        .fetch_all(&mut **tx)
        .await?;
        // hours come from the clock times, never the stored column
        Ok(rows
            .into_iter()
            .map(|row| WorkedShift {
                shift_id: row.id,
                user_id: row.user_id,
                role: row.role,
                hours_worked: hours_between(row.start_time, row.end_time),
            })
            .collect())
    }

    async fn pool_for_date(
        &self,
        tx: &mut Self::Tx,
        date: NaiveDate,
    ) -> StoreResult<Option<TipPool>> {
        let row = sqlx::query_as::<_, PoolRow>(&format!(
            "SELECT {POOL_COLUMNS} FROM tip_pools WHERE shift_date = $1 FOR UPDATE"
        ))
        .bind(date)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(TipPool::try_from).transpose()
    }

    async fn pool_for_update(&self, tx: &mut Self::Tx, pool_id: i64) -> StoreResult<Option<TipPool>> {
        let row = sqlx::query_as::<_, PoolRow>(&format!(
            "SELECT {POOL_COLUMNS} FROM tip_pools WHERE id = $1 FOR UPDATE"
        ))
        .bind(pool_id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(TipPool::try_from).transpose()
    }

    async fn upsert_pool(&self, tx: &mut Self::Tx, upsert: &PoolUpsert) -> StoreResult<TipPool> {
        let row = sqlx::query_as::<_, PoolRow>(&format!(
            r#"INSERT INTO tip_pools
                   (shift_date, total_tips, total_orders, distribution_rule_id,
                    status, calculated_at, calculated_by)
               VALUES ($1, $2, $3, $4, 'calculated', $5, $6)
               ON CONFLICT (shift_date) DO UPDATE SET
                   total_tips = EXCLUDED.total_tips,
                   total_orders = EXCLUDED.total_orders,
                   distribution_rule_id = EXCLUDED.distribution_rule_id,
                   status = 'calculated',
                   calculated_at = EXCLUDED.calculated_at,
                   calculated_by = EXCLUDED.calculated_by,
                   distributed_at = NULL,
                   finalized_by = NULL
               RETURNING {POOL_COLUMNS}"#
        ))
        .bind(upsert.shift_date)
        .bind(upsert.total_tips)
        .bind(upsert.total_orders)
        .bind(upsert.distribution_rule_id)
        .bind(upsert.calculated_at)
        .bind(upsert.calculated_by)
        .fetch_one(&mut **tx)
        .await?;
        TipPool::try_from(row)
    }

    async fn delete_payouts(&self, tx: &mut Self::Tx, pool_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM tip_payouts WHERE tip_pool_id = $1")
            .bind(pool_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_payout(
        &self,
        tx: &mut Self::Tx,
        pool_id: i64,
        payout: &ComputedPayout,
    ) -> StoreResult<TipPayout> {
        let rounded = round_for_storage(payout);
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            r#"INSERT INTO tip_payouts
                   (tip_pool_id, user_id, shift_id, base_amount, bonus_amount, total_amount,
                    hours_worked, role, percentage_share, calculation_details, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
               RETURNING {PAYOUT_COLUMNS}"#
        ))
        .bind(pool_id)
        .bind(rounded.user_id)
        .bind(rounded.shift_id)
        .bind(rounded.base_amount)
        .bind(rounded.bonus_amount)
        .bind(rounded.total_amount)
        .bind(rounded.hours_worked)
        .bind(&rounded.role)
        .bind(rounded.percentage_share)
        .bind(Json(&rounded.calculation_details))
        .fetch_one(&mut **tx)
        .await?;
        TipPayout::try_from(row)
    }

    async fn finalize_pool(
        &self,
        tx: &mut Self::Tx,
        pool_id: i64,
        finalized_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<TipPool> {
        let row = sqlx::query_as::<_, PoolRow>(&format!(
            r#"UPDATE tip_pools
               SET status = 'finalized', distributed_at = $2, finalized_by = $3
               WHERE id = $1
               RETURNING {POOL_COLUMNS}"#
        ))
        .bind(pool_id)
        .bind(at)
        .bind(finalized_by)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::MissingRow {
            entity: "tip pool",
            id: pool_id,
        })?;
        TipPool::try_from(row)
    }

    async fn approve_pending_payouts(&self, tx: &mut Self::Tx, pool_id: i64) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE tip_payouts SET status = 'approved' WHERE tip_pool_id = $1 AND status = 'pending'",
        )
        .bind(pool_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn payout_by_id(
        &self,
        tx: &mut Self::Tx,
        payout_id: i64,
    ) -> StoreResult<Option<TipPayout>> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM tip_payouts WHERE id = $1"
        ))
        .bind(payout_id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(TipPayout::try_from).transpose()
    }

    async fn insert_dispute(
        &self,
        tx: &mut Self::Tx,
        dispute: &NewDispute,
        at: DateTime<Utc>,
    ) -> StoreResult<TipDispute> {
        let row = sqlx::query_as::<_, DisputeRow>(&format!(
            r#"INSERT INTO tip_disputes (tip_payout_id, user_id, reason, status, created_at)
               VALUES ($1, $2, $3, 'open', $4)
               RETURNING {DISPUTE_COLUMNS}"#
        ))
        .bind(dispute.tip_payout_id)
        .bind(dispute.user_id)
        .bind(&dispute.reason)
        .bind(at)
        .fetch_one(&mut **tx)
        .await?;
        TipDispute::try_from(row)
    }

    async fn dispute_for_update(
        &self,
        tx: &mut Self::Tx,
        dispute_id: i64,
    ) -> StoreResult<Option<TipDispute>> {
        let row = sqlx::query_as::<_, DisputeRow>(&format!(
            "SELECT {DISPUTE_COLUMNS} FROM tip_disputes WHERE id = $1 FOR UPDATE"
        ))
        .bind(dispute_id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(TipDispute::try_from).transpose()
    }

    async fn close_dispute(
        &self,
        tx: &mut Self::Tx,
        dispute_id: i64,
        resolution: &DisputeResolution,
        at: DateTime<Utc>,
    ) -> StoreResult<TipDispute> {
        let status: DisputeStatus = resolution.outcome.into();
        let row = sqlx::query_as::<_, DisputeRow>(&format!(
            r#"UPDATE tip_disputes
               SET status = $2, resolution_notes = $3, resolved_by = $4, resolved_at = $5
               WHERE id = $1
               RETURNING {DISPUTE_COLUMNS}"#
        ))
        .bind(dispute_id)
        .bind(status.as_str())
        .bind(&resolution.notes)
        .bind(resolution.resolved_by)
        .bind(at)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::MissingRow {
            entity: "tip dispute",
            id: dispute_id,
        })?;
        TipDispute::try_from(row)
    }

    async fn pool_summaries(
        &self,
        range: DateRange,
        user_id: Option<i64>,
    ) -> StoreResult<Vec<TipPoolSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"SELECT p.id, p.shift_date, p.total_tips, p.total_orders, p.distribution_rule_id,
                      p.status, p.calculated_at, p.calculated_by, p.distributed_at, p.finalized_by,
                      r.name AS rule_name,
                      r.description AS rule_description,
                      COUNT(tp.id) AS payout_count,
                      COALESCE(SUM(tp.total_amount), 0) AS total_distributed,
                      u.full_name AS finalized_by_name
               FROM tip_pools p
               LEFT JOIN tip_distribution_rules r ON r.id = p.distribution_rule_id
               LEFT JOIN tip_payouts tp ON tp.tip_pool_id = p.id
               LEFT JOIN users u ON u.id = p.finalized_by
               WHERE ($1::date IS NULL OR p.shift_date >= $1)
                 AND ($2::date IS NULL OR p.shift_date <= $2)
                 AND ($3::bigint IS NULL OR EXISTS (
                        SELECT 1 FROM tip_payouts mine
                        WHERE mine.tip_pool_id = p.id AND mine.user_id = $3))
               GROUP BY p.id, r.name, r.description, u.full_name
               ORDER BY p.shift_date DESC"#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TipPoolSummary {
                    pool: TipPool::try_from(row.pool)?,
                    rule_name: row.rule_name,
                    rule_description: row.rule_description,
                    payout_count: row.payout_count,
                    total_distributed: row.total_distributed,
                    finalized_by_name: row.finalized_by_name,
                })
            })
            .collect()
    }

    async fn user_payouts(&self, user_id: i64, range: DateRange) -> StoreResult<Vec<UserPayout>> {
        let rows = sqlx::query_as::<_, UserPayoutRow>(
            r#"SELECT tp.id, tp.tip_pool_id, tp.user_id, tp.shift_id, tp.base_amount,
                      tp.bonus_amount, tp.total_amount, tp.hours_worked, tp.role,
                      tp.percentage_share, tp.calculation_details, tp.status, tp.created_at,
                      p.shift_date,
                      p.total_tips AS pool_total_tips,
                      p.status AS pool_status,
                      r.name AS rule_name
               FROM tip_payouts tp
               JOIN tip_pools p ON p.id = tp.tip_pool_id
               LEFT JOIN tip_distribution_rules r ON r.id = p.distribution_rule_id
               WHERE tp.user_id = $1
                 AND ($2::date IS NULL OR p.shift_date >= $2)
                 AND ($3::date IS NULL OR p.shift_date <= $3)
               ORDER BY p.shift_date DESC, tp.id"#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UserPayout {
                    payout: TipPayout::try_from(row.payout)?,
                    shift_date: row.shift_date,
                    pool_total_tips: row.pool_total_tips,
                    pool_status: parse_status::<PoolStatus>("tip pool", &row.pool_status)?,
                    rule_name: row.rule_name,
                })
            })
            .collect()
    }

    async fn pool_details(&self, pool_id: i64) -> StoreResult<Option<TipPoolDetails>> {
        let row = sqlx::query_as::<_, DetailsRow>(
            r#"SELECT p.id, p.shift_date, p.total_tips, p.total_orders, p.distribution_rule_id,
                      p.status, p.calculated_at, p.calculated_by, p.distributed_at, p.finalized_by,
                      r.name AS rule_name
               FROM tip_pools p
               LEFT JOIN tip_distribution_rules r ON r.id = p.distribution_rule_id
               WHERE p.id = $1"#,
        )
        .bind(pool_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(TipPoolDetails {
            pool: TipPool::try_from(row.pool)?,
            rule_name: row.rule_name,
            payouts: self.payouts_of(pool_id).await?,
        }))
    }

    async fn count_payouts(&self, pool_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tip_payouts WHERE tip_pool_id = $1")
            .bind(pool_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn disputes_for_pool(&self, pool_id: i64) -> StoreResult<Vec<TipDispute>> {
        let rows = sqlx::query_as::<_, DisputeRow>(
            r#"SELECT d.id, d.tip_payout_id, d.user_id, d.reason, d.status, d.resolution_notes,
                      d.resolved_by, d.created_at, d.resolved_at
               FROM tip_disputes d
               JOIN tip_payouts tp ON tp.id = d.tip_payout_id
               WHERE tp.tip_pool_id = $1
               ORDER BY d.id"#,
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TipDispute::try_from).collect()
    }

    async fn insert_rule(
        &self,
        rule: &NewDistributionRule,
        at: DateTime<Utc>,
    ) -> StoreResult<DistributionRule> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            r#"INSERT INTO tip_distribution_rules (name, description, rules, is_active, created_by, created_at)
               VALUES ($1, $2, $3, TRUE, $4, $5)
               RETURNING {RULE_COLUMNS}"#
        ))
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(Json(&rule.rules))
        .bind(rule.created_by)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn active_rules(&self) -> StoreResult<Vec<DistributionRule>> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM tip_distribution_rules WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DistributionRule::from).collect())
    }

    async fn insert_shift(&self, shift: &NewShift, hours_worked: Decimal) -> StoreResult<Shift> {
        let row = sqlx::query_as::<_, ShiftRow>(
            r#"INSERT INTO shifts (user_id, role, location, start_time, end_time, hours_worked, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, user_id, role, location, start_time, end_time, hours_worked, status"#,
        )
        .bind(shift.user_id)
        .bind(&shift.role)
        .bind(&shift.location)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(hours_worked)
        .bind(ShiftStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;
        Shift::try_from(row)
    }
}
