//! Pool lifecycle events.
//!
//! The engine publishes a [`PoolEvent`] after a calculation or finalization
//! has committed. Nothing is published for work that rolled back.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// A committed change to a tip pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A pool was calculated or recalculated.
    PoolCalculated {
        /// Correlation id of the calculation.
        calculation_id: Uuid,
        /// Pool id.
        pool_id: i64,
        /// Business date of the pool.
        shift_date: NaiveDate,
        /// Tips collected for the date.
        total_tips: Decimal,
        /// Number of payouts written.
        payout_count: usize,
    },
    /// A pool was finalized and its payouts approved.
    PoolFinalized {
        /// Pool id.
        pool_id: i64,
        /// Business date of the pool.
        shift_date: NaiveDate,
        /// User who finalized the pool.
        finalized_by: i64,
        /// Finalization time.
        finalized_at: DateTime<Utc>,
        /// Payouts moved from pending to approved.
        approved_payouts: u64,
    },
}

impl PoolEvent {
    /// The pool the event concerns.
    pub fn pool_id(&self) -> i64 {
        match self {
            PoolEvent::PoolCalculated { pool_id, .. } | PoolEvent::PoolFinalized { pool_id, .. } => {
                *pool_id
            }
        }
    }
}

/// Receives pool events. Publishing must not block or fail the caller.
pub trait Notifier: Send + Sync + 'static {
    /// Delivers an event.
    fn publish(&self, event: PoolEvent);
}

/// Fans events out to any number of subscribers over a tokio broadcast
/// channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<PoolEvent>,
}

impl BroadcastNotifier {
    /// Creates a notifier whose channel buffers `capacity` events per
    /// subscriber. Slow subscribers lag rather than block publishers.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: PoolEvent) {
        let pool_id = event.pool_id();
        if self.sender.send(event).is_err() {
            debug!(pool_id, "no subscribers for pool event");
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&self, _event: PoolEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculated(pool_id: i64) -> PoolEvent {
        PoolEvent::PoolCalculated {
            calculation_id: Uuid::new_v4(),
            pool_id,
            shift_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            total_tips: Decimal::new(10000, 2),
            payout_count: 3,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.publish(calculated(7));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.pool_id(), 7);
    }

    #[test]
    fn test_publish_without_subscribers_is_ignored() {
        let notifier = BroadcastNotifier::new(8);
        notifier.publish(calculated(1));
        NullNotifier.publish(calculated(1));
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(calculated(3)).unwrap();
        assert_eq!(json["event"], "pool_calculated");
        assert_eq!(json["pool_id"], 3);
        assert_eq!(json["total_tips"], "100.00");
    }
}
