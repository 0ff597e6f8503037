//! Closed order records consumed by the tip pool calculation.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed order as read from the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedOrder {
    /// Order id.
    pub id: i64,
    /// The server who closed the order, if one was assigned.
    pub server_id: Option<i64>,
    /// Tip left on the order.
    pub tip_amount: Decimal,
    /// When the order was closed (restaurant-local time).
    pub closed_at: NaiveDateTime,
}

impl ClosedOrder {
    /// Whether the order contributes to the pool for `date`.
    pub fn contributes_to(&self, date: NaiveDate) -> bool {
        self.tip_amount > Decimal::ZERO && self.closed_at.date() == date
    }
}

/// Aggregate tip totals for a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TipTotals {
    /// Sum of tip amounts.
    pub total_tips: Decimal,
    /// Number of contributing orders.
    pub total_orders: i64,
}

impl TipTotals {
    /// Sums the orders that carry a positive tip.
    ///
    /// # Examples
    ///
    /// ```
    /// use tip_pool_engine::models::{ClosedOrder, TipTotals};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let closed_at = NaiveDate::from_ymd_opt(2026, 2, 6)
    ///     .unwrap()
    ///     .and_hms_opt(21, 15, 0)
    ///     .unwrap();
    /// let orders = vec![
    ///     ClosedOrder { id: 1, server_id: Some(3), tip_amount: Decimal::new(60, 0), closed_at },
    ///     ClosedOrder { id: 2, server_id: Some(4), tip_amount: Decimal::new(40, 0), closed_at },
    /// ];
    /// let totals = TipTotals::from_orders(&orders);
    /// assert_eq!(totals.total_tips, Decimal::new(100, 0));
    /// assert_eq!(totals.total_orders, 2);
    /// ```
    pub fn from_orders(orders: &[ClosedOrder]) -> Self {
        orders
            .iter()
            .filter(|order| order.tip_amount > Decimal::ZERO)
            .fold(TipTotals::default(), |acc, order| TipTotals {
                total_tips: acc.total_tips + order.tip_amount,
                total_orders: acc.total_orders + 1,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn order(id: i64, tip: &str, closed_at: &str) -> ClosedOrder {
        ClosedOrder {
            id,
            server_id: Some(1),
            tip_amount: dec(tip),
            closed_at: NaiveDateTime::parse_from_str(closed_at, "%Y-%m-%d %H:%M:%S").unwrap(),
        }
    }

    #[test]
    fn test_zero_tip_orders_are_ignored() {
        let orders = vec![
            order(1, "12.50", "2026-02-06 19:00:00"),
            order(2, "0", "2026-02-06 19:30:00"),
            order(3, "7.25", "2026-02-06 20:00:00"),
        ];
        let totals = TipTotals::from_orders(&orders);
        assert_eq!(totals.total_tips, dec("19.75"));
        assert_eq!(totals.total_orders, 2);
    }

    #[test]
    fn test_empty_orders_total_zero() {
        let totals = TipTotals::from_orders(&[]);
        assert_eq!(totals.total_tips, Decimal::ZERO);
        assert_eq!(totals.total_orders, 0);
    }

    #[test]
    fn test_contributes_to_matches_closing_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 6).unwrap();
        assert!(order(1, "5", "2026-02-06 23:59:59").contributes_to(date));
        assert!(!order(2, "5", "2026-02-07 00:00:01").contributes_to(date));
        assert!(!order(3, "0", "2026-02-06 12:00:00").contributes_to(date));
    }
}
