//! Shift model and related types.
//!
//! Shifts are owned by the timekeeping store. The engine only reads completed
//! shifts for a date (as [`WorkedShift`]) and offers a convenience write path
//! ([`NewShift`]) that records an already-completed shift.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Lifecycle status of a shift in the timekeeping store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Planned but not started.
    Scheduled,
    /// Clocked in, not yet clocked out.
    Active,
    /// Clocked out; eligible for tip allocation.
    Completed,
    /// Cancelled; never counted.
    Cancelled,
}

impl ShiftStatus {
    /// Returns the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Scheduled => "scheduled",
            ShiftStatus::Active => "active",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ShiftStatus::Scheduled),
            "active" => Ok(ShiftStatus::Active),
            "completed" => Ok(ShiftStatus::Completed),
            "cancelled" => Ok(ShiftStatus::Cancelled),
            other => Err(format!("unknown shift status '{}'", other)),
        }
    }
}

/// A shift row as held by the timekeeping store.
///
/// Times are restaurant-local wall-clock times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique identifier for the shift.
    pub id: i64,
    /// The staff member who worked the shift.
    pub user_id: i64,
    /// The role worked (e.g. "server", "bartender").
    pub role: String,
    /// Where the shift was worked, if recorded.
    #[serde(default)]
    pub location: Option<String>,
    /// Clock-in time.
    pub start_time: NaiveDateTime,
    /// Clock-out time; absent while the shift is open.
    pub end_time: Option<NaiveDateTime>,
    /// Hours stored with the shift when it was recorded.
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
    /// Lifecycle status.
    pub status: ShiftStatus,
}

impl Shift {
    /// The calendar date the shift belongs to (the date of its start time).
    pub fn shift_date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Hours between clock-in and clock-out, or `None` while the shift is open.
    pub fn worked_hours(&self) -> Option<Decimal> {
        self.end_time
            .map(|end| hours_between(self.start_time, end))
    }

    /// Whether the shift takes part in the tip pool for `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tip_pool_engine::models::{Shift, ShiftStatus};
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 2, 6).unwrap();
    /// let shift = Shift {
    ///     id: 1,
    ///     user_id: 10,
    ///     role: "server".to_string(),
    ///     location: None,
    ///     start_time: day.and_hms_opt(17, 0, 0).unwrap(),
    ///     end_time: Some(day.and_hms_opt(23, 0, 0).unwrap()),
    ///     hours_worked: None,
    ///     status: ShiftStatus::Completed,
    /// };
    /// assert!(shift.counts_toward(day));
    /// ```
    pub fn counts_toward(&self, date: NaiveDate) -> bool {
        self.status == ShiftStatus::Completed
            && self.end_time.is_some()
            && self.shift_date() == date
    }

    /// Converts the shift into the engine's input record if it is countable.
    pub fn to_worked(&self) -> Option<WorkedShift> {
        let hours = self.worked_hours()?;
        Some(WorkedShift {
            shift_id: self.id,
            user_id: self.user_id,
            role: self.role.clone(),
            hours_worked: hours,
        })
    }
}

/// A completed shift as consumed by the payout calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedShift {
    /// The shift this record came from.
    pub shift_id: i64,
    /// The staff member who worked it.
    pub user_id: i64,
    /// The role worked.
    pub role: String,
    /// Decimal hours between clock-in and clock-out.
    pub hours_worked: Decimal,
}

/// Input for recording a completed shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShift {
    /// The staff member who worked the shift.
    pub user_id: i64,
    /// Clock-in time.
    pub start_time: NaiveDateTime,
    /// Clock-out time.
    pub end_time: NaiveDateTime,
    /// The role worked.
    pub role: String,
    /// Where the shift was worked.
    #[serde(default)]
    pub location: Option<String>,
}

impl NewShift {
    /// Checks the shift can be recorded and returns its hours.
    pub fn validate(&self) -> EngineResult<Decimal> {
        if self.role.trim().is_empty() {
            return Err(EngineError::InvalidShift {
                message: "role must not be blank".to_string(),
            });
        }
        if self.end_time < self.start_time {
            return Err(EngineError::InvalidShift {
                message: format!(
                    "end time {} is before start time {}",
                    self.end_time, self.start_time
                ),
            });
        }
        Ok(hours_between(self.start_time, self.end_time))
    }
}

/// Decimal hours between two wall-clock times, floored at zero.
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    let seconds = (end - start).num_seconds().max(0);
    Decimal::new(seconds, 0) / Decimal::new(3600, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn completed_shift(start: &str, end: &str) -> Shift {
        Shift {
            id: 1,
            user_id: 10,
            role: "server".to_string(),
            location: Some("main floor".to_string()),
            start_time: make_datetime("2026-02-06", start),
            end_time: Some(make_datetime("2026-02-06", end)),
            hours_worked: None,
            status: ShiftStatus::Completed,
        }
    }

    #[test]
    fn test_worked_hours_whole_hours() {
        let shift = completed_shift("16:00:00", "22:00:00");
        assert_eq!(shift.worked_hours(), Some(Decimal::new(6, 0)));
    }

    #[test]
    fn test_worked_hours_fractional() {
        let shift = completed_shift("16:00:00", "21:45:00");
        assert_eq!(shift.worked_hours(), Some(Decimal::from_str("5.75").unwrap()));
    }

    #[test]
    fn test_open_shift_has_no_hours_and_does_not_count() {
        let mut shift = completed_shift("16:00:00", "22:00:00");
        shift.end_time = None;
        assert_eq!(shift.worked_hours(), None);
        assert!(!shift.counts_toward(make_date("2026-02-06")));
        assert!(shift.to_worked().is_none());
    }

    #[test]
    fn test_only_completed_shifts_count() {
        let mut shift = completed_shift("16:00:00", "22:00:00");
        shift.status = ShiftStatus::Active;
        assert!(!shift.counts_toward(make_date("2026-02-06")));
        shift.status = ShiftStatus::Cancelled;
        assert!(!shift.counts_toward(make_date("2026-02-06")));
    }

    #[test]
    fn test_overnight_shift_belongs_to_start_date() {
        let shift = Shift {
            end_time: Some(make_datetime("2026-02-07", "02:00:00")),
            ..completed_shift("20:00:00", "23:00:00")
        };
        assert!(shift.counts_toward(make_date("2026-02-06")));
        assert!(!shift.counts_toward(make_date("2026-02-07")));
        assert_eq!(shift.worked_hours(), Some(Decimal::new(6, 0)));
    }

    #[test]
    fn test_new_shift_rejects_end_before_start() {
        let new_shift = NewShift {
            user_id: 1,
            start_time: make_datetime("2026-02-06", "18:00:00"),
            end_time: make_datetime("2026-02-06", "17:00:00"),
            role: "chef".to_string(),
            location: None,
        };
        assert!(matches!(
            new_shift.validate(),
            Err(EngineError::InvalidShift { .. })
        ));
    }

    #[test]
    fn test_new_shift_rejects_blank_role() {
        let new_shift = NewShift {
            user_id: 1,
            start_time: make_datetime("2026-02-06", "09:00:00"),
            end_time: make_datetime("2026-02-06", "17:00:00"),
            role: "  ".to_string(),
            location: None,
        };
        assert!(new_shift.validate().is_err());
    }

    #[test]
    fn test_new_shift_returns_hours() {
        let new_shift = NewShift {
            user_id: 1,
            start_time: make_datetime("2026-02-06", "09:00:00"),
            end_time: make_datetime("2026-02-06", "13:30:00"),
            role: "host".to_string(),
            location: None,
        };
        assert_eq!(new_shift.validate().unwrap(), Decimal::from_str("4.5").unwrap());
    }

    #[test]
    fn test_shift_status_round_trips_through_str() {
        for status in [
            ShiftStatus::Scheduled,
            ShiftStatus::Active,
            ShiftStatus::Completed,
            ShiftStatus::Cancelled,
        ] {
            assert_eq!(ShiftStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(ShiftStatus::from_str("closed").is_err());
    }

    #[test]
    fn test_shift_deserialization() {
        let json = r#"{
            "id": 5,
            "user_id": 12,
            "role": "bartender",
            "start_time": "2026-02-06T17:00:00",
            "end_time": "2026-02-06T23:30:00",
            "status": "completed"
        }"#;

        let shift: Shift = serde_json::from_str(json).unwrap();
        assert_eq!(shift.role, "bartender");
        assert_eq!(shift.location, None);
        assert_eq!(shift.worked_hours(), Some(Decimal::from_str("6.5").unwrap()));
    }
}
