//! Request types for the Tip Pool Engine API.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{DisputeOutcome, DisputeResolution, NewShift};

/// Body of `POST /tip-pools/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatePoolRequest {
    /// Business date to pool.
    pub date: NaiveDate,
    /// Active distribution rule to apply.
    pub distribution_rule_id: i64,
    /// User requesting the calculation.
    pub calculated_by: i64,
}

/// Body of `POST /tip-pools/{id}/finalize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizePoolRequest {
    /// User finalizing the pool.
    pub finalized_by: i64,
}

/// Query string of `GET /tip-pools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSummaryQuery {
    /// First date, inclusive.
    pub start_date: NaiveDate,
    /// Last date, inclusive.
    pub end_date: NaiveDate,
    /// Restrict to pools with a payout for this user.
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Query string of `GET /users/{id}/payouts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPayoutsQuery {
    /// First pool date, inclusive.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last pool date, inclusive.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Body of `POST /shifts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordShiftRequest {
    /// Staff member.
    pub user_id: i64,
    /// Clock-in, restaurant local time.
    pub start_time: NaiveDateTime,
    /// Clock-out, restaurant local time.
    pub end_time: NaiveDateTime,
    /// Role worked.
    pub role: String,
    /// Optional station or section.
    #[serde(default)]
    pub location: Option<String>,
}

impl From<RecordShiftRequest> for NewShift {
    fn from(req: RecordShiftRequest) -> Self {
        NewShift {
            user_id: req.user_id,
            start_time: req.start_time,
            end_time: req.end_time,
            role: req.role,
            location: req.location,
        }
    }
}

/// Body of `POST /payouts/{id}/disputes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDisputeRequest {
    /// User raising the dispute.
    pub user_id: i64,
    /// Free-text reason.
    pub reason: String,
}

/// Body of `POST /disputes/{id}/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveDisputeRequest {
    /// `resolved` or `rejected`.
    pub outcome: DisputeOutcome,
    /// User closing the dispute.
    pub resolved_by: i64,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<ResolveDisputeRequest> for DisputeResolution {
    fn from(req: ResolveDisputeRequest) -> Self {
        DisputeResolution {
            outcome: req.outcome,
            resolved_by: req.resolved_by,
            notes: req.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_request_deserialization() {
        let json = r#"{"date": "2026-03-14", "distribution_rule_id": 2, "calculated_by": 9}"#;
        let req: CalculatePoolRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(req.distribution_rule_id, 2);
    }

    #[test]
    fn test_record_shift_request_converts() {
        let json = r#"{
            "user_id": 4,
            "start_time": "2026-03-14T16:00:00",
            "end_time": "2026-03-14T23:30:00",
            "role": "bartender"
        }"#;
        let req: RecordShiftRequest = serde_json::from_str(json).unwrap();
        let shift: NewShift = req.into();
        assert_eq!(shift.role, "bartender");
        assert!(shift.location.is_none());
    }

    #[test]
    fn test_resolve_request_rejects_unknown_outcome() {
        let json = r#"{"outcome": "escalated", "resolved_by": 1}"#;
        assert!(serde_json::from_str::<ResolveDisputeRequest>(json).is_err());
    }
}
