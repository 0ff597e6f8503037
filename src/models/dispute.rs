//! Tip disputes: a staff member's objection to one payout.
//!
//! Disputes never change payout amounts; resolving one only records the
//! outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Awaiting review.
    Open,
    /// Accepted by a reviewer.
    Resolved,
    /// Turned down by a reviewer.
    Rejected,
}

impl DisputeStatus {
    /// Returns the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Rejected => "rejected",
        }
    }

    /// Whether the dispute can still be resolved.
    pub fn is_open(&self) -> bool {
        matches!(self, DisputeStatus::Open)
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DisputeStatus::Open),
            "resolved" => Ok(DisputeStatus::Resolved),
            "rejected" => Ok(DisputeStatus::Rejected),
            other => Err(format!("unknown dispute status '{}'", other)),
        }
    }
}

/// Reviewer's decision on a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeOutcome {
    /// The objection is upheld.
    Resolved,
    /// The objection is turned down.
    Rejected,
}

impl From<DisputeOutcome> for DisputeStatus {
    fn from(outcome: DisputeOutcome) -> Self {
        match outcome {
            DisputeOutcome::Resolved => DisputeStatus::Resolved,
            DisputeOutcome::Rejected => DisputeStatus::Rejected,
        }
    }
}

/// A persisted dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipDispute {
    /// Dispute id.
    pub id: i64,
    /// The disputed payout.
    pub tip_payout_id: i64,
    /// The objecting user.
    pub user_id: i64,
    /// Free-text reason.
    pub reason: String,
    /// Current status.
    pub status: DisputeStatus,
    /// Reviewer notes.
    pub resolution_notes: Option<String>,
    /// Reviewer.
    pub resolved_by: Option<i64>,
    /// When the dispute was opened.
    pub created_at: DateTime<Utc>,
    /// When the dispute was closed.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Input for opening a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDispute {
    /// The disputed payout.
    pub tip_payout_id: i64,
    /// The objecting user.
    pub user_id: i64,
    /// Free-text reason.
    pub reason: String,
}

/// Input for closing a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeResolution {
    /// Decision.
    pub outcome: DisputeOutcome,
    /// Reviewer.
    pub resolved_by: i64,
    /// Reviewer notes.
    #[serde(default)]
    pub notes: Option<String>,
}
