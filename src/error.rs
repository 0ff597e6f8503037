//! Error types for the Tip Pool Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine surfaces: validation failures detected before
//! any write, configuration problems, and storage failures propagated from a
//! [`TipStore`](crate::store::TipStore) implementation.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Tip Pool Engine.
///
/// # Example
///
/// ```
/// use tip_pool_engine::error::EngineError;
///
/// let error = EngineError::PoolNotFound { pool_id: 42 };
/// assert_eq!(error.to_string(), "Tip pool not found: 42");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced distribution rule does not exist or is inactive.
    #[error("Distribution rule not found or inactive: {rule_id}")]
    RuleNotFound {
        /// The requested rule id.
        rule_id: i64,
    },

    /// No closed order with a positive tip exists for the date.
    #[error("No tips found for date {date}")]
    NoTipsForDate {
        /// The target date.
        date: NaiveDate,
    },

    /// No completed, time-stamped shift exists for the date.
    #[error("No completed shifts found for date {date}")]
    NoShiftsForDate {
        /// The target date.
        date: NaiveDate,
    },

    /// The tip pool does not exist.
    #[error("Tip pool not found: {pool_id}")]
    PoolNotFound {
        /// The requested pool id.
        pool_id: i64,
    },

    /// The pool for the date is finalized and the engine is configured to
    /// refuse recalculation of finalized pools.
    #[error("Tip pool {pool_id} for {date} is finalized and cannot be recalculated")]
    PoolFinalized {
        /// The finalized pool id.
        pool_id: i64,
        /// The pool's shift date.
        date: NaiveDate,
    },

    /// The rule document could not be interpreted for a role.
    #[error("Invalid distribution rule for role '{role}': {message}")]
    InvalidDistributionRule {
        /// The role whose policy was invalid.
        role: String,
        /// A description of the problem.
        message: String,
    },

    /// A shift submitted for recording was invalid.
    #[error("Invalid shift: {message}")]
    InvalidShift {
        /// A description of what made the shift invalid.
        message: String,
    },

    /// A query date range ends before it starts.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Start of the range.
        start: NaiveDate,
        /// End of the range.
        end: NaiveDate,
    },

    /// The payout does not exist.
    #[error("Tip payout not found: {payout_id}")]
    PayoutNotFound {
        /// The requested payout id.
        payout_id: i64,
    },

    /// The dispute does not exist.
    #[error("Tip dispute not found: {dispute_id}")]
    DisputeNotFound {
        /// The requested dispute id.
        dispute_id: i64,
    },

    /// The dispute has already been resolved or rejected.
    #[error("Tip dispute {dispute_id} is already closed")]
    DisputeClosed {
        /// The dispute id.
        dispute_id: i64,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A storage failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error reported by the driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Running the embedded migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted value could not be mapped back into a model.
    #[error("failed to decode {entity}: {message}")]
    Decode {
        /// The kind of row being decoded.
        entity: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A row that must exist inside the transaction was missing.
    #[error("{entity} {id} vanished during the transaction")]
    MissingRow {
        /// The kind of row.
        entity: &'static str,
        /// The row id.
        id: i64,
    },

    /// A backend-specific failure that has no driver error attached.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

/// A type alias for Results that return StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_not_found_displays_id() {
        let error = EngineError::RuleNotFound { rule_id: 7 };
        assert_eq!(
            error.to_string(),
            "Distribution rule not found or inactive: 7"
        );
    }

    #[test]
    fn test_no_tips_displays_date() {
        let error = EngineError::NoTipsForDate {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        };
        assert_eq!(error.to_string(), "No tips found for date 2026-03-14");
    }

    #[test]
    fn test_no_shifts_displays_date() {
        let error = EngineError::NoShiftsForDate {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "No completed shifts found for date 2026-03-14"
        );
    }

    #[test]
    fn test_invalid_rule_displays_role_and_message() {
        let error = EngineError::InvalidDistributionRule {
            role: "bartender".to_string(),
            message: "percentage is required".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid distribution rule for role 'bartender': percentage is required"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error: EngineError = StoreError::Backend("connection reset".to_string()).into();
        assert_eq!(error.to_string(), "storage backend error: connection reset");
        assert!(matches!(error, EngineError::Store(StoreError::Backend(_))));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<EngineError>();
        assert_error::<StoreError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn fails_in_store() -> StoreResult<()> {
            Err(StoreError::MissingRow {
                entity: "tip pool",
                id: 3,
            })
        }

        fn propagates() -> EngineResult<()> {
            fails_in_store()?;
            Ok(())
        }

        let err = propagates().unwrap_err();
        assert_eq!(err.to_string(), "tip pool 3 vanished during the transaction");
    }
}
