//! HTTP API module for the Tip Pool Engine.
//!
//! This module exposes the engine operations as JSON endpoints over axum.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    CalculatePoolRequest, FinalizePoolRequest, OpenDisputeRequest, PoolSummaryQuery,
    RecordShiftRequest, ResolveDisputeRequest, UserPayoutsQuery,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
