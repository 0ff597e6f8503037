//! Tip Pool Engine for restaurant staff.
//!
//! This crate collects the tips of a business day into a pool, allocates the
//! pool across staff roles according to a configurable distribution rule,
//! splits each role's share among the shifts worked in that role, and
//! persists the resulting payouts until a manager finalizes the pool.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;
