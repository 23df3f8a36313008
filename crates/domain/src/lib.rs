//! Domain layer for the TMS dispatch and live-tracking core.
//!
//! This crate holds the business rules that have real invariants behind
//! them: the load status state machine, the dispatch assignment engine,
//! the location ingestion and geofence pipeline, the Hours-of-Service
//! ledger, and the real-time notification gateway. Persistence is consumed
//! through the repository traits in [`repositories`]; the HTTP surface
//! lives in the `api` crate.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
