//! Persistence layer for the TMS core.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Postgres implementations of the domain repository traits

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
