//! Shared utilities and common types for the TMS backend.
//!
//! This crate provides functionality used across all other crates:
//! - Great-circle distance math for geofence evaluation and dispatch scoring
//! - Common validation logic for GPS and HOS payloads

pub mod geo;
pub mod validation;
