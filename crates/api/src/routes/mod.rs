//! Route handlers.

pub mod alerts;
pub mod dispatches;
pub mod health;
pub mod hos;
pub mod loads;
pub mod locations;
pub mod notes;
pub mod stream;
