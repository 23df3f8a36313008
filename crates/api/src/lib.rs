//! HTTP layer of the TMS dispatch and tracking backend.

pub mod app;
pub mod config;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod routes;
