//! HTTP middleware: request tracing, metrics, security headers, logging init.

pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod trace_id;

pub use metrics::{metrics_handler, metrics_middleware};
pub use security_headers::security_headers_middleware;
pub use trace_id::trace_id;
