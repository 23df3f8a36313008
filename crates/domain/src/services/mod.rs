//! Domain services.
//!
//! Services contain the business logic that operates on domain models,
//! reached through the repository traits so they stay storage-agnostic.

pub mod dispatch;
pub mod gateway;
pub mod hos;
pub mod load_status;
pub mod locks;
pub mod tracking;

pub use dispatch::DispatchService;
pub use gateway::{LoadStatusChangedEvent, PushEvent, Topic, TrackingGateway};
pub use hos::HosService;
pub use load_status::LoadStatusService;
pub use locks::KeyedLocks;
pub use tracking::TrackingService;
