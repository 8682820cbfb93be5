//! Live-tracking synchronization core of the Qapac transit client.
//!
//! Everything here runs headless: discovery of nearby stops and vehicles,
//! route geometry caching, driver position reporting, and the lifecycle glue
//! that starts and stops those loops. Rendering, permissions, and forms are
//! the host's problem.

pub mod config;
pub mod format;
pub mod models;
pub mod providers;
pub mod services;
pub mod sync;
pub mod wkt;

pub use config::{Config, ConfigError};
pub use providers::{ApiError, BackendClient, HttpClient, ReqwestClient};
pub use services::{
    FixedLocationSource, GeometryCache, LocationFix, LocationSource, PositionReporter,
    SessionError, SessionStore,
};
pub use sync::{SyncError, SyncManager, VehicleSnapshot, VehicleStore, Viewport};
