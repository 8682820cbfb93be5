pub mod geometry;
pub mod location;
pub mod reporter;
pub mod session;

pub use geometry::GeometryCache;
pub use location::{FixedLocationSource, LocationFix, LocationSource};
pub use reporter::PositionReporter;
pub use session::{SessionError, SessionStore};
