//! Device location seam.
//!
//! The core never talks to GPS hardware; the host supplies a
//! [`LocationSource`]. Each call returns at most one fresh high-accuracy fix,
//! and no location history is kept anywhere in this crate.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::DriverPositionSample;

/// One device location fix. Speed is in m/s as reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub lat: f64,
    pub lon: f64,
    pub heading_degrees: Option<f64>,
    pub speed_mps: Option<f64>,
}

impl LocationFix {
    /// Build the wire sample for this fix. Speed is converted from m/s to
    /// km/h; heading and speed are carried only when the fix reports them.
    pub fn to_sample(&self) -> DriverPositionSample {
        DriverPositionSample {
            lat: self.lat,
            lon: self.lon,
            heading: self.heading_degrees,
            speed: self.speed_mps.map(|mps| mps * 3.6),
        }
    }
}

/// Provides the current device position on demand.
///
/// Returning `None` means no fix is available right now; callers treat that
/// as a missed sample, not an error.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_fix(&self) -> Option<LocationFix>;
}

/// A host-updatable location source, useful for demos and tests.
#[derive(Default)]
pub struct FixedLocationSource {
    fix: RwLock<Option<LocationFix>>,
}

impl FixedLocationSource {
    pub fn new(fix: LocationFix) -> Self {
        Self {
            fix: RwLock::new(Some(fix)),
        }
    }

    pub async fn set(&self, fix: Option<LocationFix>) {
        *self.fix.write().await = fix;
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn current_fix(&self) -> Option<LocationFix> {
        *self.fix.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_converts_speed_to_kmh() {
        let fix = LocationFix {
            lat: -7.16,
            lon: -78.5,
            heading_degrees: Some(180.0),
            speed_mps: Some(10.0),
        };
        let sample = fix.to_sample();
        assert_eq!(sample.speed, Some(36.0));
        assert_eq!(sample.heading, Some(180.0));
    }

    #[test]
    fn sample_keeps_absent_fields_absent() {
        let fix = LocationFix {
            lat: -7.16,
            lon: -78.5,
            heading_degrees: None,
            speed_mps: None,
        };
        let sample = fix.to_sample();
        assert_eq!(sample.heading, None);
        assert_eq!(sample.speed, None);
    }
}
