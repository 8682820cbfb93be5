//! Lifecycle coordination for the two polling loops.
//!
//! `SyncManager` owns the rider-facing vehicle-refresh loop and the
//! driver-facing position-reporting loop, and starts/stops them in response
//! to the host's lifecycle signals (foreground/background, login/logout).
//! The host drives it with explicit calls; there are no framework hooks here.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{NearbyVehicle, Session};
use crate::providers::{ApiError, BackendClient};
use crate::services::location::LocationSource;
use crate::services::reporter::PositionReporter;
use crate::services::session::{SessionError, SessionStore};
use crate::services::GeometryCache;

/// Latest successful nearby-vehicle fetch. Replaced wholesale on every
/// successful poll; a failed poll leaves the previous snapshot in place.
#[derive(Debug, Clone, Default)]
pub struct VehicleSnapshot {
    pub vehicles: Vec<NearbyVehicle>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Shared read-side store for the vehicle layer.
pub type VehicleStore = Arc<RwLock<VehicleSnapshot>>;

/// Map viewport the vehicle poll queries around.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub lat: f64,
    pub lon: f64,
    pub radius_meters: f64,
}

struct LoopHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    /// Cancel the next scheduled tick. An in-flight request is allowed to
    /// complete; its result is discarded by the loop's own liveness check.
    fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

pub struct SyncManager {
    client: Arc<BackendClient>,
    session: Arc<SessionStore>,
    location: Arc<dyn LocationSource>,
    geometry: Arc<GeometryCache>,
    viewport: Arc<RwLock<Viewport>>,
    vehicles: VehicleStore,
    refresh_period: Duration,
    report_period: Duration,
    refresh_loop: Mutex<Option<LoopHandle>>,
    report_loop: Mutex<Option<LoopHandle>>,
    session_expired: watch::Sender<bool>,
}

impl SyncManager {
    pub fn new(
        config: &Config,
        client: Arc<BackendClient>,
        session: Arc<SessionStore>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        let (session_expired, _) = watch::channel(false);

        Self {
            client,
            session,
            location,
            geometry: Arc::new(GeometryCache::new()),
            viewport: Arc::new(RwLock::new(Viewport {
                lat: 0.0,
                lon: 0.0,
                radius_meters: config.nearby_radius_meters,
            })),
            vehicles: Arc::new(RwLock::new(VehicleSnapshot::default())),
            refresh_period: Duration::from_secs(config.refresh_interval_secs),
            report_period: Duration::from_secs(config.report_interval_secs),
            refresh_loop: Mutex::new(None),
            report_loop: Mutex::new(None),
            session_expired,
        }
    }

    /// Authenticate and persist the resulting session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, SyncError> {
        let resp = self.client.login(username, password).await?;
        let session = Session::from(resp);
        self.session.save(session.clone()).await?;
        let _ = self.session_expired.send(false);
        info!(username = %session.user.username, role = session.user.role.as_str(), "Logged in");
        Ok(session)
    }

    /// Stop the reporting loop and clear the session. The vehicle-refresh
    /// loop is unaffected; it does not require login.
    pub async fn logout(&self) {
        self.stop_report_loop().await;
        self.session.clear().await;
        info!("Logged out");
    }

    /// Move the viewport the vehicle poll queries around. Takes effect on
    /// the next tick; no restart needed.
    pub async fn set_viewport(&self, lat: f64, lon: f64) {
        let mut viewport = self.viewport.write().await;
        viewport.lat = lat;
        viewport.lon = lon;
    }

    /// Start the rider-facing vehicle-refresh loop.
    ///
    /// Idempotent: an already-running loop is cancelled before the new one is
    /// scheduled, so repeated resume events never stack timers.
    pub async fn start_vehicle_refresh(&self) {
        let mut slot = self.refresh_loop.lock().await;
        if let Some(existing) = slot.take() {
            debug!("Vehicle refresh already running, restarting");
            existing.stop();
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let client = self.client.clone();
        let viewport = self.viewport.clone();
        let store = self.vehicles.clone();
        let period = self.refresh_period;

        let task = tokio::spawn(async move {
            run_vehicle_refresh(client, viewport, store, period, stop_rx).await;
        });

        *slot = Some(LoopHandle { stop: stop_tx, task });
        info!(period_secs = self.refresh_period.as_secs(), "Vehicle refresh started");
    }

    /// Stop vehicle polling; the host calls this when the rider screen is
    /// backgrounded and `start_vehicle_refresh` again on resume.
    pub async fn stop_vehicle_refresh(&self) {
        let mut slot = self.refresh_loop.lock().await;
        if let Some(handle) = slot.take() {
            handle.stop();
            info!("Vehicle refresh stopped");
        }
    }

    /// Start the driver position-reporting loop.
    ///
    /// Idempotent like `start_vehicle_refresh`. Requires a logged-in session
    /// with a reporting role; otherwise this is a logged no-op. Once running,
    /// the loop is decoupled from screen lifecycle and ends only on logout,
    /// fatal auth failure, or `shutdown`.
    pub async fn start_reporting(&self) {
        match self.session.role().await {
            Some(role) if role.can_report() => {}
            Some(role) => {
                warn!(role = role.as_str(), "Role cannot report positions, not starting");
                return;
            }
            None => {
                warn!("Not logged in, not starting position reporter");
                return;
            }
        }

        let mut slot = self.report_loop.lock().await;
        if let Some(existing) = slot.take() {
            debug!("Position reporter already running, restarting");
            existing.stop();
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let reporter = PositionReporter::new(
            self.session.clone(),
            self.client.clone(),
            self.location.clone(),
            self.report_period,
            stop_rx,
            self.session_expired.clone(),
        );

        let task = tokio::spawn(reporter.run());
        *slot = Some(LoopHandle { stop: stop_tx, task });
    }

    /// Stop both loops. Process-exit path; in-flight requests are discarded.
    pub async fn shutdown(&self) {
        self.stop_report_loop().await;
        self.stop_vehicle_refresh().await;
        info!("Sync manager shut down");
    }

    /// Pre-fetch geometry for every known route into the cache. Failures are
    /// non-fatal; absent entries are retried lazily on demand.
    pub async fn warm_geometry(&self) -> Result<(), ApiError> {
        let routes = self.client.routes().await?;
        let ids: Vec<i32> = routes.iter().map(|r| r.id).collect();
        self.geometry.warm(&self.client, &ids).await;
        Ok(())
    }

    pub fn geometry_cache(&self) -> Arc<GeometryCache> {
        self.geometry.clone()
    }

    pub fn vehicle_store(&self) -> VehicleStore {
        self.vehicles.clone()
    }

    /// Latest vehicle snapshot (clone; the store itself is never exposed
    /// mutably).
    pub async fn vehicles(&self) -> VehicleSnapshot {
        self.vehicles.read().await.clone()
    }

    /// Flag flipped when a position report is rejected with 401/403 and the
    /// session has been cleared. Hosts watch this to force re-authentication.
    pub fn subscribe_session_expired(&self) -> watch::Receiver<bool> {
        self.session_expired.subscribe()
    }

    pub async fn reporting_active(&self) -> bool {
        self.report_loop
            .lock()
            .await
            .as_ref()
            .map(|h| !h.task.is_finished())
            .unwrap_or(false)
    }

    async fn stop_report_loop(&self) {
        let mut slot = self.report_loop.lock().await;
        if let Some(handle) = slot.take() {
            handle.stop();
        }
    }
}

async fn run_vehicle_refresh(
    client: Arc<BackendClient>,
    viewport: Arc<RwLock<Viewport>>,
    store: VehicleStore,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
                continue;
            }
        }

        let Viewport {
            lat,
            lon,
            radius_meters,
        } = *viewport.read().await;

        match client.nearby_vehicles(lat, lon, radius_meters).await {
            Ok(vehicles) => {
                // The loop may have been stopped while the request was in
                // flight; a stale result must not touch the store.
                if *stop.borrow() {
                    return;
                }
                debug!(count = vehicles.len(), "Refreshed nearby vehicles");
                let mut snapshot = store.write().await;
                snapshot.vehicles = vehicles;
                snapshot.updated_at = Some(Utc::now());
            }
            Err(e) => {
                // Best-effort layer: keep the previous snapshot, the next
                // tick retries on its own.
                debug!(error = %e, "Vehicle refresh failed, keeping existing data");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
