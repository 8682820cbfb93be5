use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qapac_core::config::Config;
use qapac_core::providers::{BackendClient, ReqwestClient};
use qapac_core::services::{FixedLocationSource, LocationFix, SessionStore};
use qapac_core::sync::SyncManager;

/// Demo host: runs the rider-facing refresh loop against a configured
/// backend and logs snapshots until interrupted. A real UI would drive the
/// same `SyncManager` calls from its lifecycle callbacks.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qapac_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %config_path, error = %e, "Config not loaded, using defaults");
            Config::default()
        }
    };

    info!(base_url = %config.base_url, "Starting Qapac tracking core");

    let http = Arc::new(ReqwestClient::new(
        Duration::from_secs(config.request_timeout_secs),
        Duration::from_secs(config.connect_timeout_secs),
    )?);
    let client = Arc::new(BackendClient::new(&config.base_url, http)?);
    let session = Arc::new(SessionStore::load(&config.session_file));

    // Plaza de Armas de Cajamarca; a device host would wire real GPS here.
    let location = Arc::new(FixedLocationSource::new(LocationFix {
        lat: -7.1638,
        lon: -78.5003,
        heading_degrees: None,
        speed_mps: None,
    }));

    let manager = Arc::new(SyncManager::new(&config, client, session, location));
    manager.set_viewport(-7.1638, -78.5003).await;

    // Pre-fetch route geometry so stop taps resolve without latency.
    if let Err(e) = manager.warm_geometry().await {
        warn!(error = %e, "Geometry pre-fetch failed, entries will be fetched lazily");
    }

    manager.start_vehicle_refresh().await;

    // A driver session persisted from a previous run resumes reporting.
    manager.start_reporting().await;

    let mut session_expired = manager.subscribe_session_expired();
    let watcher = manager.clone();
    tokio::spawn(async move {
        while session_expired.changed().await.is_ok() {
            if *session_expired.borrow() {
                warn!("Session expired, host must re-authenticate");
                let snapshot = watcher.vehicles().await;
                info!(vehicles = snapshot.vehicles.len(), "Rider polling continues unauthenticated");
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    manager.shutdown().await;

    Ok(())
}
