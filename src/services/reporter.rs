//! Driver position reporting loop.
//!
//! Runs as a long-lived background task, independent of any screen: once
//! started it is stopped only by logout, a fatal auth failure, or an explicit
//! lifecycle shutdown. Every tick stands alone; a failed report is logged and
//! the next fixed-interval tick is the retry. There is no backoff and no
//! retry counter anywhere in this loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::providers::BackendClient;
use crate::services::location::LocationSource;
use crate::services::session::SessionStore;

pub struct PositionReporter {
    session: Arc<SessionStore>,
    client: Arc<BackendClient>,
    location: Arc<dyn LocationSource>,
    period: Duration,
    stop: watch::Receiver<bool>,
    session_expired: watch::Sender<bool>,
}

impl PositionReporter {
    pub fn new(
        session: Arc<SessionStore>,
        client: Arc<BackendClient>,
        location: Arc<dyn LocationSource>,
        period: Duration,
        stop: watch::Receiver<bool>,
        session_expired: watch::Sender<bool>,
    ) -> Self {
        Self {
            session,
            client,
            location,
            period,
            stop,
            session_expired,
        }
    }

    /// Run the reporting loop until stopped or the session stops qualifying.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.period);
        // Reschedule from the end of a late tick rather than catching up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = self.period.as_secs(), "Position reporter started");

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = self.stop.changed() => {
                    if changed.is_err() || *self.stop.borrow() {
                        info!("Position reporter stopped");
                        return;
                    }
                    continue;
                }
            }

            // Re-read the session every tick: logout elsewhere must end the
            // loop without an extra signal.
            let session = match self.session.session().await {
                Some(s) => s,
                None => {
                    info!("Session gone, position reporter stopping");
                    return;
                }
            };
            if !session.user.role.can_report() {
                info!(role = session.user.role.as_str(), "Role no longer qualifies, position reporter stopping");
                return;
            }

            let fix = match self.location.current_fix().await {
                Some(fix) => fix,
                None => {
                    debug!("No location fix available, skipping this tick");
                    continue;
                }
            };

            let sample = fix.to_sample();
            let result = self
                .client
                .report_position(&session.access_token, &sample)
                .await;

            // The loop may have been stopped while the request was in
            // flight; a stale result must not touch the session.
            if *self.stop.borrow() {
                info!("Position reporter stopped");
                return;
            }

            match result {
                Ok(()) => {
                    debug!(lat = sample.lat, lon = sample.lon, "Reported position");
                }
                Err(e) if e.is_auth() => {
                    warn!(error = %e, "Token rejected, clearing session and stopping reporter");
                    self.session.clear().await;
                    let _ = self.session_expired.send(true);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to report position, retrying on next tick");
                }
            }
        }
    }
}
