//! Session-lifetime cache of route detail (geometry, stops, vehicles).
//!
//! Single source of truth for route geometry once fetched. Entries never
//! expire within a session; routes rarely change shape and acceptable
//! staleness keeps the cache trivial.

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::RouteDetail;
use crate::providers::BackendClient;

/// Insertion-ordered cache keyed by route id.
///
/// Stored as a Vec rather than a map so that lookups which scan the cache
/// resolve ties by insertion order.
#[derive(Default)]
pub struct GeometryCache {
    entries: RwLock<Vec<RouteDetail>>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure lookup by route id.
    pub async fn get(&self, route_id: i32) -> Option<RouteDetail> {
        self.entries
            .read()
            .await
            .iter()
            .find(|d| d.id == route_id)
            .cloned()
    }

    /// Insert or replace. Last write wins wholesale; there are no merge
    /// semantics. Replacing keeps the entry's original insertion position.
    pub async fn put(&self, detail: RouteDetail) {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|d| d.id == detail.id) {
            Some(slot) => *slot = detail,
            None => entries.push(detail),
        }
    }

    /// First cached route whose stop list contains `stop_id`.
    ///
    /// A stop may belong to several routes; the tie-break is "first cached",
    /// not "best match". Known limitation carried over from the original
    /// client, kept for compatibility.
    pub async fn find_route_containing_stop(&self, stop_id: i64) -> Option<RouteDetail> {
        self.entries
            .read()
            .await
            .iter()
            .find(|d| d.contains_stop(stop_id))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Eagerly populate the cache for a known route-id list.
    ///
    /// Fetches run concurrently; an id that fails to fetch is skipped and
    /// simply stays absent for a later lazy retry.
    pub async fn warm(&self, client: &BackendClient, route_ids: &[i32]) {
        let fetches = route_ids.iter().map(|&id| async move {
            match client.route_detail(id).await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(route_id = id, error = %e, "Failed to pre-fetch route detail, skipping");
                    None
                }
            }
        });

        let mut cached = 0usize;
        for detail in join_all(fetches).await.into_iter().flatten() {
            self.put(detail).await;
            cached += 1;
        }

        info!(
            requested = route_ids.len(),
            cached, "Completed route geometry pre-fetch"
        );
    }
}
