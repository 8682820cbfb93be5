//! Durable session store.
//!
//! Single source of truth for auth state. The in-memory cell is a
//! `tokio::sync::RwLock`, so every loop reads a full snapshot and a concurrent
//! `clear` can never expose a half-updated token. Durability is one JSON
//! document on disk, overwritten atomically (temp file + rename) and removed
//! on logout.

use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::{Role, Session};

pub struct SessionStore {
    path: PathBuf,
    cell: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store, restoring any session persisted by a previous run.
    /// A missing or unreadable file means "logged out", never a startup error.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let session = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Session>(&content) {
                Ok(session) => {
                    debug!(username = %session.user.username, "Restored persisted session");
                    Some(session)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path,
            cell: RwLock::new(session),
        }
    }

    /// Replace the whole session atomically. Idempotent; a later save fully
    /// overwrites an earlier one.
    pub async fn save(&self, session: Session) -> Result<(), SessionError> {
        let mut guard = self.cell.write().await;
        persist(&self.path, &session)?;
        *guard = Some(session);
        Ok(())
    }

    /// Remove all session state. Idempotent.
    pub async fn clear(&self) {
        let mut guard = self.cell.write().await;
        *guard = None;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove session file");
            }
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.cell.read().await.is_some()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.cell
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn role(&self) -> Option<Role> {
        self.cell.read().await.as_ref().map(|s| s.user.role)
    }

    pub async fn username(&self) -> Option<String> {
        self.cell
            .read()
            .await
            .as_ref()
            .map(|s| s.user.username.clone())
    }

    /// Full snapshot, for callers that need token and role together.
    pub async fn session(&self) -> Option<Session> {
        self.cell.read().await.clone()
    }
}

fn persist(path: &Path, session: &Session) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::PersistError(e.to_string()))?;
        }
    }

    let json = serde_json::to_string_pretty(session)
        .map_err(|e| SessionError::PersistError(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| SessionError::PersistError(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| SessionError::PersistError(e.to_string()))?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to persist session: {0}")]
    PersistError(String),
}
