use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use crate::models::Identity;

/// Buffer size for the session event channel.
/// Events are rare (login, logout, expiry); a slow subscriber only needs the latest few.
const EVENT_BUFFER_SIZE: usize = 16;

/// Session lifecycle notifications for the application controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// The server rejected the token; the session has been evicted and the
    /// user should be sent back to login.
    Expired,
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<Identity>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
}

/// Token and session epoch captured when a request is sent.
///
/// The epoch lets a 401 evict only the session the request was actually sent
/// under: if a login or logout happened while the request was in flight, the
/// epoch no longer matches and the stale 401 is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCredentials {
    pub token: Option<String>,
    pub epoch: u64,
}

#[derive(Debug)]
struct Inner {
    user: Option<Identity>,
    token: Option<String>,
    loading: bool,
    epoch: u64,
}

impl Inner {
    fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    fn clear(&mut self) {
        self.user = None;
        self.token = None;
    }
}

/// Authenticated-identity state backed by durable storage.
///
/// Shared between the API client and the UI as `Arc<SessionStore>`.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    inner: RwLock<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a store in the loading state. Call [`restore`](Self::restore) once.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            storage,
            inner: RwLock::new(Inner {
                user: None,
                token: None,
                loading: true,
                epoch: 0,
            }),
            events,
        }
    }

    /// Create a store and restore any persisted session.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Arc<Self> {
        let store = Arc::new(Self::new(storage));
        store.restore();
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore the persisted session. Returns whether the session is authenticated.
    ///
    /// A persisted identity that fails to parse is discarded along with the
    /// token. Leaves the loading phase exactly once; later calls do nothing.
    pub fn restore(&self) -> bool {
        let mut inner = self.write();
        if !inner.loading {
            warn!("Session already restored, ignoring");
            return inner.is_authenticated();
        }

        match self.read_persisted() {
            Ok(Some((user, token))) => match serde_json::from_str::<Identity>(&user) {
                Ok(user) => {
                    debug!(user_id = %user.id, "Restored session");
                    inner.user = Some(user);
                    inner.token = Some(token);
                }
                Err(e) => {
                    warn!(error = %e, "Discarding persisted session with unparseable user");
                    self.clear_storage();
                }
            },
            Ok(None) => debug!("No persisted session"),
            // Storage may be unavailable only for now; keep what it holds
            Err(e) => warn!(error = %e, "Failed to read persisted session, starting logged out"),
        }

        inner.loading = false;
        inner.is_authenticated()
    }

    /// Raw user JSON and token, if both are present and non-empty.
    fn read_persisted(&self) -> Result<Option<(String, String)>> {
        let user = self.storage.get(USER_KEY)?.filter(|s| !s.is_empty());
        let token = self.storage.get(TOKEN_KEY)?.filter(|s| !s.is_empty());
        Ok(user.zip(token))
    }

    /// Persist and activate a session from a successful login response.
    pub fn login(&self, identity: Identity, token: String) -> Result<()> {
        let mut inner = self.write();

        let user_json = serde_json::to_string(&identity)?;
        if let Err(e) = self
            .storage
            .set(USER_KEY, &user_json)
            .and_then(|()| self.storage.set(TOKEN_KEY, &token))
        {
            self.clear_storage();
            return Err(e.context("Failed to persist session"));
        }

        info!(user_id = %identity.id, "Logged in");
        inner.user = Some(identity);
        inner.token = Some(token);
        inner.epoch += 1;
        drop(inner);

        let _ = self.events.send(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Clear the session from storage and memory. Safe to call when already logged out.
    pub fn logout(&self) -> Result<()> {
        let mut inner = self.write();

        let result = self
            .storage
            .remove(USER_KEY)
            .and(self.storage.remove(TOKEN_KEY))
            .context("Failed to clear persisted session");

        if inner.is_authenticated() {
            info!("Logged out");
            inner.clear();
            inner.epoch += 1;
            drop(inner);
            let _ = self.events.send(SessionEvent::LoggedOut);
        }

        result
    }

    /// Evict the session after the server rejected a request sent under `epoch`.
    ///
    /// Returns `true` if this call evicted the session and sent
    /// [`SessionEvent::Expired`]; `false` if the session has changed since the
    /// request was sent.
    pub fn expire(&self, epoch: u64) -> bool {
        let mut inner = self.write();
        if inner.epoch != epoch {
            debug!(request_epoch = epoch, current_epoch = inner.epoch, "Ignoring stale 401");
            return false;
        }

        warn!(was_authenticated = inner.is_authenticated(), "Server rejected credentials, evicting session");
        self.clear_storage();
        inner.clear();
        inner.epoch += 1;
        drop(inner);

        let _ = self.events.send(SessionEvent::Expired);
        true
    }

    fn clear_storage(&self) {
        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear persisted session key");
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn state(&self) -> SessionState {
        let inner = self.read();
        SessionState {
            user: inner.user.clone(),
            token: inner.token.clone(),
            is_authenticated: inner.is_authenticated(),
            loading: inner.loading,
        }
    }

    /// Snapshot the token and epoch for an outgoing request.
    pub fn request_credentials(&self) -> RequestCredentials {
        let inner = self.read();
        RequestCredentials {
            token: inner.token.clone(),
            epoch: inner.epoch,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
