//! services/client/src/session.rs
//!
//! The session store: holds the token pair and the loaded profile, mirrors
//! them into durable client storage, and degrades every authentication
//! failure to "logged out" instead of surfacing it.

use marketplace_core::domain::{Session, UserProfile};
use marketplace_core::ports::{
    ApiRequest, HttpTransport, KeyValueStore, PortError, PortResult, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY, SESSION_BLOB_KEY,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::wire::{StoredSession, UserRecord};

pub const PROFILE_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

pub struct SessionStore {
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Session>,
}

impl SessionStore {
    pub fn new(transport: Arc<dyn HttpTransport>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            transport,
            storage,
            state: RwLock::new(Session::logged_out()),
        }
    }

    /// Loads tokens and the persisted session blob from durable storage.
    /// No network traffic; call `fetch_user` afterwards to validate.
    pub async fn restore(&self) -> Session {
        let access_token = self.read_key(ACCESS_TOKEN_KEY).await;
        let refresh_token = self.read_key(REFRESH_TOKEN_KEY).await;
        let blob = self
            .read_key(SESSION_BLOB_KEY)
            .await
            .and_then(|raw| match serde_json::from_str::<StoredSession>(&raw) {
                Ok(blob) => Some(blob),
                Err(e) => {
                    warn!("Ignoring unreadable session blob: {}", e);
                    None
                }
            });

        // A cached profile is only trusted alongside a token.
        let user = match (&access_token, blob) {
            (Some(_), Some(blob)) if blob.is_authenticated => blob.user.map(UserRecord::to_domain),
            _ => None,
        };

        let mut state = self.state.write().await;
        state.access_token = access_token;
        state.refresh_token = refresh_token;
        state.user = user;
        state.is_authenticated = state.user.is_some();
        debug!(
            "Session restored (token: {}, user: {})",
            state.access_token.is_some(),
            state.user.is_some()
        );
        state.clone()
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_admin(&self) -> bool {
        self.state.read().await.is_admin()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    /// The refresh token, adopting the stored one into memory when needed.
    pub async fn refresh_token(&self) -> Option<String> {
        if let Some(token) = self.state.read().await.refresh_token.clone() {
            return Some(token);
        }
        let token = self.read_key(REFRESH_TOKEN_KEY).await?;
        let mut state = self.state.write().await;
        Some(state.refresh_token.get_or_insert(token).clone())
    }

    /// Persists both tokens and marks the session authenticated. The token
    /// contents are not inspected.
    pub async fn set_tokens(&self, access: &str, refresh: &str) -> PortResult<()> {
        {
            let mut state = self.state.write().await;
            state.access_token = Some(access.to_string());
            state.refresh_token = Some(refresh.to_string());
            state.is_authenticated = true;
        }
        self.storage.set(ACCESS_TOKEN_KEY, access).await?;
        self.storage.set(REFRESH_TOKEN_KEY, refresh).await?;
        Ok(())
    }

    /// Rotates only the access token. Refresh token and user stay as they are.
    pub async fn update_access_token(&self, token: &str) {
        self.state.write().await.access_token = Some(token.to_string());
        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, token).await {
            warn!("Failed to persist rotated access token: {}", e);
        }
    }

    /// Installs an access token minted from `refresh`, but only while `refresh`
    /// is still the session's refresh token. Returns false when the session
    /// was cleared or replaced in the meantime; nothing is written then.
    pub async fn rotate_access_token(&self, token: &str, refresh: &str) -> bool {
        // Held across the write so a concurrent `clear` runs strictly before or after.
        let mut state = self.state.write().await;
        if state.refresh_token.as_deref() != Some(refresh) {
            debug!("Discarding rotated access token for a session that is gone");
            return false;
        }
        state.access_token = Some(token.to_string());
        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, token).await {
            warn!("Failed to persist rotated access token: {}", e);
        }
        true
    }

    /// Login callback: store the pair handed over by the provider, then load the profile.
    pub async fn complete_login(&self, access: &str, refresh: &str) -> PortResult<Session> {
        self.set_tokens(access, refresh).await?;
        let session = self.fetch_user().await;
        if session.is_authenticated {
            info!("Login completed");
            Ok(session)
        } else {
            Err(PortError::Unauthorized)
        }
    }

    /// Loads the profile for the current token. Never fails: without a token
    /// the session is logged out with no network call, and any failure of the
    /// profile request clears the session.
    pub async fn fetch_user(&self) -> Session {
        let Some(token) = self.current_access_token().await else {
            return self.mark_anonymous().await;
        };

        let request = ApiRequest::get(PROFILE_PATH).with_bearer(Some(token));
        let result = match self.transport.send(request).await {
            Ok(response) => response
                .into_result()
                .and_then(|response| response.json::<UserRecord>()),
            Err(e) => Err(e),
        };
        self.apply_profile(result.map(UserRecord::to_domain)).await
    }

    /// Applies the outcome of a profile request to the session.
    pub async fn apply_profile(&self, result: PortResult<UserProfile>) -> Session {
        match result {
            Ok(user) => {
                let snapshot = {
                    let mut state = self.state.write().await;
                    state.user = Some(user);
                    state.is_authenticated = true;
                    state.clone()
                };
                self.persist_blob(&snapshot).await;
                snapshot
            }
            Err(e) => {
                warn!("Profile fetch failed, clearing session: {}", e);
                self.clear().await;
                self.snapshot().await
            }
        }
    }

    /// Best-effort server-side logout, then unconditional local cleanup.
    pub async fn logout(&self) {
        let (access, refresh) = {
            let state = self.state.read().await;
            (state.access_token.clone(), state.refresh_token.clone())
        };

        let mut request = ApiRequest::post(LOGOUT_PATH).with_bearer(access);
        if let Some(refresh) = refresh {
            request = request.json(serde_json::json!({ "refreshToken": refresh }));
        }
        match self.transport.send(request).await.and_then(|r| r.into_result()) {
            Ok(_) => debug!("Server-side logout succeeded"),
            Err(e) => warn!("Server-side logout failed, clearing local session anyway: {}", e),
        }

        self.clear().await;
        info!("Logged out");
    }

    /// Drops tokens and user from memory and from durable storage.
    pub async fn clear(&self) {
        *self.state.write().await = Session::logged_out();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_BLOB_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                warn!("Failed to remove {} from storage: {}", key, e);
            }
        }
    }

    //-------------------------------------------------------------------------------------

    /// The in-memory access token, falling back to durable storage (which is
    /// then adopted into memory together with the refresh token).
    async fn current_access_token(&self) -> Option<String> {
        if let Some(token) = self.access_token().await {
            return Some(token);
        }
        let token = self.read_key(ACCESS_TOKEN_KEY).await?;
        let refresh = self.read_key(REFRESH_TOKEN_KEY).await;
        let mut state = self.state.write().await;
        state.access_token = Some(token.clone());
        if state.refresh_token.is_none() {
            state.refresh_token = refresh;
        }
        Some(token)
    }

    async fn mark_anonymous(&self) -> Session {
        let mut state = self.state.write().await;
        state.user = None;
        state.is_authenticated = false;
        state.clone()
    }

    async fn persist_blob(&self, session: &Session) {
        let blob = StoredSession {
            user: session.user.as_ref().map(UserRecord::from_domain),
            is_authenticated: session.is_authenticated,
        };
        match serde_json::to_string(&blob) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(SESSION_BLOB_KEY, &raw).await {
                    warn!("Failed to persist session blob: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize session blob: {}", e),
        }
    }

    async fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("Failed to read {} from storage: {}", key, e);
                None
            }
        }
    }
}
