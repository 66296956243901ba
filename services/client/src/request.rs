//! services/client/src/request.rs
//!
//! The authenticated request layer. Every outbound call goes through
//! `AuthenticatedClient::request`, which attaches the bearer token and turns a
//! 401 into a single shared token refresh followed by one retry.

use marketplace_core::domain::Session;
use marketplace_core::ports::{
    ApiRequest, ApiResponse, HttpTransport, PortError, PortResult,
};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::api::wire::{RefreshResponse, UserRecord};
use crate::session::{SessionStore, PROFILE_PATH};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// What a waiter receives when the refresh settles: the new access token, or
/// `None` when the refresh failed.
type Waiter = oneshot::Sender<Option<String>>;

//=========================================================================================
// Refresh Coordinator
//=========================================================================================

/// Serializes token refreshes: at most one refresh is outstanding, and every
/// caller that hits a 401 meanwhile waits for that one outcome.
#[derive(Default)]
pub struct RefreshCoordinator {
    // `Some` while a refresh is in flight; holds the queued callers.
    waiters: Mutex<Option<Vec<Waiter>>>,
    started: AtomicU64,
}

pub enum RefreshTicket<'a> {
    /// This caller performs the refresh and must settle the guard.
    Leader(LeaderGuard<'a>),
    /// Another caller is refreshing; await the outcome.
    Follower(oneshot::Receiver<Option<String>>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Waiter>>> {
        self.waiters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Joins the in-flight refresh, or becomes its leader when there is none.
    pub fn begin(&self) -> RefreshTicket<'_> {
        let mut waiters = self.lock();
        match waiters.as_mut() {
            Some(queue) => {
                let (tx, rx) = oneshot::channel();
                queue.push(tx);
                RefreshTicket::Follower(rx)
            }
            None => {
                *waiters = Some(Vec::new());
                self.started.fetch_add(1, Ordering::SeqCst);
                RefreshTicket::Leader(LeaderGuard {
                    coordinator: self,
                    settled: false,
                })
            }
        }
    }

    pub fn in_flight(&self) -> bool {
        self.lock().is_some()
    }

    /// How many refreshes have been led since construction or the last reset.
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Fails any queued callers and returns the coordinator to its initial state.
    pub fn reset(&self) {
        self.settle(None);
        self.started.store(0, Ordering::SeqCst);
    }

    fn settle(&self, outcome: Option<String>) -> usize {
        let queued = self.lock().take().unwrap_or_default();
        let released = queued.len();
        for waiter in queued {
            // A waiter that went away no longer needs the outcome.
            let _ = waiter.send(outcome.clone());
        }
        released
    }
}

/// Held by the refresh leader. Dropping it unsettled fails all waiters, so a
/// cancelled leader never strands the queue.
pub struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    pub fn settle(mut self, outcome: Option<String>) -> usize {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(None);
        }
    }
}

//=========================================================================================
// Authenticated Client
//=========================================================================================

pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
    refresh: RefreshCoordinator,
}

impl AuthenticatedClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<SessionStore>) -> Self {
        Self {
            transport,
            session,
            refresh: RefreshCoordinator::new(),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Sends `request` with the current bearer token. A 401 (other than from
    /// the refresh endpoint) triggers a token refresh and exactly one retry.
    pub async fn request(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        let sent_token = self.session.access_token().await;
        let response = self
            .transport
            .send(request.clone().with_bearer(sent_token.clone()))
            .await?;

        if response.status != 401 || request.path == REFRESH_PATH {
            return Ok(response);
        }

        debug!("{} returned 401, refreshing token", request.path);
        let token = self.fresh_token(sent_token.as_deref()).await?;
        self.transport.send(request.with_bearer(Some(token))).await
    }

    /// Like `request`, but non-2xx statuses become errors.
    pub async fn send_ok(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        self.request(request).await?.into_result()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, request: ApiRequest) -> PortResult<T> {
        self.send_ok(request).await?.json()
    }

    /// Sends a write and decodes the body of the successful response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> PortResult<T> {
        self.get_json(request).await
    }

    /// App bootstrap: restore the stored session, then validate it against the
    /// profile endpoint through the refresh-aware path.
    pub async fn bootstrap(&self) -> Session {
        let restored = self.session.restore().await;
        if restored.access_token.is_none() {
            return self.session.fetch_user().await;
        }
        let profile = self
            .get_json::<UserRecord>(ApiRequest::get(PROFILE_PATH))
            .await
            .map(UserRecord::to_domain);
        self.session.apply_profile(profile).await
    }

    /// Returns a token newer than `stale`, refreshing at most once across all
    /// concurrent callers.
    async fn fresh_token(&self, stale: Option<&str>) -> PortResult<String> {
        let guard = match self.refresh.begin() {
            RefreshTicket::Follower(outcome) => {
                return match outcome.await {
                    Ok(Some(token)) => Ok(token),
                    _ => Err(PortError::Unauthorized),
                };
            }
            RefreshTicket::Leader(guard) => guard,
        };

        // A refresh may have settled while this request was on the wire.
        if let Some(current) = self.session.access_token().await {
            if stale != Some(current.as_str()) {
                guard.settle(Some(current.clone()));
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.session.refresh_token().await else {
            warn!("No refresh token available, logging out");
            self.session.clear().await;
            guard.settle(None);
            return Err(PortError::Unauthorized);
        };

        match self.perform_refresh(&refresh_token).await {
            Ok(token) => {
                if !self.session.rotate_access_token(&token, &refresh_token).await {
                    // Logged out while the refresh was on the wire.
                    guard.settle(None);
                    return Err(PortError::Unauthorized);
                }
                let released = guard.settle(Some(token.clone()));
                info!("Access token refreshed, released {} queued requests", released);
                Ok(token)
            }
            Err(e) => {
                warn!("Token refresh failed, logging out: {}", e);
                if self.session.refresh_token().await.as_deref() == Some(refresh_token.as_str()) {
                    self.session.clear().await;
                }
                guard.settle(None);
                Err(PortError::Unauthorized)
            }
        }
    }

    async fn perform_refresh(&self, refresh_token: &str) -> PortResult<String> {
        let request = ApiRequest::post(REFRESH_PATH)
            .json(serde_json::json!({ "refreshToken": refresh_token }));
        let response: RefreshResponse = self.transport.send(request).await?.into_result()?.json()?;
        Ok(response.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn followers_share_the_leaders_outcome() {
        let coordinator = RefreshCoordinator::new();
        let leader = match coordinator.begin() {
            RefreshTicket::Leader(guard) => guard,
            RefreshTicket::Follower(_) => panic!("first caller must lead"),
        };
        let followers: Vec<_> = (0..3)
            .map(|_| match coordinator.begin() {
                RefreshTicket::Follower(rx) => rx,
                RefreshTicket::Leader(_) => panic!("refresh already in flight"),
            })
            .collect();

        assert!(coordinator.in_flight());
        assert_eq!(leader.settle(Some("new".into())), 3);
        for rx in followers {
            assert_eq!(rx.await.unwrap().as_deref(), Some("new"));
        }
        assert!(!coordinator.in_flight());
        assert_eq!(coordinator.refreshes_started(), 1);
    }

    #[tokio::test]
    async fn dropped_leader_fails_waiters() {
        let coordinator = RefreshCoordinator::new();
        let leader = coordinator.begin();
        let follower = match coordinator.begin() {
            RefreshTicket::Follower(rx) => rx,
            RefreshTicket::Leader(_) => panic!("refresh already in flight"),
        };
        drop(leader);
        assert_eq!(follower.await.unwrap(), None);
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let coordinator = RefreshCoordinator::new();
        let leader = coordinator.begin();
        let follower = match coordinator.begin() {
            RefreshTicket::Follower(rx) => rx,
            RefreshTicket::Leader(_) => panic!("refresh already in flight"),
        };
        assert!(coordinator.in_flight());

        coordinator.reset();
        assert!(!coordinator.in_flight());
        assert_eq!(coordinator.refreshes_started(), 0);
        assert_eq!(follower.await.unwrap(), None);
        drop(leader);
        assert!(matches!(coordinator.begin(), RefreshTicket::Leader(_)));
    }
}
