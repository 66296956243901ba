//! services/client/src/state.rs
//!
//! Defines the application shell's shared state: one instance of every
//! collaborator, created once at startup and handed to each view.

use crate::adapters::{FileStore, ReqwestTransport, ToastHub};
use crate::api::MarketplaceApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::feed::{CarFeedSource, FavoritesSource, Feed, SellerListingsSource};
use crate::moderation::ModerationCoordinator;
use crate::request::AuthenticatedClient;
use crate::session::SessionStore;
use marketplace_core::domain::{Car, CarFilters};
use marketplace_core::ports::{HttpTransport, KeyValueStore, Notifier};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Views)
//=========================================================================================

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub session: Arc<SessionStore>,
    pub client: Arc<AuthenticatedClient>,
    pub api: MarketplaceApi,
    pub toasts: Arc<ToastHub>,
}

impl AppState {
    /// Wires the state from explicit ports. Tests use this with fakes.
    pub fn with_ports(
        config: Arc<ClientConfig>,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn KeyValueStore>,
        toasts: Arc<ToastHub>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(transport.clone(), storage));
        let client = Arc::new(AuthenticatedClient::new(transport, session.clone()));
        let api = MarketplaceApi::new(client.clone());
        Self {
            config,
            session,
            client,
            api,
            toasts,
        }
    }

    /// Wires the production adapters: reqwest over HTTP and a JSON file store.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::from_config(&config)?);
        let storage = Arc::new(FileStore::new(config.storage_path.clone()));
        Ok(Self::with_ports(
            Arc::new(config),
            transport,
            storage,
            Arc::new(ToastHub::new()),
        ))
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.toasts.clone()
    }

    pub fn car_feed(&self, filters: CarFilters) -> Feed<Car, CarFeedSource> {
        Feed::new(
            CarFeedSource::new(self.api.clone()),
            self.notifier(),
            "listings",
            self.config.feed_page_size,
            filters,
        )
    }

    pub fn favorites_feed(&self) -> Feed<Car, FavoritesSource> {
        Feed::new(
            FavoritesSource::new(self.api.clone()),
            self.notifier(),
            "favorites",
            self.config.feed_page_size,
            (),
        )
    }

    pub fn seller_feed(&self, seller_id: &str) -> Feed<Car, SellerListingsSource> {
        Feed::new(
            SellerListingsSource::new(self.api.clone(), seller_id),
            self.notifier(),
            "seller listings",
            self.config.feed_page_size,
            CarFilters::default(),
        )
    }

    pub fn moderation(&self) -> ModerationCoordinator {
        ModerationCoordinator::new(self.api.clone(), self.notifier())
    }
}
