//! services/client/src/feed.rs
//!
//! The feed synchronizer: keeps a paginated, filterable collection in step
//! with the server. Page 1 (or a filter change) replaces the collection, later
//! pages append and deduplicate, and an infinite-scroll sentinel pulls the
//! next page. Each filter generation owns a `CancellationToken`; resetting the
//! feed cancels it so loads for old filters resolve as stale.

use async_trait::async_trait;
use marketplace_core::domain::{Car, CarFilters};
use marketplace_core::paging::{Identified, PagedCollection};
use marketplace_core::ports::{Notifier, PortResult};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::MarketplaceApi;

//=========================================================================================
// Page Sources
//=========================================================================================

/// One page as returned by a source.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: Option<u32>,
}

#[async_trait]
pub trait PageSource<T>: Send + Sync {
    type Filters: Clone + PartialEq + Debug + Send + Sync;

    async fn fetch_page(&self, filters: &Self::Filters, page: u32, limit: u32) -> PortResult<Page<T>>;
}

/// The public car feed, `GET /cars`.
pub struct CarFeedSource {
    api: MarketplaceApi,
}

impl CarFeedSource {
    pub fn new(api: MarketplaceApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Car> for CarFeedSource {
    type Filters = CarFilters;

    async fn fetch_page(&self, filters: &CarFilters, page: u32, limit: u32) -> PortResult<Page<Car>> {
        self.api.list_cars(filters, page, limit).await
    }
}

/// The signed-in user's favorites, `GET /favorites`.
pub struct FavoritesSource {
    api: MarketplaceApi,
}

impl FavoritesSource {
    pub fn new(api: MarketplaceApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Car> for FavoritesSource {
    type Filters = ();

    async fn fetch_page(&self, _filters: &(), page: u32, limit: u32) -> PortResult<Page<Car>> {
        self.api.list_favorites(page, limit).await
    }
}

/// One seller's listings on their public page.
pub struct SellerListingsSource {
    api: MarketplaceApi,
    seller_id: String,
}

impl SellerListingsSource {
    pub fn new(api: MarketplaceApi, seller_id: impl Into<String>) -> Self {
        Self {
            api,
            seller_id: seller_id.into(),
        }
    }
}

#[async_trait]
impl PageSource<Car> for SellerListingsSource {
    type Filters = CarFilters;

    async fn fetch_page(&self, filters: &CarFilters, page: u32, limit: u32) -> PortResult<Page<Car>> {
        let scoped = CarFilters {
            seller_id: Some(self.seller_id.clone()),
            ..filters.clone()
        };
        self.api.list_cars(&scoped, page, limit).await
    }
}

//=========================================================================================
// Feed
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged into the collection.
    Loaded { page: u32, received: usize },
    /// Nothing to do: already loading, or no more pages.
    Skipped,
    /// The response belonged to filters (or a mount) that are gone.
    Stale,
}

struct FeedState<T, F> {
    collection: PagedCollection<T>,
    filters: F,
    generation: u64,
    loading: bool,
    cancel: CancellationToken,
}

struct Ticket<F> {
    filters: F,
    page: u32,
    replace: bool,
    generation: u64,
    cancel: CancellationToken,
}

pub struct Feed<T, S: PageSource<T>> {
    source: S,
    notifier: Arc<dyn Notifier>,
    label: String,
    limit: u32,
    state: Mutex<FeedState<T, S::Filters>>,
}

impl<T, S> Feed<T, S>
where
    T: Identified + Clone + Send,
    S: PageSource<T>,
{
    pub fn new(
        source: S,
        notifier: Arc<dyn Notifier>,
        label: impl Into<String>,
        limit: u32,
        filters: S::Filters,
    ) -> Self {
        Self {
            source,
            notifier,
            label: label.into(),
            limit: limit.max(1),
            state: Mutex::new(FeedState {
                collection: PagedCollection::new(),
                filters,
                generation: 0,
                loading: false,
                cancel: CancellationToken::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState<T, S::Filters>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetches `page` for `filters`. Page 1 or a filter change replaces the
    /// collection and starts a new generation; later pages append.
    pub async fn fetch(&self, filters: S::Filters, page: u32) -> PortResult<FetchOutcome> {
        let ticket = {
            let mut state = self.lock();
            let replace = page <= 1 || state.filters != filters;
            if replace {
                Self::start_generation(&mut state, filters.clone());
            }
            state.loading = true;
            Ticket {
                filters,
                page: if replace { 1 } else { page },
                replace,
                generation: state.generation,
                cancel: state.cancel.clone(),
            }
        };
        self.run(ticket).await
    }

    /// Applies new filters. Unchanged filters on a loaded feed are a no-op.
    pub async fn set_filters(&self, filters: S::Filters) -> PortResult<FetchOutcome> {
        {
            let state = self.lock();
            if state.filters == filters && state.collection.page() > 0 {
                return Ok(FetchOutcome::Skipped);
            }
        }
        self.fetch(filters, 1).await
    }

    /// Reloads page 1 for the current filters.
    pub async fn refresh(&self) -> PortResult<FetchOutcome> {
        let filters = self.filters();
        self.fetch(filters, 1).await
    }

    /// Loads the next page unless one is already loading or the feed is exhausted.
    pub async fn load_next(&self) -> PortResult<FetchOutcome> {
        let ticket = {
            let mut state = self.lock();
            if state.loading || !state.collection.has_more() {
                return Ok(FetchOutcome::Skipped);
            }
            let page = state.collection.page() + 1;
            let replace = page == 1;
            state.loading = true;
            Ticket {
                filters: state.filters.clone(),
                page,
                replace,
                generation: state.generation,
                cancel: state.cancel.clone(),
            }
        };
        self.run(ticket).await
    }

    /// The infinite-scroll trigger: the sentinel after the last rendered item
    /// became visible.
    pub async fn on_sentinel_visible(&self) -> PortResult<FetchOutcome> {
        self.load_next().await
    }

    /// Stops consuming results. In-flight loads resolve as stale.
    pub fn unmount(&self) {
        let mut state = self.lock();
        state.cancel.cancel();
        state.generation += 1;
        state.loading = false;
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().collection.items().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().collection.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.lock().collection.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn page(&self) -> u32 {
        self.lock().collection.page()
    }

    pub fn filters(&self) -> S::Filters {
        self.lock().filters.clone()
    }

    /// Patches the local collection in place, e.g. after a write elsewhere.
    pub fn update<R>(&self, f: impl FnOnce(&mut PagedCollection<T>) -> R) -> R {
        f(&mut self.lock().collection)
    }

    //-------------------------------------------------------------------------------------

    fn start_generation(state: &mut FeedState<T, S::Filters>, filters: S::Filters) {
        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        state.generation += 1;
        state.filters = filters;
        state.collection.clear();
    }

    async fn run(&self, ticket: Ticket<S::Filters>) -> PortResult<FetchOutcome> {
        let result = tokio::select! {
            biased;
            _ = ticket.cancel.cancelled() => {
                debug!("{} page {} cancelled", self.label, ticket.page);
                let mut state = self.lock();
                // A newer generation owns the flag; only clear our own.
                if state.generation == ticket.generation {
                    state.loading = false;
                }
                return Ok(FetchOutcome::Stale);
            }
            result = self.source.fetch_page(&ticket.filters, ticket.page, self.limit) => result,
        };

        let mut state = self.lock();
        if state.generation != ticket.generation {
            debug!("Dropping stale {} page {}", self.label, ticket.page);
            return Ok(FetchOutcome::Stale);
        }
        state.loading = false;

        match result {
            Ok(page) => {
                let received = page.items.len();
                if ticket.replace {
                    state.collection.replace(page.items, self.limit, page.total_pages);
                } else {
                    state
                        .collection
                        .append(ticket.page, page.items, self.limit, page.total_pages);
                }
                debug!(
                    "{} page {}: {} items, has_more={}",
                    self.label,
                    ticket.page,
                    received,
                    state.collection.has_more()
                );
                Ok(FetchOutcome::Loaded {
                    page: ticket.page,
                    received,
                })
            }
            Err(e) => {
                drop(state);
                warn!("Failed to load {} page {}: {}", self.label, ticket.page, e);
                self.notifier.error(&format!("Failed to load {}", self.label));
                Err(e)
            }
        }
    }
}
