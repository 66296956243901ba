//! The marketplace client: session handling, authenticated requests, feeds
//! and admin moderation on top of the `marketplace_core` ports.

pub mod adapters;
pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod moderation;
pub mod request;
pub mod session;
pub mod state;

pub use feed::{Feed, FetchOutcome, Page, PageSource};
pub use moderation::{ModerationAction, ModerationBoard, ModerationCoordinator, PendingModeration};
pub use request::{AuthenticatedClient, RefreshCoordinator};
pub use session::SessionStore;
pub use state::AppState;
