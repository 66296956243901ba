//! services/client/src/api/users.rs

use marketplace_core::domain::{PublicProfile, UserProfile};
use marketplace_core::ports::{ApiRequest, PortResult};

use super::wire::{PublicProfileRecord, UserRecord};
use super::{path_segment, MarketplaceApi};

impl MarketplaceApi {
    /// GET /users/me - the signed-in user's own account.
    pub async fn me(&self) -> PortResult<UserProfile> {
        self.client
            .get_json::<UserRecord>(ApiRequest::get("/users/me"))
            .await
            .map(UserRecord::to_domain)
    }

    /// GET /users/:id/public - a seller's public page header.
    pub async fn public_profile(&self, user_id: &str) -> PortResult<PublicProfile> {
        let path = format!("/users/{}/public", path_segment(user_id));
        self.client
            .get_json::<PublicProfileRecord>(ApiRequest::get(path))
            .await
            .map(PublicProfileRecord::to_domain)
    }

    /// GET /users/:id/profile - the full profile, as seen by admins.
    pub async fn user_profile(&self, user_id: &str) -> PortResult<UserProfile> {
        let path = format!("/users/{}/profile", path_segment(user_id));
        self.client
            .get_json::<UserRecord>(ApiRequest::get(path))
            .await
            .map(UserRecord::to_domain)
    }
}
