//! services/client/src/api/admin.rs
//!
//! Admin endpoints: the moderation queues and the destructive writes the
//! moderation coordinator fires once an action is confirmed.

use marketplace_core::domain::{CarStatus, Report, TagStat};
use marketplace_core::ports::{ApiRequest, PortResult};
use serde_json::json;

use super::wire::{HideResponse, PageBody, ReportRecord, TagStatRecord};
use super::{path_segment, MarketplaceApi};

impl MarketplaceApi {
    /// GET /reports
    pub async fn list_reports(&self) -> PortResult<Vec<Report>> {
        let body: PageBody<ReportRecord> = self.client.get_json(ApiRequest::get("/reports")).await?;
        Ok(body
            .into_parts()
            .0
            .into_iter()
            .map(ReportRecord::to_domain)
            .collect())
    }

    /// GET /cars/admin/tags-stats
    pub async fn tag_stats(&self) -> PortResult<Vec<TagStat>> {
        let body: PageBody<TagStatRecord> = self
            .client
            .get_json(ApiRequest::get("/cars/admin/tags-stats"))
            .await?;
        Ok(body
            .into_parts()
            .0
            .into_iter()
            .map(TagStatRecord::to_domain)
            .collect())
    }

    /// PATCH /cars/:id/hide - toggles visibility. Returns the status the
    /// server reports, when it reports one.
    pub async fn toggle_car_hidden(&self, car_id: &str) -> PortResult<Option<CarStatus>> {
        let path = format!("/cars/{}/hide", path_segment(car_id));
        let response = self.client.send_ok(ApiRequest::patch(path)).await?;
        let status = response
            .json::<HideResponse>()
            .ok()
            .and_then(|body| body.status)
            .and_then(|raw| CarStatus::parse(&raw));
        Ok(status)
    }

    /// PATCH /reports/:id/ignore
    pub async fn ignore_report(&self, report_id: &str) -> PortResult<()> {
        let path = format!("/reports/{}/ignore", path_segment(report_id));
        self.client.send_ok(ApiRequest::patch(path)).await?;
        Ok(())
    }

    /// PATCH /reports/:id/resolve, optionally deleting the reported listing.
    pub async fn resolve_report(&self, report_id: &str, delete_car: bool) -> PortResult<()> {
        let path = format!("/reports/{}/resolve", path_segment(report_id));
        let request = ApiRequest::patch(path).json(json!({ "deleteCar": delete_car }));
        self.client.send_ok(request).await?;
        Ok(())
    }

    /// PATCH /users/:id/ban
    pub async fn set_user_banned(&self, user_id: &str, banned: bool) -> PortResult<()> {
        let path = format!("/users/{}/ban", path_segment(user_id));
        let request = ApiRequest::patch(path).json(json!({ "isBanned": banned }));
        self.client.send_ok(request).await?;
        Ok(())
    }

    /// DELETE /cars/admin/tags/:tag. With `penalize`, the server also bans
    /// the sellers using the tag and deletes their tagged listings.
    pub async fn delete_tag(&self, tag: &str, penalize: bool) -> PortResult<()> {
        let path = format!("/cars/admin/tags/{}", path_segment(tag));
        let request = ApiRequest::delete(path).query("penalize", penalize);
        self.client.send_ok(request).await?;
        Ok(())
    }

    /// PATCH /cars/admin/tags - renames a tag on every listing.
    pub async fn rename_tag(&self, old_tag: &str, new_tag: &str) -> PortResult<()> {
        let request = ApiRequest::patch("/cars/admin/tags")
            .json(json!({ "oldTag": old_tag, "newTag": new_tag }));
        self.client.send_ok(request).await?;
        Ok(())
    }
}
