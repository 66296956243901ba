//! services/client/src/moderation.rs
//!
//! The moderation coordinator. Destructive admin actions are two-step: `prompt`
//! produces a `PendingModeration` that names the target and the confirmation
//! text, and only `confirm` sends the request. After the server accepts the
//! write, the affected items of the local `ModerationBoard` are patched in
//! place; on failure the board is left untouched and an error toast is shown.

use marketplace_core::domain::{
    Car, CarFilters, CarStatus, ModerationTarget, Report, ReportStatus, TagStat,
};
use marketplace_core::paging::PagedCollection;
use marketplace_core::ports::{Notifier, PortError, PortResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::MarketplaceApi;

//=========================================================================================
// Actions & Local State
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    /// Hide an available listing, or unhide a hidden one.
    ToggleHide { car_id: String },
    IgnoreReport { report_id: String },
    /// Resolve a report, optionally deleting the reported listing.
    ResolveReport { report_id: String, delete_listing: bool },
    /// Ban or unban a user (a reporter or a seller).
    BanUser { user_id: String, ban: bool },
    /// Delete a tag. With `penalize`, its sellers are banned and their tagged
    /// listings deleted.
    DeleteTag { tag: String, penalize: bool },
    RenameTag { from: String, to: String },
}

impl ModerationAction {
    pub fn target(&self) -> ModerationTarget {
        match self {
            ModerationAction::ToggleHide { car_id } => ModerationTarget::Car(car_id.clone()),
            ModerationAction::IgnoreReport { report_id }
            | ModerationAction::ResolveReport { report_id, .. } => {
                ModerationTarget::Report(report_id.clone())
            }
            ModerationAction::BanUser { user_id, .. } => ModerationTarget::User(user_id.clone()),
            ModerationAction::DeleteTag { tag, .. } => ModerationTarget::Tag(tag.clone()),
            ModerationAction::RenameTag { from, .. } => ModerationTarget::Tag(from.clone()),
        }
    }

    fn confirmation(&self) -> String {
        match self {
            ModerationAction::ToggleHide { car_id } => {
                format!("Change the visibility of listing {}?", car_id)
            }
            ModerationAction::IgnoreReport { report_id } => format!("Ignore report {}?", report_id),
            ModerationAction::ResolveReport {
                report_id,
                delete_listing: true,
            } => format!("Resolve report {} and delete the reported listing?", report_id),
            ModerationAction::ResolveReport { report_id, .. } => {
                format!("Mark report {} as resolved?", report_id)
            }
            ModerationAction::BanUser { user_id, ban: true } => format!("Ban user {}?", user_id),
            ModerationAction::BanUser { user_id, .. } => format!("Lift the ban on user {}?", user_id),
            ModerationAction::DeleteTag { tag, penalize: true } => format!(
                "Delete tag '{}', ban every seller using it and delete their tagged listings?",
                tag
            ),
            ModerationAction::DeleteTag { tag, .. } => format!("Delete tag '{}'?", tag),
            ModerationAction::RenameTag { from, to } => format!("Rename tag '{}' to '{}'?", from, to),
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            ModerationAction::ToggleHide { .. } => "Listing visibility updated",
            ModerationAction::IgnoreReport { .. } => "Report ignored",
            ModerationAction::ResolveReport { .. } => "Report resolved",
            ModerationAction::BanUser { ban: true, .. } => "User banned",
            ModerationAction::BanUser { .. } => "User unbanned",
            ModerationAction::DeleteTag { .. } => "Tag deleted",
            ModerationAction::RenameTag { .. } => "Tag renamed",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            ModerationAction::ToggleHide { .. } => "Failed to update listing visibility",
            ModerationAction::IgnoreReport { .. } => "Failed to ignore report",
            ModerationAction::ResolveReport { .. } => "Failed to resolve report",
            ModerationAction::BanUser { .. } => "Failed to update user ban",
            ModerationAction::DeleteTag { .. } => "Failed to delete tag",
            ModerationAction::RenameTag { .. } => "Failed to rename tag",
        }
    }

    fn validate(&self) -> PortResult<()> {
        let blank = |value: &str| value.trim().is_empty();
        let invalid = match self {
            ModerationAction::ToggleHide { car_id } => blank(car_id).then_some("Missing listing"),
            ModerationAction::IgnoreReport { report_id }
            | ModerationAction::ResolveReport { report_id, .. } => {
                blank(report_id).then_some("Missing report")
            }
            ModerationAction::BanUser { user_id, .. } => blank(user_id).then_some("Missing user"),
            ModerationAction::DeleteTag { tag, .. } => blank(tag).then_some("Missing tag"),
            ModerationAction::RenameTag { from, to } => {
                if blank(from) || blank(to) {
                    Some("Both the old and the new tag name are required")
                } else if from.trim() == to.trim() {
                    Some("The new tag name is the same as the old one")
                } else {
                    None
                }
            }
        };
        match invalid {
            Some(message) => Err(PortError::Validation(message.to_string())),
            None => Ok(()),
        }
    }
}

/// The admin views' local state that confirmed actions patch.
#[derive(Debug, Default)]
pub struct ModerationBoard {
    pub cars: PagedCollection<Car>,
    pub reports: PagedCollection<Report>,
    pub tags: Vec<TagStat>,
}

impl ModerationBoard {
    pub fn tag(&self, name: &str) -> Option<&TagStat> {
        self.tags.iter().find(|t| t.tag.eq_ignore_ascii_case(name))
    }
}

/// An action awaiting the admin's confirmation. Dropping it cancels.
#[must_use = "a pending moderation does nothing until confirmed"]
#[derive(Debug)]
pub struct PendingModeration {
    action: ModerationAction,
    target: ModerationTarget,
    message: String,
}

impl PendingModeration {
    pub fn action(&self) -> &ModerationAction {
        &self.action
    }

    pub fn target(&self) -> &ModerationTarget {
        &self.target
    }

    /// The text to show in the confirmation prompt.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub target: ModerationTarget,
    /// How many local items the patch touched.
    pub patched: usize,
}

/// What the server told us beyond "ok".
enum Effect {
    None,
    CarStatus(Option<CarStatus>),
}

//=========================================================================================
// Coordinator
//=========================================================================================

pub struct ModerationCoordinator {
    api: MarketplaceApi,
    notifier: Arc<dyn Notifier>,
}

impl ModerationCoordinator {
    pub fn new(api: MarketplaceApi, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Loads the moderation queues: the first page of listings, open reports
    /// and tag statistics.
    pub async fn load_board(&self, car_limit: u32) -> PortResult<ModerationBoard> {
        let filters = CarFilters::default();
        let (cars, reports, tags) = futures::try_join!(
            self.api.list_cars(&filters, 1, car_limit),
            self.api.list_reports(),
            self.api.tag_stats(),
        )?;

        let mut board = ModerationBoard {
            reports: PagedCollection::from_items(reports),
            tags,
            ..Default::default()
        };
        board.cars.replace(cars.items, car_limit, cars.total_pages);
        Ok(board)
    }

    /// First step of every action: validates it and returns the prompt to
    /// confirm. No request is sent.
    pub fn prompt(&self, action: ModerationAction) -> PortResult<PendingModeration> {
        if let Err(e) = action.validate() {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        let pending = PendingModeration {
            target: action.target(),
            message: action.confirmation(),
            action,
        };
        debug!("Awaiting confirmation for {}", pending.target);
        Ok(pending)
    }

    pub fn cancel(&self, pending: PendingModeration) {
        debug!("Moderation on {} cancelled", pending.target);
    }

    /// Sends the confirmed action and, once the server accepts it, patches the
    /// affected items of `board`. A failure leaves `board` exactly as it was.
    pub async fn confirm(
        &self,
        pending: PendingModeration,
        board: &mut ModerationBoard,
    ) -> PortResult<ModerationOutcome> {
        let PendingModeration { action, target, .. } = pending;

        // Resolved before the write, while the report is certainly still listed.
        let reported_car = match &action {
            ModerationAction::ResolveReport { report_id, .. } => {
                board.reports.get(report_id).map(|r| r.car_id.clone())
            }
            _ => None,
        };

        let effect = match self.execute(&action).await {
            Ok(effect) => effect,
            Err(e) => {
                warn!("Moderation on {} failed: {}", target, e);
                self.notifier.error(action.failure_message());
                return Err(e);
            }
        };

        let patched = apply(board, &action, effect, reported_car.as_deref());
        info!("Moderation on {} applied, {} local items patched", target, patched);
        self.notifier.success(action.success_message());
        Ok(ModerationOutcome { target, patched })
    }

    async fn execute(&self, action: &ModerationAction) -> PortResult<Effect> {
        match action {
            ModerationAction::ToggleHide { car_id } => self
                .api
                .toggle_car_hidden(car_id)
                .await
                .map(Effect::CarStatus),
            ModerationAction::IgnoreReport { report_id } => {
                self.api.ignore_report(report_id).await.map(|_| Effect::None)
            }
            ModerationAction::ResolveReport {
                report_id,
                delete_listing,
            } => self
                .api
                .resolve_report(report_id, *delete_listing)
                .await
                .map(|_| Effect::None),
            ModerationAction::BanUser { user_id, ban } => self
                .api
                .set_user_banned(user_id, *ban)
                .await
                .map(|_| Effect::None),
            ModerationAction::DeleteTag { tag, penalize } => {
                self.api.delete_tag(tag, *penalize).await.map(|_| Effect::None)
            }
            ModerationAction::RenameTag { from, to } => self
                .api
                .rename_tag(from.trim(), to.trim())
                .await
                .map(|_| Effect::None),
        }
    }
}

//=========================================================================================
// Local Patches
//=========================================================================================

fn apply(
    board: &mut ModerationBoard,
    action: &ModerationAction,
    effect: Effect,
    reported_car: Option<&str>,
) -> usize {
    match action {
        ModerationAction::ToggleHide { car_id } => {
            let reported = match effect {
                Effect::CarStatus(status) => status,
                Effect::None => None,
            };
            let patched = board.cars.patch(car_id, |car| {
                car.status = reported.unwrap_or_else(|| car.status.toggled_visibility());
            });
            usize::from(patched)
        }
        ModerationAction::IgnoreReport { report_id } => {
            usize::from(board.reports.patch(report_id, |r| r.status = ReportStatus::Ignored))
        }
        ModerationAction::ResolveReport {
            report_id,
            delete_listing,
        } => {
            let mut patched =
                usize::from(board.reports.patch(report_id, |r| r.status = ReportStatus::Resolved));
            if let (true, Some(car_id)) = (*delete_listing, reported_car) {
                patched += usize::from(board.cars.remove(car_id).is_some());
                // The listing is gone, so its other open reports are settled too.
                patched += board.reports.patch_where(
                    |r| r.car_id == car_id && r.status == ReportStatus::Pending,
                    |r| r.status = ReportStatus::Resolved,
                );
            }
            patched
        }
        ModerationAction::BanUser { user_id, ban } => {
            let reports = board
                .reports
                .patch_where(|r| r.reporter.id == *user_id, |r| r.reporter.is_banned = *ban);
            let cars = board.cars.patch_where(
                |c| c.is_sold_by(user_id),
                |c| {
                    if let Some(seller) = c.seller.as_mut() {
                        seller.is_selling_banned = *ban;
                    }
                },
            );
            reports + cars
        }
        ModerationAction::DeleteTag { tag, penalize } => {
            let before = board.tags.len();
            board.tags.retain(|t| !t.tag.eq_ignore_ascii_case(tag));
            let mut patched = before - board.tags.len();

            if *penalize {
                let sellers: HashSet<String> = board
                    .cars
                    .items()
                    .iter()
                    .filter(|c| c.has_tag(tag))
                    .filter_map(|c| c.seller.as_ref().map(|s| s.id.clone()))
                    .collect();
                // Deleted listings no longer count towards their other tags.
                let other_tags: Vec<String> = board
                    .cars
                    .items()
                    .iter()
                    .filter(|c| c.has_tag(tag))
                    .flat_map(|c| c.tags.iter().filter(|t| !t.eq_ignore_ascii_case(tag)).cloned())
                    .collect();
                for other in &other_tags {
                    if let Some(stat) = board.tags.iter_mut().find(|t| t.tag.eq_ignore_ascii_case(other)) {
                        stat.car_count = stat.car_count.saturating_sub(1);
                    }
                }
                board.tags.retain(|t| t.car_count > 0);
                patched += board.cars.retain(|c| !c.has_tag(tag));
                patched += board.cars.patch_where(
                    |c| c.seller.as_ref().is_some_and(|s| sellers.contains(&s.id)),
                    |c| {
                        if let Some(seller) = c.seller.as_mut() {
                            seller.is_selling_banned = true;
                        }
                    },
                );
            } else {
                patched += board.cars.patch_where(
                    |c| c.has_tag(tag),
                    |c| c.tags.retain(|t| !t.eq_ignore_ascii_case(tag)),
                );
            }
            patched
        }
        ModerationAction::RenameTag { from, to } => {
            let (from, to) = (from.trim(), to.trim());
            let mut patched = 0;
            if let Some(index) = board.tags.iter().position(|t| t.tag.eq_ignore_ascii_case(from)) {
                let renamed = board.tags.remove(index);
                match board.tags.iter().position(|t| t.tag.eq_ignore_ascii_case(to)) {
                    Some(existing) => board.tags[existing].car_count += renamed.car_count,
                    None => board.tags.insert(
                        index,
                        TagStat {
                            tag: to.to_string(),
                            car_count: renamed.car_count,
                        },
                    ),
                }
                patched += 1;
            }
            patched += board.cars.patch_where(
                |c| c.has_tag(from),
                |c| {
                    c.tags.retain(|t| !t.eq_ignore_ascii_case(from));
                    if !c.has_tag(to) {
                        c.tags.push(to.to_string());
                    }
                },
            );
            patched
        }
    }
}
