//! crates/marketplace_core/src/domain.rs
//!
//! Defines the pure, core data structures for the marketplace client.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Session & Users
//=========================================================================================

/// The authenticated user as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
    pub is_selling_banned: bool,
}

/// The public view of another user (seller page).
#[derive(Debug, Clone, PartialEq)]
pub struct PublicProfile {
    pub id: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub listing_count: u32,
}

/// The client-side session: the token pair plus the loaded profile.
///
/// At rest `is_authenticated` is true exactly when `user` is present. The flag
/// is set ahead of the profile only between `set_tokens` and the next profile fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
}

impl Session {
    /// A session with no tokens and no user.
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

//=========================================================================================
// Listings
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarStatus {
    Available,
    Sold,
    Hidden,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "AVAILABLE",
            CarStatus::Sold => "SOLD",
            CarStatus::Hidden => "HIDDEN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "AVAILABLE" => Some(CarStatus::Available),
            "SOLD" => Some(CarStatus::Sold),
            "HIDDEN" => Some(CarStatus::Hidden),
            _ => None,
        }
    }

    /// The status a hide toggle moves a listing to. Only available and
    /// hidden listings flip; a sold listing keeps its status.
    pub fn toggled_visibility(&self) -> Self {
        match self {
            CarStatus::Available => CarStatus::Hidden,
            CarStatus::Hidden => CarStatus::Available,
            CarStatus::Sold => CarStatus::Sold,
        }
    }
}

/// Denormalized copy of the seller embedded in a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerSummary {
    pub id: String,
    pub display_name: String,
    pub is_selling_banned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub id: String,
    pub title: String,
    pub brand: Option<String>,
    pub price: i64,
    pub tags: Vec<String>,
    pub status: CarStatus,
    pub seller: Option<SellerSummary>,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_sold_by(&self, user_id: &str) -> bool {
        self.seller.as_ref().is_some_and(|s| s.id == user_id)
    }
}

//=========================================================================================
// Moderation
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Pending,
    Resolved,
    Ignored,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::Ignored => "IGNORED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "PENDING" => Some(ReportStatus::Pending),
            "RESOLVED" => Some(ReportStatus::Resolved),
            "IGNORED" => Some(ReportStatus::Ignored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReporterSummary {
    pub id: String,
    pub display_name: String,
    pub is_banned: bool,
}

/// A user report filed against a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: String,
    pub car_id: String,
    pub reporter: ReporterSummary,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

/// Admin statistics for one listing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStat {
    pub tag: String,
    pub car_count: u32,
}

/// The item a pending moderation prompt refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationTarget {
    Car(String),
    Report(String),
    Tag(String),
    User(String),
}

impl std::fmt::Display for ModerationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationTarget::Car(id) => write!(f, "car {}", id),
            ModerationTarget::Report(id) => write!(f, "report {}", id),
            ModerationTarget::Tag(tag) => write!(f, "tag '{}'", tag),
            ModerationTarget::User(id) => write!(f, "user {}", id),
        }
    }
}

//=========================================================================================
// Feed Filters
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CarSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl CarSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarSort::Newest => "newest",
            CarSort::Oldest => "oldest",
            CarSort::PriceAsc => "price_asc",
            CarSort::PriceDesc => "price_desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(CarSort::Newest),
            "oldest" => Some(CarSort::Oldest),
            "price_asc" => Some(CarSort::PriceAsc),
            "price_desc" => Some(CarSort::PriceDesc),
            _ => None,
        }
    }
}

/// Filters for the car feed. They round-trip through URL query pairs so the
/// feed can be driven by the address bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarFilters {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub tag: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub seller_id: Option<String>,
    pub sort: CarSort,
}

impl CarFilters {
    /// Query pairs for the filters that are set. The default sort is omitted.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: String| query.push((key.to_string(), value));

        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            push("search", search.trim().to_string());
        }
        if let Some(brand) = &self.brand {
            push("brand", brand.clone());
        }
        if let Some(tag) = &self.tag {
            push("tag", tag.clone());
        }
        if let Some(min) = self.min_price {
            push("minPrice", min.to_string());
        }
        if let Some(max) = self.max_price {
            push("maxPrice", max.to_string());
        }
        if let Some(seller) = &self.seller_id {
            push("sellerId", seller.clone());
        }
        if self.sort != CarSort::default() {
            push("sort", self.sort.as_str().to_string());
        }
        query
    }

    /// Parses filters out of URL query pairs. Unknown keys are ignored and
    /// unparsable numbers are dropped.
    pub fn from_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = CarFilters::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "search" => filters.search = Some(value.to_string()),
                "brand" => filters.brand = Some(value.to_string()),
                "tag" => filters.tag = Some(value.to_string()),
                "minPrice" => filters.min_price = value.parse().ok(),
                "maxPrice" => filters.max_price = value.parse().ok(),
                "sellerId" => filters.seller_id = Some(value.to_string()),
                "sort" => filters.sort = CarSort::parse(value).unwrap_or_default(),
                _ => {}
            }
        }
        filters
    }
}

//=========================================================================================
// Wallet & Uploads
//=========================================================================================

/// A checkout link returned when topping up the wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLink {
    pub checkout_url: String,
    pub order_code: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    pub code: String,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub amount: i64,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub url: String,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

/// A transient user-visible notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_round_trip_through_query() {
        let filters = CarFilters {
            search: Some("civic".into()),
            brand: Some("Honda".into()),
            min_price: Some(5_000),
            sort: CarSort::PriceDesc,
            ..Default::default()
        };
        let parsed = CarFilters::from_query(filters.to_query());
        assert_eq!(parsed, filters);
    }

    #[test]
    fn filters_ignore_garbage() {
        let parsed = CarFilters::from_query([
            ("minPrice", "cheap"),
            ("sort", "sideways"),
            ("color", "red"),
            ("brand", "  "),
        ]);
        assert_eq!(parsed, CarFilters::default());
    }

    #[test]
    fn default_sort_is_not_serialized() {
        assert!(CarFilters::default().to_query().is_empty());
    }

    #[test]
    fn hide_toggle_flips_visibility() {
        assert_eq!(CarStatus::Available.toggled_visibility(), CarStatus::Hidden);
        assert_eq!(CarStatus::Hidden.toggled_visibility(), CarStatus::Available);
        assert_eq!(CarStatus::parse("hidden"), Some(CarStatus::Hidden));
    }

    #[test]
    fn hide_toggle_round_trip_keeps_sold() {
        let sold = CarStatus::Sold;
        assert_eq!(sold.toggled_visibility(), CarStatus::Sold);
        assert_eq!(sold.toggled_visibility().toggled_visibility(), CarStatus::Sold);
    }
}
