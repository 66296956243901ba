//! services/client/src/api/wire.rs
//!
//! "Impure" wire records for the REST API. Each record mirrors the server's
//! camelCase JSON and converts into the pure domain type with `to_domain`.

use chrono::{DateTime, Utc};
use marketplace_core::domain::{
    Bank, Car, CarStatus, PaymentLink, PublicProfile, Report, ReportStatus, ReporterSummary,
    SellerSummary, TagStat, UploadedFile, UserProfile,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Ids arrive as strings from some endpoints and as numbers from others.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_selling_banned: bool,
}

impl UserRecord {
    pub fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            display_name: self.display_name,
            email: self.email,
            avatar: self.avatar,
            created_at: self.created_at,
            is_admin: self.is_admin,
            is_selling_banned: self.is_selling_banned,
        }
    }

    pub fn from_domain(user: &UserProfile) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at,
            is_admin: user.is_admin,
            is_selling_banned: user.is_selling_banned,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub listing_count: u32,
}

impl PublicProfileRecord {
    pub fn to_domain(self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            display_name: self.display_name,
            avatar: self.avatar,
            created_at: self.created_at,
            listing_count: self.listing_count,
        }
    }
}

/// The persisted session blob stored under `auth-storage`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub user: Option<UserRecord>,
    pub is_authenticated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

//=========================================================================================
// Listings
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub is_selling_banned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: String,
    #[serde(default, alias = "user")]
    pub seller: Option<SellerRecord>,
    pub created_at: DateTime<Utc>,
}

impl CarRecord {
    pub fn to_domain(self) -> Car {
        Car {
            id: self.id,
            title: self.title,
            brand: self.brand,
            price: self.price,
            tags: self.tags,
            // Unknown statuses are shown as available rather than dropped.
            status: CarStatus::parse(&self.status).unwrap_or(CarStatus::Available),
            seller: self.seller.map(|s| SellerSummary {
                id: s.id,
                display_name: s.display_name,
                is_selling_banned: s.is_selling_banned,
            }),
            created_at: self.created_at,
        }
    }
}

/// One page of a paginated listing response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord<T> {
    #[serde(alias = "cars", alias = "items", alias = "favorites")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Some list endpoints wrap their items in a page object, others return a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PageBody<T> {
    Paged(PageRecord<T>),
    Bare(Vec<T>),
}

impl<T> PageBody<T> {
    pub fn into_parts(self) -> (Vec<T>, Option<u32>) {
        match self {
            PageBody::Paged(page) => (page.data, page.total_pages),
            PageBody::Bare(items) => (items, None),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HideResponse {
    #[serde(default)]
    pub status: Option<String>,
}

//=========================================================================================
// Moderation
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporterRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default, alias = "isSellingBanned")]
    pub is_banned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub car_id: String,
    pub reporter: ReporterRecord,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn to_domain(self) -> Report {
        Report {
            id: self.id,
            car_id: self.car_id,
            reporter: ReporterSummary {
                id: self.reporter.id,
                display_name: self.reporter.display_name,
                is_banned: self.reporter.is_banned,
            },
            reason: self.reason,
            status: ReportStatus::parse(&self.status).unwrap_or(ReportStatus::Pending),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStatRecord {
    pub tag: String,
    #[serde(alias = "count")]
    pub car_count: u32,
}

impl TagStatRecord {
    pub fn to_domain(self) -> TagStat {
        TagStat {
            tag: self.tag,
            car_count: self.car_count,
        }
    }
}

//=========================================================================================
// Wallet & Uploads
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkRecord {
    pub checkout_url: String,
    pub order_code: i64,
}

impl PaymentLinkRecord {
    pub fn to_domain(self) -> PaymentLink {
        PaymentLink {
            checkout_url: self.checkout_url,
            order_code: self.order_code,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    #[serde(alias = "bin")]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

impl BankRecord {
    pub fn to_domain(self) -> Bank {
        Bank {
            code: self.code,
            name: self.name,
            short_name: self.short_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadRecord {
    pub filename: String,
    pub url: String,
}

impl UploadRecord {
    pub fn to_domain(self) -> UploadedFile {
        UploadedFile {
            filename: self.filename,
            url: self.url,
        }
    }
}
