//! services/client/src/api/cars.rs

use marketplace_core::domain::{Car, CarFilters};
use marketplace_core::ports::{ApiRequest, PortResult};

use super::wire::{CarRecord, PageBody};
use super::{path_segment, MarketplaceApi};
use crate::feed::Page;

pub const CARS_PATH: &str = "/cars";
pub const FAVORITES_PATH: &str = "/favorites";

impl MarketplaceApi {
    /// GET /cars with the feed filters and pagination.
    pub async fn list_cars(&self, filters: &CarFilters, page: u32, limit: u32) -> PortResult<Page<Car>> {
        let request = ApiRequest::get(CARS_PATH)
            .queries(filters.to_query())
            .query("page", page)
            .query("limit", limit);
        self.fetch_car_page(request).await
    }

    /// GET /cars/:id
    pub async fn get_car(&self, car_id: &str) -> PortResult<Car> {
        let path = format!("{}/{}", CARS_PATH, path_segment(car_id));
        self.client
            .get_json::<CarRecord>(ApiRequest::get(path))
            .await
            .map(CarRecord::to_domain)
    }

    /// GET /favorites - the signed-in user's saved listings.
    pub async fn list_favorites(&self, page: u32, limit: u32) -> PortResult<Page<Car>> {
        let request = ApiRequest::get(FAVORITES_PATH)
            .query("page", page)
            .query("limit", limit);
        self.fetch_car_page(request).await
    }

    async fn fetch_car_page(&self, request: ApiRequest) -> PortResult<Page<Car>> {
        let body: PageBody<CarRecord> = self.client.get_json(request).await?;
        let (records, total_pages) = body.into_parts();
        Ok(Page {
            items: records.into_iter().map(CarRecord::to_domain).collect(),
            total_pages,
        })
    }
}
