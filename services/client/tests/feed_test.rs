//! Integration tests for the paginated feeds.

mod common;

use client_lib::adapters::MemoryStore;
use client_lib::FetchOutcome;
use common::{app, car_json, query_value, respond, FakeTransport};
use marketplace_core::domain::CarFilters;
use marketplace_core::ports::{Method, PortError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn ids(cars: &[marketplace_core::domain::Car]) -> Vec<&str> {
    cars.iter().map(|c| c.id.as_str()).collect()
}

fn brand(name: &str) -> CarFilters {
    CarFilters {
        brand: Some(name.to_string()),
        ..CarFilters::default()
    }
}

#[tokio::test]
async fn infinite_scroll_deduplicates_overlapping_pages() {
    let transport = Arc::new(FakeTransport::new(|req| {
        let cars = match query_value(req, "page") {
            Some("1") => vec!["c1", "c2", "c3"],
            // The server shifted by one between requests; c3 shows up again.
            Some("2") => vec!["c3", "c4", "c5"],
            _ => vec!["c6"],
        };
        let data: Vec<_> = cars
            .into_iter()
            .map(|id| car_json(id, "AVAILABLE", "s1", &[]))
            .collect();
        respond(200, json!({ "data": data, "totalPages": 3 }))
    }));
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));
    let feed = state.car_feed(CarFilters::default());

    assert_eq!(
        feed.refresh().await.unwrap(),
        FetchOutcome::Loaded { page: 1, received: 3 }
    );
    feed.on_sentinel_visible().await.unwrap();
    feed.on_sentinel_visible().await.unwrap();

    assert_eq!(ids(&feed.items()), ["c1", "c2", "c3", "c4", "c5", "c6"]);
    assert_eq!(feed.page(), 3);
    assert!(!feed.has_more());
    assert_eq!(feed.load_next().await.unwrap(), FetchOutcome::Skipped);
    assert_eq!(transport.count(Method::Get, "/cars"), 3);
    assert!(transport
        .calls()
        .iter()
        .all(|c| query_value(c, "limit") == Some("3")));
}

#[tokio::test]
async fn short_bare_page_ends_the_feed() {
    let transport = Arc::new(FakeTransport::new(|req| {
        let body = match query_value(req, "page") {
            Some("1") => json!([
                car_json("f1", "AVAILABLE", "s1", &[]),
                car_json("f2", "AVAILABLE", "s1", &[]),
                car_json("f3", "SOLD", "s2", &[])
            ]),
            _ => json!([car_json("f4", "AVAILABLE", "s1", &[])]),
        };
        respond(200, body)
    }));
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));
    let feed = state.favorites_feed();

    feed.refresh().await.unwrap();
    assert!(feed.has_more());
    feed.load_next().await.unwrap();

    assert_eq!(feed.len(), 4);
    assert!(!feed.has_more());
    assert_eq!(transport.count(Method::Get, "/favorites"), 2);
}

#[tokio::test]
async fn filter_change_discards_the_slower_stale_response() {
    let transport = Arc::new(
        FakeTransport::new(|req| {
            let id = match query_value(req, "brand") {
                Some("Honda") => "honda-1",
                _ => "bmw-1",
            };
            respond(200, json!({ "data": [car_json(id, "AVAILABLE", "s1", &[])], "totalPages": 1 }))
        })
        .with_delay(|req| match query_value(req, "brand") {
            Some("Honda") => Duration::from_millis(200),
            _ => Duration::from_millis(10),
        }),
    );
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));
    let feed = state.car_feed(CarFilters::default());

    let (old, new) = tokio::join!(feed.set_filters(brand("Honda")), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        feed.set_filters(brand("BMW")).await
    });

    assert_eq!(old.unwrap(), FetchOutcome::Stale);
    assert_eq!(new.unwrap(), FetchOutcome::Loaded { page: 1, received: 1 });
    assert_eq!(ids(&feed.items()), ["bmw-1"]);
    assert_eq!(feed.filters(), brand("BMW"));
    assert!(!feed.is_loading());
}

#[tokio::test]
async fn unchanged_filters_do_not_refetch() {
    let transport = Arc::new(FakeTransport::new(|_| {
        respond(200, json!({ "data": [car_json("c1", "AVAILABLE", "s1", &[])], "totalPages": 1 }))
    }));
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));
    let feed = state.car_feed(brand("Mazda"));

    feed.set_filters(brand("Mazda")).await.unwrap();
    assert_eq!(
        feed.set_filters(brand("Mazda")).await.unwrap(),
        FetchOutcome::Skipped
    );
    assert_eq!(transport.total(), 1);
}

#[tokio::test]
async fn failed_page_keeps_items_and_shows_a_toast() {
    let transport = Arc::new(FakeTransport::new(|req| match query_value(req, "page") {
        Some("1") => respond(
            200,
            json!({
                "data": [
                    car_json("c1", "AVAILABLE", "s1", &[]),
                    car_json("c2", "AVAILABLE", "s1", &[]),
                    car_json("c3", "AVAILABLE", "s1", &[])
                ],
                "totalPages": 2
            }),
        ),
        _ => Err(PortError::Network("connection reset".into())),
    }));
    let state = app(transport, Arc::new(MemoryStore::new()));
    let feed = state.car_feed(CarFilters::default());
    feed.refresh().await.unwrap();

    let result = feed.load_next().await;

    assert!(matches!(result, Err(PortError::Network(_))));
    assert_eq!(feed.len(), 3);
    assert_eq!(feed.page(), 1);
    assert!(!feed.is_loading());
    let errors = state.toasts.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Failed to load listings");
}

#[tokio::test]
async fn seller_feed_is_scoped_to_the_seller() {
    let transport = Arc::new(FakeTransport::new(|_| respond(200, json!({ "data": [] }))));
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));
    let feed = state.seller_feed("s42");

    feed.refresh().await.unwrap();

    let calls = transport.calls();
    assert_eq!(query_value(&calls[0], "sellerId"), Some("s42"));
    assert!(feed.is_empty());
    assert!(!feed.has_more());
}

#[tokio::test]
async fn unmount_turns_in_flight_loads_stale() {
    let transport = Arc::new(
        FakeTransport::new(|_| respond(200, json!({ "data": [car_json("c1", "AVAILABLE", "s1", &[])] })))
            .with_delay(|_| Duration::from_millis(100)),
    );
    let state = app(transport, Arc::new(MemoryStore::new()));
    let feed = state.car_feed(CarFilters::default());

    let (outcome, _) = tokio::join!(feed.refresh(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        feed.unmount();
    });

    assert_eq!(outcome.unwrap(), FetchOutcome::Stale);
    assert!(feed.is_empty());
}

#[tokio::test]
async fn load_after_unmount_does_not_stay_loading() {
    let transport = Arc::new(FakeTransport::new(|_| {
        respond(200, json!({ "data": [car_json("c1", "AVAILABLE", "s1", &[])] }))
    }));
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));
    let feed = state.car_feed(CarFilters::default());
    feed.unmount();

    assert_eq!(feed.load_next().await.unwrap(), FetchOutcome::Stale);
    assert!(!feed.is_loading());
    assert!(feed.is_empty());
    assert_eq!(transport.total(), 0);

    // Mounting again starts a fresh generation.
    assert_eq!(
        feed.refresh().await.unwrap(),
        FetchOutcome::Loaded { page: 1, received: 1 }
    );
}
