//! services/client/src/bin/client.rs

use client_lib::{config::ClientConfig, error::ClientError, state::AppState};
use marketplace_core::domain::CarFilters;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = ClientConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. API at {}", config.api_base_url);

    // --- 2. Build the Shared AppState ---
    let state = AppState::from_config(config)?;

    // --- 3. Restore & Validate the Session ---
    let session = state.client.bootstrap().await;
    match &session.user {
        Some(user) => info!(
            "Signed in as {} (admin: {})",
            user.display_name, user.is_admin
        ),
        None => info!("No active session; browsing anonymously"),
    }

    // --- 4. Load the First Page of the Feed ---
    // Filters come from `KEY=VALUE` arguments, the same pairs the address bar carries.
    let pairs: Vec<(String, String)> = std::env::args()
        .skip(1)
        .filter_map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect();
    let feed = state.car_feed(CarFilters::from_query(pairs));
    if let Err(e) = feed.refresh().await {
        warn!("Could not load the car feed: {}", e);
        return Ok(());
    }

    for car in feed.items() {
        info!(
            "{} | {} | {} | {}",
            car.id,
            car.title,
            car.price,
            car.status.as_str()
        );
    }
    info!(
        "Loaded {} listings (more available: {})",
        feed.len(),
        feed.has_more()
    );

    Ok(())
}
