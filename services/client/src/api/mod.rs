//! services/client/src/api/mod.rs
//!
//! Typed wrappers over the REST endpoints the marketplace consumes. Each
//! submodule adds an `impl MarketplaceApi` block for one resource.

pub mod admin;
pub mod cars;
pub mod payment;
pub mod upload;
pub mod users;
pub mod wire;

use reqwest::Url;
use std::sync::Arc;

use crate::request::AuthenticatedClient;

/// Entry point for resource-level calls. All traffic goes through the
/// authenticated request layer.
#[derive(Clone)]
pub struct MarketplaceApi {
    client: Arc<AuthenticatedClient>,
}

impl MarketplaceApi {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<AuthenticatedClient> {
        &self.client
    }
}

/// Percent-encodes one path segment (tags and file names may contain spaces
/// or slashes), using the URL parser's path-segment encoding.
pub fn path_segment(raw: &str) -> String {
    let Ok(mut url) = Url::parse("http://segment.invalid/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(raw);
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::path_segment;

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(path_segment("SPAM123"), "SPAM123");
        assert_eq!(path_segment("hot deal/now"), "hot%20deal%2Fnow");
        assert_eq!(path_segment("xe cũ"), "xe%20c%C5%A9");
        assert_eq!(path_segment("100%"), "100%25");
    }
}
