//! ipinfo.io client for guessing the visitor's city.
//!
//! # API Reference
//!
//! See: <https://ipinfo.io/developers>
//!
//! The lookup is best effort. Any failure resolves to the configured default
//! city, so callers never have to handle an error.

use std::net::IpAddr;

use serde::Deserialize;
use tracing::debug;

/// Base URL for the ipinfo API.
const IPINFO_API_BASE: &str = "https://ipinfo.io";

/// City used when the lookup yields nothing usable.
pub const DEFAULT_CITY: &str = "Mumbai";

/// Client that maps an IP address to a city name.
#[derive(Clone)]
pub struct IpGeolocator {
    client: reqwest::Client,
    base_url: String,
    default_city: String,
}

impl IpGeolocator {
    /// Create a new geolocator with the given fallback city.
    pub fn new(default_city: &str) -> Self {
        Self::with_base_url(IPINFO_API_BASE, default_city)
    }

    /// Create a geolocator with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, default_city: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_city: default_city.to_string(),
        }
    }

    /// Look up an address. `None` looks up the address the request comes from.
    pub async fn lookup(&self, ip: Option<IpAddr>) -> anyhow::Result<IpInfoResponse> {
        let url = match ip {
            Some(ip) => format!("{}/{}/json", self.base_url, ip),
            None => format!("{}/json", self.base_url),
        };

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let data = response.json::<IpInfoResponse>().await?;
        Ok(data)
    }

    /// Resolve a city name, falling back to the default city on any failure.
    pub async fn resolve_city(&self, ip: Option<IpAddr>) -> String {
        match self.lookup(ip).await {
            Ok(info) => match info.city.filter(|c| !c.trim().is_empty()) {
                Some(city) => city,
                None => {
                    debug!(default_city = %self.default_city, "IP lookup returned no city");
                    self.default_city.clone()
                }
            },
            Err(e) => {
                debug!(error = %e, default_city = %self.default_city, "IP lookup failed");
                self.default_city.clone()
            }
        }
    }
}

/// Response from ipinfo.io. Only the fields Skywatch reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpInfoResponse {
    #[serde(default)]
    pub city: Option<String>,
}
