//! Clients for the remote providers behind the dashboard.
//!
//! # Data Sources
//!
//! - [`openweather`]: current conditions and the 3-hourly forecast
//! - [`ipinfo`]: IP-based city detection for the home page
//! - [`newsapi`]: weather headlines
//!
//! Map tiles are also served by OpenWeather but are fetched by the client
//! directly; see [`crate::map`].

pub mod ipinfo;
pub mod newsapi;
pub mod openweather;

pub use ipinfo::IpGeolocator;
pub use newsapi::{Headline, NewsClient};
pub use openweather::OpenWeatherClient;
