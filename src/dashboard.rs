//! Page composition on top of the data sources.
//!
//! This module provides the two composite views of the dashboard:
//! - the weather page: current conditions, display policy, forecast chart and map
//! - the home page: the weather page for the visitor's city plus tips and news
//!
//! # Usage
//!
//! ```ignore
//! let dashboard = Dashboard::new(DashboardConfig::new(&weather_key, &news_key));
//! let report = dashboard.weather_report("London", UnitSystem::Metric).await?;
//! ```

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::data_sources::ipinfo::DEFAULT_CITY;
use crate::data_sources::{Headline, IpGeolocator, NewsClient, OpenWeatherClient};
use crate::error::{FetchError, NewsError};
use crate::map::{MapOverlay, build_overlays};
use crate::model::{
    AdvisoryLevel, DisplayPolicy, ForecastChart, ForecastSeries, UnitSystem, WeatherSnapshot,
};
use crate::policy::select_policy;

/// Dashboard configuration.
#[derive(Clone)]
pub struct DashboardConfig {
    /// OpenWeather API key, also embedded in map tile URLs.
    pub weather_api_key: String,

    /// NewsAPI key.
    pub news_api_key: String,

    /// City used when IP detection fails.
    pub default_city: String,

    /// Search term for headlines.
    pub news_keyword: String,

    /// Headline language (ISO 639-1).
    pub news_language: String,

    /// Number of headlines on the home page.
    pub news_page_size: u8,

    /// Provider base URL overrides (for testing or proxies).
    pub openweather_base_url: Option<String>,
    pub news_base_url: Option<String>,
    pub ipinfo_base_url: Option<String>,
}

impl DashboardConfig {
    /// Configuration with the given keys and defaults for everything else.
    pub fn new(weather_api_key: &str, news_api_key: &str) -> Self {
        Self {
            weather_api_key: weather_api_key.to_string(),
            news_api_key: news_api_key.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            news_keyword: "weather".to_string(),
            news_language: "en".to_string(),
            news_page_size: 4,
            openweather_base_url: None,
            news_base_url: None,
            ipinfo_base_url: None,
        }
    }
}

// Keys stay out of logs.
impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("weather_api_key", &"<redacted>")
            .field("news_api_key", &"<redacted>")
            .field("default_city", &self.default_city)
            .field("news_keyword", &self.news_keyword)
            .field("news_language", &self.news_language)
            .field("news_page_size", &self.news_page_size)
            .field("openweather_base_url", &self.openweather_base_url)
            .field("news_base_url", &self.news_base_url)
            .field("ipinfo_base_url", &self.ipinfo_base_url)
            .finish()
    }
}

/// A part of a page that can be skipped on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Weather,
    Forecast,
    News,
}

/// Why a section is missing from a page.
#[derive(Debug, Clone, Serialize)]
pub struct SectionError {
    pub section: Section,
    pub message: String,
}

/// The forecast section: raw series plus its chart.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastView {
    pub series: ForecastSeries,
    pub chart: ForecastChart,
}

impl ForecastView {
    pub fn new(series: ForecastSeries, units: UnitSystem) -> Self {
        Self {
            chart: series.chart(units),
            series,
        }
    }
}

/// The weather page for one city.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub units: UnitSystem,

    /// Unit label for `snapshot.wind_speed`, e.g. "m/s".
    pub wind_speed_unit: &'static str,

    pub snapshot: WeatherSnapshot,
    pub icon_url: String,
    pub policy: DisplayPolicy,

    /// `None` when the forecast could not be fetched.
    pub forecast: Option<ForecastView>,

    pub map: MapOverlay,

    pub errors: Vec<SectionError>,
}

/// A static weather tip.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Tip {
    pub level: AdvisoryLevel,
    pub text: &'static str,
}

const TIPS: &[Tip] = &[
    Tip {
        level: AdvisoryLevel::Success,
        text: "🔋 Keep power banks charged during rainy season.",
    },
    Tip {
        level: AdvisoryLevel::Info,
        text: "📱 Enable location & alerts in weather apps.",
    },
    Tip {
        level: AdvisoryLevel::Warning,
        text: "🚗 Avoid waterlogged roads during heavy rains.",
    },
    Tip {
        level: AdvisoryLevel::Info,
        text: "🧴 Use sunscreen even on cloudy days.",
    },
];

const FEATURES: &[&str] = &[
    "🔮 Cloudburst Prediction using Machine Learning",
    "🌍 Live Weather Forecasts auto-detected by your location",
    "🧠 Smart Weather Tips based on conditions",
    "📰 Latest Global Weather News",
];

/// The home page.
#[derive(Debug, Clone, Serialize)]
pub struct HomeReport {
    /// When this response was generated.
    pub timestamp: DateTime<Utc>,

    pub city: String,

    /// True when the city came from IP detection rather than the caller.
    pub detected: bool,

    pub weather: Option<WeatherReport>,
    pub features: &'static [&'static str],
    pub tips: &'static [Tip],
    pub news: Vec<Headline>,
    pub errors: Vec<SectionError>,
}

/// Dashboard composing all data sources.
#[derive(Clone)]
pub struct Dashboard {
    config: Arc<DashboardConfig>,
    weather: OpenWeatherClient,
    news: NewsClient,
    geo: IpGeolocator,
}

impl Dashboard {
    /// Create a new dashboard with the given configuration.
    pub fn new(config: DashboardConfig) -> Self {
        let weather = match &config.openweather_base_url {
            Some(url) => OpenWeatherClient::with_base_url(url, &config.weather_api_key),
            None => OpenWeatherClient::new(&config.weather_api_key),
        };
        let news = match &config.news_base_url {
            Some(url) => NewsClient::with_base_url(url, &config.news_api_key),
            None => NewsClient::new(&config.news_api_key),
        };
        let geo = match &config.ipinfo_base_url {
            Some(url) => IpGeolocator::with_base_url(url, &config.default_city),
            None => IpGeolocator::new(&config.default_city),
        };

        Self {
            weather,
            news,
            geo,
            config: Arc::new(config),
        }
    }

    /// Build the weather page for a city.
    ///
    /// Current conditions and the forecast are fetched concurrently. If the
    /// current conditions are unavailable the whole page fails; if only the
    /// forecast is, the page carries a [`Section::Forecast`] error instead.
    ///
    /// # Errors
    ///
    /// - [`FetchError::EmptyCity`] / [`FetchError::NotFound`] from the snapshot
    /// - [`FetchError::Parse`] from either fetch
    pub async fn weather_report(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<WeatherReport, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyCity);
        }

        // Forecast NotFound stays a value; any other failure ends the join early.
        let forecast = async {
            match self.weather.fetch_forecast(city, units).await {
                Err(FetchError::Parse(msg)) => Err(FetchError::Parse(msg)),
                other => Ok(other),
            }
        };
        let (snapshot, forecast) =
            tokio::try_join!(self.weather.fetch_snapshot(city, units), forecast)?;

        let mut errors = Vec::new();

        let forecast = match forecast {
            Ok(series) => Some(ForecastView::new(series, units)),
            Err(e) => {
                warn!(city = %city, error = %e, "Forecast unavailable");
                errors.push(SectionError {
                    section: Section::Forecast,
                    message: "Couldn't fetch hourly forecast.".to_string(),
                });
                None
            }
        };

        let policy = select_policy(&snapshot.description, &snapshot.condition);
        let map = build_overlays(&snapshot, &self.config.weather_api_key);

        info!(
            city = %city,
            units = units.as_query(),
            condition = %snapshot.condition,
            policy = policy.key,
            forecast_samples = forecast.as_ref().map_or(0, |f| f.series.len()),
            "Weather report built"
        );

        Ok(WeatherReport {
            city: city.to_string(),
            units,
            wind_speed_unit: units.wind_speed_unit(),
            icon_url: snapshot.icon_url(),
            snapshot,
            policy,
            forecast,
            map,
            errors,
        })
    }

    /// Fetch just the forecast series for a city.
    pub async fn forecast(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError> {
        self.weather.fetch_forecast(city, units).await
    }

    /// Fetch the configured weather headlines.
    pub async fn headlines(&self) -> Result<Vec<Headline>, NewsError> {
        self.news
            .top_headlines(
                &self.config.news_keyword,
                &self.config.news_language,
                self.config.news_page_size,
            )
            .await
    }

    /// Build the home page.
    ///
    /// Uses `city_override` when it is non-empty, otherwise the city detected
    /// from `client_ip`. Missing weather or news only removes that section.
    ///
    /// # Errors
    ///
    /// Only [`FetchError::Parse`], when a provider sends a malformed body.
    pub async fn home_report(
        &self,
        client_ip: Option<IpAddr>,
        city_override: Option<&str>,
    ) -> Result<HomeReport, FetchError> {
        let (city, detected) = match city_override.map(str::trim).filter(|c| !c.is_empty()) {
            Some(city) => (city.to_string(), false),
            None => (self.geo.resolve_city(client_ip).await, true),
        };

        let (weather, news) = tokio::join!(
            self.weather_report(&city, UnitSystem::Metric),
            self.headlines(),
        );

        let mut errors = Vec::new();

        let weather = match weather {
            Ok(report) => Some(report),
            Err(FetchError::Parse(msg)) => return Err(FetchError::Parse(msg)),
            Err(e) => {
                warn!(city = %city, error = %e, "Home page weather unavailable");
                errors.push(SectionError {
                    section: Section::Weather,
                    message: "Weather info not available.".to_string(),
                });
                None
            }
        };

        let news = match news {
            Ok(headlines) => headlines,
            Err(e) => {
                warn!(error = %e, "Headlines unavailable");
                errors.push(SectionError {
                    section: Section::News,
                    message: "Could not load news at the moment.".to_string(),
                });
                Vec::new()
            }
        };

        info!(
            city = %city,
            detected,
            has_weather = weather.is_some(),
            headline_count = news.len(),
            "Home page built"
        );

        Ok(HomeReport {
            timestamp: Utc::now(),
            city,
            detected,
            weather,
            features: FEATURES,
            tips: TIPS,
            news,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current(main: &str, description: &str) -> serde_json::Value {
        json!({
            "coord": {"lon": 77.2167, "lat": 28.6667},
            "weather": [{"main": main, "description": description, "icon": "01d"}],
            "main": {"temp": 31.0, "feels_like": 33.2, "pressure": 1006, "humidity": 45},
            "wind": {"speed": 3.6},
            "sys": {"sunrise": 1717200000, "sunset": 1717250000},
            "timezone": 19800,
            "name": "Delhi"
        })
    }

    fn forecast(count: usize) -> serde_json::Value {
        let list: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "dt": 1717236000 + (i as i64) * 10800,
                    "main": {"temp": 30.0, "humidity": 50},
                    "pop": 0.3
                })
            })
            .collect();
        json!({"list": list, "city": {"timezone": 19800}})
    }

    async fn mount(
        server: &MockServer,
        endpoint: &str,
        city: &str,
        status: u16,
        body: serde_json::Value,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/{}", endpoint)))
            .and(query_param("q", city))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn dashboard(server: &MockServer) -> Dashboard {
        let mut config = DashboardConfig::new("ow-key", "news-key");
        config.openweather_base_url = Some(server.uri());
        config.news_base_url = Some(server.uri());
        config.ipinfo_base_url = Some(server.uri());
        Dashboard::new(config)
    }

    #[tokio::test]
    async fn test_weather_report_combines_sections() {
        let server = MockServer::start().await;
        mount(&server, "weather", "Delhi", 200, current("Clear", "clear sky")).await;
        mount(&server, "forecast", "Delhi", 200, forecast(10)).await;

        let report = dashboard(&server)
            .weather_report("Delhi", UnitSystem::Metric)
            .await
            .unwrap();

        assert_eq!(report.policy.key, "clear");
        assert_eq!(report.forecast.as_ref().unwrap().series.len(), 8);
        assert_eq!(report.forecast.as_ref().unwrap().chart.labels.len(), 8);
        assert_eq!(report.map.layers.len(), 5);
        assert_eq!(report.wind_speed_unit, "m/s");
        assert!(report.map.layers[0].url_template.ends_with("appid=ow-key"));
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_forecast_failure_skips_only_forecast() {
        let server = MockServer::start().await;
        mount(&server, "weather", "Delhi", 200, current("Clouds", "broken clouds")).await;
        mount(&server, "forecast", "Delhi", 500, json!({})).await;

        let report = dashboard(&server)
            .weather_report("Delhi", UnitSystem::Metric)
            .await
            .unwrap();

        assert!(report.forecast.is_none());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].section, Section::Forecast);
        assert_eq!(report.policy.key, "cloud");
    }

    #[tokio::test]
    async fn test_unknown_city_fails_report() {
        let server = MockServer::start().await;
        mount(&server, "weather", "Zzzqx", 404, json!({"cod": "404"})).await;
        mount(&server, "forecast", "Zzzqx", 404, json!({"cod": "404"})).await;

        let err = dashboard(&server)
            .weather_report("Zzzqx", UnitSystem::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound));
    }

    #[tokio::test]
    async fn test_unknown_city_does_not_wait_for_forecast() {
        let server = MockServer::start().await;
        mount(&server, "weather", "Zzzqx", 404, json!({"cod": "404"})).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(forecast(8))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            dashboard(&server).weather_report("Zzzqx", UnitSystem::Metric),
        )
        .await
        .expect("snapshot failure should return before the forecast answers");

        assert!(matches!(result, Err(FetchError::NotFound)));
    }

    #[tokio::test]
    async fn test_malformed_forecast_is_fatal() {
        let server = MockServer::start().await;
        mount(&server, "weather", "Delhi", 200, current("Clear", "clear sky")).await;
        mount(&server, "forecast", "Delhi", 200, json!({"cnt": 0})).await;

        let err = dashboard(&server)
            .weather_report("Delhi", UnitSystem::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_home_report_uses_detected_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/203.0.113.7/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "Delhi"})))
            .mount(&server)
            .await;
        mount(&server, "weather", "Delhi", 200, current("Rain", "moderate rain")).await;
        mount(&server, "forecast", "Delhi", 200, forecast(8)).await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "articles": [{"title": "Rain lashes city", "url": "https://example.com/r", "description": null}]
            })))
            .mount(&server)
            .await;

        let home = dashboard(&server)
            .home_report(Some("203.0.113.7".parse().unwrap()), None)
            .await
            .unwrap();

        assert_eq!(home.city, "Delhi");
        assert!(home.detected);
        assert_eq!(home.weather.unwrap().policy.key, "rain");
        assert_eq!(home.news.len(), 1);
        assert_eq!(home.tips.len(), 4);
        assert!(home.errors.is_empty());
    }

    #[tokio::test]
    async fn test_home_report_degrades_per_section() {
        let server = MockServer::start().await;
        mount(&server, "weather", "Nowhere", 404, json!({})).await;
        mount(&server, "forecast", "Nowhere", 404, json!({})).await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let home = dashboard(&server)
            .home_report(None, Some(" Nowhere "))
            .await
            .unwrap();

        assert_eq!(home.city, "Nowhere");
        assert!(!home.detected);
        assert!(home.weather.is_none());
        assert!(home.news.is_empty());
        let sections: Vec<_> = home.errors.iter().map(|e| e.section).collect();
        assert_eq!(sections, vec![Section::Weather, Section::News]);
    }

    #[test]
    fn test_config_debug_redacts_keys() {
        let config = DashboardConfig::new("secret-weather", "secret-news");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("secret-weather"));
        assert!(!debug.contains("secret-news"));
        assert!(debug.contains("Mumbai"));
    }
}
