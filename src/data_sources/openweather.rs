//! OpenWeather client for current conditions and the 5-day/3-hour forecast.
//!
//! # API Reference
//!
//! See: <https://openweathermap.org/current> and <https://openweathermap.org/forecast5>
//!
//! Both endpoints are queried by city name. The provider decides whether a city
//! exists; anything other than a success status is reported as
//! [`FetchError::NotFound`].

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::FetchError;
use crate::model::{Coordinates, ForecastSeries, UnitSystem, WeatherSnapshot};
use crate::series::{normalize, utc_offset};

/// Base URL for the OpenWeather data API.
const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

/// Number of forecast entries kept per fetch (8 x 3h, roughly 24 hours).
pub const FORECAST_SAMPLES: usize = 8;

/// Client for the OpenWeather current-weather and forecast endpoints.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client against the public API.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(OPENWEATHER_API_BASE, api_key)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetch current conditions for a city.
    ///
    /// # Errors
    ///
    /// - [`FetchError::EmptyCity`] if `city` is blank
    /// - [`FetchError::NotFound`] on any transport failure or non-success status
    /// - [`FetchError::Parse`] if the body is missing an expected key
    pub async fn fetch_snapshot(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        let data: CurrentWeatherResponse = self.get_json("weather", city, units).await?;
        data.into_snapshot(city.trim(), units)
    }

    /// Fetch the next [`FORECAST_SAMPLES`] forecast entries for a city.
    ///
    /// Entries are taken in provider order without checking their spacing.
    /// A provider list shorter than [`FORECAST_SAMPLES`] yields a shorter series.
    ///
    /// # Errors
    ///
    /// Same as [`OpenWeatherClient::fetch_snapshot`].
    pub async fn fetch_forecast(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError> {
        let data: ForecastResponse = self.get_json("forecast", city, units).await?;
        let offset = data.utc_offset();
        let keep = data.list.len().min(FORECAST_SAMPLES);
        Ok(normalize(&data.list[..keep], offset))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        units: UnitSystem,
    ) -> Result<T, FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyCity);
        }

        // The URL carries the API key, so it is never logged.
        let url = format!(
            "{}/{}?q={}&appid={}&units={}",
            self.base_url,
            endpoint,
            urlencoding::encode(city),
            self.api_key,
            units.as_query()
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            debug!(endpoint, city, error = %e, "OpenWeather request failed");
            FetchError::NotFound
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(endpoint, city, status = %status, "OpenWeather returned non-success status");
            return Err(FetchError::NotFound);
        }

        let body = response.bytes().await.map_err(|e| {
            debug!(endpoint, city, error = %e, "Failed to read OpenWeather body");
            FetchError::NotFound
        })?;

        Ok(serde_json::from_slice(&body)?)
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Response from the current weather endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherResponse {
    /// Condition groups; the first one is the primary condition.
    pub weather: Vec<ConditionGroup>,

    pub main: MainReadings,

    pub wind: WindReadings,

    pub sys: SunSchedule,

    pub coord: Coordinates,

    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i32,
}

impl CurrentWeatherResponse {
    /// Convert into a [`WeatherSnapshot`] for the requested city.
    pub fn into_snapshot(
        self,
        city: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        let offset = utc_offset(self.timezone);

        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Parse("missing weather[0]".to_string()))?;

        if condition.main.is_empty() {
            return Err(FetchError::Parse("empty weather[0].main".to_string()));
        }
        if self.main.humidity > 100 {
            return Err(FetchError::Parse(format!(
                "humidity {} outside 0-100",
                self.main.humidity
            )));
        }

        Ok(WeatherSnapshot {
            city: city.to_string(),
            condition: condition.main,
            description: condition.description,
            icon: condition.icon,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            sunrise: local_time(self.sys.sunrise, offset, "sys.sunrise")?,
            sunset: local_time(self.sys.sunset, offset, "sys.sunset")?,
            coordinates: self.coord,
            units,
            fetched_at: Utc::now(),
        })
    }
}

fn local_time(unix: i64, offset: FixedOffset, field: &str) -> Result<NaiveTime, FetchError> {
    DateTime::from_timestamp(unix, 0)
        .map(|dt| dt.with_timezone(&offset).time())
        .ok_or_else(|| FetchError::Parse(format!("{} out of range: {}", field, unix)))
}

/// A condition group, e.g. `{"main": "Rain", "description": "light rain", "icon": "10d"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionGroup {
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// The `main` block of the current weather response.
#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: f64,
}

/// The `wind` block.
#[derive(Debug, Clone, Deserialize)]
pub struct WindReadings {
    pub speed: f64,
}

/// The `sys` block: sunrise and sunset as Unix timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct SunSchedule {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Response from the forecast endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    /// Entries at 3-hour spacing, oldest first.
    pub list: Vec<ForecastEntry>,

    #[serde(default)]
    pub city: Option<ForecastCity>,
}

impl ForecastResponse {
    /// The city's UTC offset, or UTC when the provider omitted it.
    pub fn utc_offset(&self) -> FixedOffset {
        utc_offset(self.city.as_ref().map_or(0, |c| c.timezone))
    }
}

/// City metadata attached to a forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastCity {
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i32,
}

/// A single forecast entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp of the forecast slot.
    pub dt: i64,

    pub main: ForecastMain,

    /// Probability of precipitation, 0.0-1.0.
    #[serde(default)]
    pub pop: Option<f64>,
}

/// The `main` block of a forecast entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
    pub humidity: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london_current() -> serde_json::Value {
        json!({
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 15.2, "feels_like": 14.8, "pressure": 1012, "humidity": 80},
            "wind": {"speed": 4.1, "deg": 240},
            "sys": {"sunrise": 1717213440, "sunset": 1717272960},
            "timezone": 3600,
            "name": "London"
        })
    }

    fn forecast_entries(count: usize) -> serde_json::Value {
        let list: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "dt": 1717236000 + (i as i64) * 10800,
                    "main": {"temp": 15.0 + i as f64, "humidity": 70},
                    "pop": 0.1
                })
            })
            .collect();
        json!({"list": list, "city": {"name": "London", "timezone": 3600}})
    }

    #[tokio::test]
    async fn test_fetch_snapshot_parses_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri(), "test-key");
        let snapshot = client
            .fetch_snapshot("London", UnitSystem::Metric)
            .await
            .unwrap();

        assert_eq!(snapshot.city, "London");
        assert_eq!(snapshot.condition, "Rain");
        assert_eq!(snapshot.description, "light rain");
        assert_eq!(snapshot.humidity, 80);
        assert!((snapshot.temperature - 15.2).abs() < f64::EPSILON);
        assert!((snapshot.coordinates.lat - 51.5085).abs() < 1e-9);
        // 1717213440 is 03:44:00 UTC, 04:44:00 at +01:00
        assert_eq!(snapshot.sunrise, NaiveTime::from_hms_opt(4, 44, 0).unwrap());
        assert_eq!(snapshot.icon_url(), "https://openweathermap.org/img/wn/10d@4x.png");
    }

    #[tokio::test]
    async fn test_fetch_snapshot_unknown_city_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri(), "test-key");
        let err = client
            .fetch_snapshot("Zzzqx", UnitSystem::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_not_found() {
        // Nothing listens on port 9 of the loopback interface.
        let client = OpenWeatherClient::with_base_url("http://127.0.0.1:9", "test-key");
        let err = client
            .fetch_snapshot("London", UnitSystem::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound));
    }

    #[tokio::test]
    async fn test_empty_city_is_rejected_locally() {
        let client = OpenWeatherClient::with_base_url("http://127.0.0.1:9", "test-key");
        let err = client
            .fetch_forecast("   ", UnitSystem::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::EmptyCity));
    }

    #[tokio::test]
    async fn test_missing_key_is_parse_error() {
        let server = MockServer::start().await;
        let mut body = london_current();
        body.as_object_mut().unwrap().remove("wind");
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri(), "test-key");
        let err = client
            .fetch_snapshot("London", UnitSystem::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_empty_weather_array_is_parse_error() {
        let mut body = london_current();
        body["weather"] = json!([]);
        let response: CurrentWeatherResponse = serde_json::from_value(body).unwrap();

        let err = response
            .into_snapshot("London", UnitSystem::Metric)
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_empty_condition_label_is_parse_error() {
        let mut body = london_current();
        body["weather"][0]["main"] = json!("");
        let response: CurrentWeatherResponse = serde_json::from_value(body).unwrap();

        let err = response
            .into_snapshot("London", UnitSystem::Metric)
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(msg) if msg.contains("weather[0].main")));
    }

    #[test]
    fn test_humidity_above_100_is_parse_error() {
        let mut body = london_current();
        body["main"]["humidity"] = json!(140);
        let response: CurrentWeatherResponse = serde_json::from_value(body).unwrap();

        let err = response
            .into_snapshot("London", UnitSystem::Metric)
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(msg) if msg.contains("humidity 140")));
    }

    #[tokio::test]
    async fn test_fetch_forecast_truncates_to_eight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_entries(40)))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri(), "test-key");
        let series = client
            .fetch_forecast("London", UnitSystem::Imperial)
            .await
            .unwrap();

        assert_eq!(series.len(), FORECAST_SAMPLES);
        assert_eq!(series.samples[0].timestamp.timestamp(), 1717236000);
        assert_eq!(series.samples[7].temperature, 22.0);
    }

    #[tokio::test]
    async fn test_fetch_forecast_short_and_empty_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "Short"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_entries(3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "Empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": []})))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri(), "test-key");

        let short = client.fetch_forecast("Short", UnitSystem::Metric).await.unwrap();
        assert_eq!(short.len(), 3);

        let empty = client.fetch_forecast("Empty", UnitSystem::Metric).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_city_is_url_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "New York"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri(), "test-key");
        let snapshot = client
            .fetch_snapshot(" New York ", UnitSystem::Metric)
            .await
            .unwrap();

        assert_eq!(snapshot.city, "New York");
    }
}
