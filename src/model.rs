//! Data models for Skywatch.
//!
//! Everything here is created per request and dropped once the response has
//! been serialized. Nothing is persisted.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Unit system passed through to the weather provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Celsius, metres per second.
    #[default]
    #[serde(alias = "celsius")]
    Metric,

    /// Fahrenheit, miles per hour.
    #[serde(alias = "fahrenheit")]
    Imperial,
}

impl UnitSystem {
    /// Value of the provider's `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Point-in-time conditions for one city.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherSnapshot {
    /// The city as requested by the caller.
    pub city: String,

    /// Short condition label, e.g. "Rain".
    pub condition: String,

    /// Longer description, e.g. "light rain".
    pub description: String,

    /// Provider icon code, e.g. "10d".
    pub icon: String,

    pub temperature: f64,
    pub feels_like: f64,

    /// Relative humidity in percent (0-100).
    pub humidity: u8,

    /// Sea-level pressure in hPa.
    pub pressure: f64,

    pub wind_speed: f64,

    /// Sunrise in the city's local time.
    pub sunrise: NaiveTime,

    /// Sunset in the city's local time.
    pub sunset: NaiveTime,

    pub coordinates: Coordinates,
    pub units: UnitSystem,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// URL of the large condition icon.
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@4x.png", self.icon)
    }
}

/// One future time slice of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,

    /// Hour of day in the city's local time, e.g. "03 PM".
    pub label: String,

    pub temperature: f64,
    pub humidity: u8,

    /// Probability of precipitation in percent (0-100).
    pub rain_probability: f64,
}

/// Forecast samples in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub samples: Vec<ForecastSample>,
}

impl ForecastSeries {
    pub fn new(samples: Vec<ForecastSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastSample> {
        self.samples.iter()
    }

    /// Build line-chart traces for temperature, humidity and rain probability.
    ///
    /// Points keep sample order and are never merged by label, so two samples
    /// that share an hour label still plot as two points.
    pub fn chart(&self, units: UnitSystem) -> ForecastChart {
        let labels = self.samples.iter().map(|s| s.label.clone()).collect();

        let traces = vec![
            ChartTrace {
                name: "Temperature",
                color: "#FF5733",
                values: self.samples.iter().map(|s| s.temperature).collect(),
            },
            ChartTrace {
                name: "Humidity",
                color: "#33C1FF",
                values: self.samples.iter().map(|s| f64::from(s.humidity)).collect(),
            },
            ChartTrace {
                name: "Rain Probability",
                color: "#2ECC71",
                values: self.samples.iter().map(|s| s.rain_probability).collect(),
            },
        ];

        ForecastChart {
            title: format!(
                "Forecast: Temperature ({}), Humidity (%) & Rain Probability (%)",
                units.temperature_symbol()
            ),
            x_axis: "Hour",
            y_axis: "Measurement",
            labels,
            traces,
        }
    }
}

impl<'a> IntoIterator for &'a ForecastSeries {
    type Item = &'a ForecastSample;
    type IntoIter = std::slice::Iter<'a, ForecastSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Chart-ready view of a [`ForecastSeries`].
#[derive(Debug, Clone, Serialize)]
pub struct ForecastChart {
    pub title: String,
    pub x_axis: &'static str,
    pub y_axis: &'static str,

    /// Category labels, one per sample, in sample order.
    pub labels: Vec<String>,

    pub traces: Vec<ChartTrace>,
}

/// One line of the forecast chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartTrace {
    pub name: &'static str,
    pub color: &'static str,
    pub values: Vec<f64>,
}

/// How prominent an advisory should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryLevel {
    Success,
    Info,
    Warning,
}

/// A short message shown next to the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub level: AdvisoryLevel,
    pub text: &'static str,
}

/// Background colour and advisory derived from the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayPolicy {
    /// The lookup key that matched, or "default".
    pub key: &'static str,

    /// CSS hex colour.
    pub color: &'static str,

    pub advisory: Option<Advisory>,
}

/// Names of the classifier features, in the order the model expects them.
pub const CLOUDBURST_FEATURES: [&str; 7] = [
    "temperature",
    "apparent_temperature",
    "humidity",
    "wind_speed",
    "wind_bearing",
    "visibility",
    "pressure",
];

/// The seven readings fed to the cloudburst classifier.
///
/// Only constructible through [`CloudburstQuery::new`], so every instance is
/// finite and within physical bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudburstQuery {
    temperature: f64,
    apparent_temperature: f64,
    humidity: f64,
    wind_speed: f64,
    wind_bearing: f64,
    visibility: f64,
    pressure: f64,
}

impl CloudburstQuery {
    /// Validate the readings.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending field when a
    /// value is NaN or infinite, humidity is outside 0-100, wind speed or
    /// visibility is negative, wind bearing is outside 0-360, or pressure is
    /// not positive.
    pub fn new(
        temperature: f64,
        apparent_temperature: f64,
        humidity: f64,
        wind_speed: f64,
        wind_bearing: f64,
        visibility: f64,
        pressure: f64,
    ) -> Result<Self, ValidationError> {
        let query = Self {
            temperature,
            apparent_temperature,
            humidity,
            wind_speed,
            wind_bearing,
            visibility,
            pressure,
        };

        for (name, value) in CLOUDBURST_FEATURES.into_iter().zip(query.features()) {
            if !value.is_finite() {
                return Err(ValidationError::new(name, "must be a finite number"));
            }
        }

        if !(0.0..=100.0).contains(&humidity) {
            return Err(ValidationError::new(
                "humidity",
                "must be between 0 and 100",
            ));
        }
        if wind_speed < 0.0 {
            return Err(ValidationError::new("wind_speed", "must not be negative"));
        }
        if !(0.0..=360.0).contains(&wind_bearing) {
            return Err(ValidationError::new(
                "wind_bearing",
                "must be between 0 and 360 degrees",
            ));
        }
        if visibility < 0.0 {
            return Err(ValidationError::new("visibility", "must not be negative"));
        }
        if pressure <= 0.0 {
            return Err(ValidationError::new("pressure", "must be positive"));
        }

        Ok(query)
    }

    /// Feature vector in [`CLOUDBURST_FEATURES`] order.
    pub fn features(&self) -> [f64; 7] {
        [
            self.temperature,
            self.apparent_temperature,
            self.humidity,
            self.wind_speed,
            self.wind_bearing,
            self.visibility,
            self.pressure,
        ]
    }
}

/// Request body for POST /predict.
///
/// Fields are optional here so a missing reading is reported by name.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_bearing: Option<f64>,
    pub visibility: Option<f64>,
    pub pressure: Option<f64>,
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, "is required"))
}

impl TryFrom<PredictRequest> for CloudburstQuery {
    type Error = ValidationError;

    fn try_from(req: PredictRequest) -> Result<Self, Self::Error> {
        CloudburstQuery::new(
            required("temperature", req.temperature)?,
            required("apparent_temperature", req.apparent_temperature)?,
            required("humidity", req.humidity)?,
            required("wind_speed", req.wind_speed)?,
            required("wind_bearing", req.wind_bearing)?,
            required("visibility", req.visibility)?,
            required("pressure", req.pressure)?,
        )
    }
}

/// Query parameters for GET /weather and GET /forecast.
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: String,

    #[serde(default)]
    pub units: UnitSystem,
}

/// Query parameters for GET /home.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    /// Overrides IP-based city detection when present and non-empty.
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(hour: u32, label: &str, temperature: f64) -> ForecastSample {
        ForecastSample {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
            label: label.to_string(),
            temperature,
            humidity: 70,
            rain_probability: 40.0,
        }
    }

    #[test]
    fn test_unit_system_parsing() {
        let metric: UnitSystem = serde_json::from_str("\"metric\"").unwrap();
        let celsius: UnitSystem = serde_json::from_str("\"celsius\"").unwrap();
        let imperial: UnitSystem = serde_json::from_str("\"fahrenheit\"").unwrap();

        assert_eq!(metric, UnitSystem::Metric);
        assert_eq!(celsius, UnitSystem::Metric);
        assert_eq!(imperial, UnitSystem::Imperial);
        assert_eq!(imperial.as_query(), "imperial");
        assert_eq!(imperial.temperature_symbol(), "°F");
    }

    #[test]
    fn test_chart_keeps_duplicate_labels() {
        let series = ForecastSeries::new(vec![
            sample(12, "12 PM", 20.0),
            sample(13, "12 PM", 21.0),
            sample(15, "03 PM", 22.5),
        ]);

        let chart = series.chart(UnitSystem::Metric);

        assert_eq!(chart.labels, vec!["12 PM", "12 PM", "03 PM"]);
        assert_eq!(chart.traces.len(), 3);
        assert_eq!(chart.traces[0].values, vec![20.0, 21.0, 22.5]);
        assert_eq!(chart.traces[1].values, vec![70.0, 70.0, 70.0]);
        assert!(chart.title.contains("°C"));
    }

    #[test]
    fn test_chart_of_empty_series() {
        let chart = ForecastSeries::default().chart(UnitSystem::Imperial);

        assert!(chart.labels.is_empty());
        assert!(chart.traces.iter().all(|t| t.values.is_empty()));
        assert!(chart.title.contains("°F"));
    }

    #[test]
    fn test_cloudburst_query_feature_order() {
        let query = CloudburstQuery::new(25.0, 27.0, 90.0, 15.0, 180.0, 2.0, 995.0).unwrap();
        assert_eq!(
            query.features(),
            [25.0, 27.0, 90.0, 15.0, 180.0, 2.0, 995.0]
        );
    }

    #[test]
    fn test_cloudburst_query_rejects_nan() {
        let err = CloudburstQuery::new(f64::NAN, 27.0, 90.0, 15.0, 180.0, 2.0, 995.0).unwrap_err();
        assert_eq!(err.field, "temperature");
    }

    #[test]
    fn test_cloudburst_query_rejects_out_of_range() {
        let humidity = CloudburstQuery::new(25.0, 27.0, -1.0, 15.0, 180.0, 2.0, 995.0);
        assert_eq!(humidity.unwrap_err().field, "humidity");

        let bearing = CloudburstQuery::new(25.0, 27.0, 90.0, 15.0, 361.0, 2.0, 995.0);
        assert_eq!(bearing.unwrap_err().field, "wind_bearing");

        let pressure = CloudburstQuery::new(25.0, 27.0, 90.0, 15.0, 180.0, 2.0, 0.0);
        assert_eq!(pressure.unwrap_err().field, "pressure");

        let visibility = CloudburstQuery::new(25.0, 27.0, 90.0, 15.0, 180.0, -0.5, 995.0);
        assert_eq!(visibility.unwrap_err().field, "visibility");
    }

    #[test]
    fn test_predict_request_conversion() {
        let req: PredictRequest = serde_json::from_value(serde_json::json!({
            "temperature": 25.0,
            "apparent_temperature": 27.0,
            "humidity": 90,
            "wind_speed": 15.0,
            "wind_bearing": 180,
            "visibility": 2.0,
            "pressure": 995
        }))
        .unwrap();

        let query = CloudburstQuery::try_from(req).unwrap();
        assert_eq!(query.features()[6], 995.0);
    }

    #[test]
    fn test_predict_request_names_missing_reading() {
        let req: PredictRequest = serde_json::from_value(serde_json::json!({
            "temperature": 25.0,
            "apparent_temperature": 27.0,
            "humidity": 90,
            "wind_speed": 15.0,
            "visibility": 2.0,
            "pressure": 995
        }))
        .unwrap();

        let err = CloudburstQuery::try_from(req).unwrap_err();
        assert_eq!(err.field, "wind_bearing");
        assert_eq!(err.message, "is required");
    }
}
