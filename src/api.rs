//! HTTP API handlers for Skywatch.
//!
//! Every handler returns JSON. Failures go through [`ApiError`], which picks
//! the status code and renders `{"error": {"code", "message", "field"}}`.
//!
//! API keys are never logged; handlers log only the city, units and outcome.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use crate::classifier::{CloudburstAssessment, CloudburstClassifier, assess};
use crate::dashboard::{Dashboard, ForecastView, HomeReport, WeatherReport};
use crate::data_sources::Headline;
use crate::error::ApiError;
use crate::model::{
    CLOUDBURST_FEATURES, CloudburstQuery, HomeQuery, PredictRequest, UnitSystem, WeatherQuery,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub classifier: Arc<dyn CloudburstClassifier>,
}

/// Build the router with every route and the request trace layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/weather", get(get_weather))
        .route("/forecast", get(get_forecast))
        .route("/home", get(get_home))
        .route("/news", get(get_news))
        .route("/predict", post(post_predict))
        .route("/about", get(get_about))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// [`Query`] whose rejection renders as an [`ApiError`].
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .inspect_err(|e| debug!(error = %e, "Rejected query string"))?;
        Ok(Self(value))
    }
}

/// [`Json`] whose rejection renders as an [`ApiError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .inspect_err(|e| debug!(error = %e, "Rejected request body"))?;
        Ok(Self(value))
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /weather - Current conditions, forecast and map for a city.
///
/// # Query Parameters
///
/// - `city` (required): City name, e.g. "London"
/// - `units` (optional): `metric` (default) or `imperial`; `celsius` and
///   `fahrenheit` are accepted as aliases
///
/// # Errors
///
/// - 400 `EMPTY_CITY` when `city` is empty
/// - 400 `INVALID_QUERY` when `city` is missing or `units` is unknown
/// - 404 `CITY_NOT_FOUND` when the provider does not know the city
/// - 502 when the provider response is malformed
#[instrument(skip(state))]
pub async fn get_weather(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WeatherQuery>,
) -> Result<Json<WeatherReport>, ApiError> {
    match state.dashboard.weather_report(&query.city, query.units).await {
        Ok(report) => {
            info!(
                city = %report.city,
                temperature = report.snapshot.temperature,
                policy = report.policy.key,
                section_errors = report.errors.len(),
                "Weather queried"
            );
            Ok(Json(report))
        }
        Err(e) => {
            warn!(city = %query.city, error = %e, "Failed to build weather report");
            Err(e.into())
        }
    }
}

/// Response for GET /forecast.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub city: String,
    pub units: UnitSystem,

    #[serde(flatten)]
    pub forecast: ForecastView,
}

/// GET /forecast - The next 24 hours in 3-hour steps, with chart data.
///
/// Takes the same query parameters as `/weather`.
#[instrument(skip(state))]
pub async fn get_forecast(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WeatherQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    match state.dashboard.forecast(&query.city, query.units).await {
        Ok(series) => {
            info!(city = %query.city, samples = series.len(), "Forecast queried");
            Ok(Json(ForecastResponse {
                city: query.city.trim().to_string(),
                units: query.units,
                forecast: ForecastView::new(series, query.units),
            }))
        }
        Err(e) => {
            warn!(city = %query.city, error = %e, "Failed to fetch forecast");
            Err(e.into())
        }
    }
}

/// GET /home - Landing page for the visitor's city.
///
/// The city comes from the `city` query parameter when given, otherwise from
/// geolocating the first `X-Forwarded-For` address.
#[instrument(skip(state, headers))]
pub async fn get_home(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HomeQuery>,
    headers: HeaderMap,
) -> Result<Json<HomeReport>, ApiError> {
    let client_ip = forwarded_ip(&headers);
    if client_ip.is_none() {
        debug!("No usable X-Forwarded-For header, geolocating the server address");
    }

    let report = state
        .dashboard
        .home_report(client_ip, query.city.as_deref())
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to build home page"))?;

    info!(
        city = %report.city,
        detected = report.detected,
        section_errors = report.errors.len(),
        "Home page queried"
    );
    Ok(Json(report))
}

/// First address in `X-Forwarded-For`, if it parses.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Response for GET /news.
#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub headlines: Vec<Headline>,
}

/// GET /news - Latest weather headlines.
#[instrument(skip(state))]
pub async fn get_news(State(state): State<AppState>) -> Result<Json<NewsResponse>, ApiError> {
    match state.dashboard.headlines().await {
        Ok(headlines) => {
            info!(headline_count = headlines.len(), "News queried");
            Ok(Json(NewsResponse { headlines }))
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch headlines");
            Err(e.into())
        }
    }
}

/// POST /predict - Run the cloudburst classifier.
///
/// # Request Body
///
/// ```json
/// {
///     "temperature": 24.0,
///     "apparent_temperature": 26.5,
///     "humidity": 92.0,
///     "wind_speed": 12.0,
///     "wind_bearing": 180.0,
///     "visibility": 2.5,
///     "pressure": 998.0
/// }
/// ```
///
/// # Errors
///
/// - 422 `INVALID_INPUT` naming the offending field, missing readings included
/// - 400/422/415 `INVALID_BODY` when the body is not JSON of this shape
#[instrument(skip(state, request))]
pub async fn post_predict(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PredictRequest>,
) -> Result<Json<CloudburstAssessment>, ApiError> {
    let query = CloudburstQuery::try_from(request)
        .inspect_err(|e| warn!(field = e.field, error = %e, "Rejected prediction input"))?;

    let assessment = assess(state.classifier.as_ref(), &query);
    info!(prediction = ?assessment.prediction, "Cloudburst prediction served");

    Ok(Json(assessment))
}

/// Response for GET /about.
#[derive(Debug, Serialize)]
pub struct AboutResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub model_inputs: [&'static str; 7],
    pub providers: &'static [&'static str],
}

/// GET /about - Static project description.
pub async fn get_about() -> Json<AboutResponse> {
    Json(AboutResponse {
        name: "Skywatch",
        version: env!("CARGO_PKG_VERSION"),
        description: "Live weather, hourly forecasts, weather maps, headlines and \
                      machine-learning cloudburst prediction in one dashboard.",
        features: &[
            "Current conditions with condition-based advice",
            "24-hour forecast chart of temperature, humidity and rain probability",
            "Cloud, precipitation, temperature, wind and pressure map overlays",
            "Cloudburst prediction from seven weather readings",
            "IP-based city detection with weather tips and headlines",
        ],
        model_inputs: CLOUDBURST_FEATURES,
        providers: &["OpenWeatherMap", "NewsAPI", "ipinfo.io", "OpenStreetMap"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_ip_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        assert_eq!(forwarded_ip(&headers), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_ip_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));

        assert_eq!(forwarded_ip(&headers), None);
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }
}
