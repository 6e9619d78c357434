//! Skywatch - a weather dashboard service with cloudburst prediction.
//!
//! # Overview
//!
//! Skywatch looks up live conditions and a short forecast for a city, picks a
//! display policy (background colour and advice) from the conditions, builds
//! the data for a weather map, and serves weather headlines. A small
//! serialized classifier predicts cloudbursts from seven weather readings.
//!
//! # API Endpoints
//!
//! - `GET /weather?city=&units=` - Current conditions, forecast chart and map
//! - `GET /forecast?city=&units=` - Forecast series and chart only
//! - `GET /home?city=` - Landing page for the visitor's city
//! - `GET /news` - Weather headlines
//! - `POST /predict` - Cloudburst prediction
//! - `GET /about` - Project description
//! - `GET /health` - Health check
//!
//! # Modules
//!
//! - [`model`]: Data types shared across the crate
//! - [`data_sources`]: OpenWeather, ipinfo and NewsAPI clients
//! - [`series`]: Forecast normalization
//! - [`policy`]: Condition to display policy mapping
//! - [`map`]: Weather map overlays
//! - [`classifier`]: Cloudburst model loading and prediction
//! - [`dashboard`]: Page composition
//! - [`api`]: HTTP API handlers
//! - [`config`]: Environment configuration
//! - [`error`]: Error types

pub mod api;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod data_sources;
pub mod error;
pub mod map;
pub mod model;
pub mod policy;
pub mod series;
