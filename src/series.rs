//! Reshaping raw forecast entries into a [`ForecastSeries`].
//!
//! Everything in this module is pure: no I/O and no failure modes. Provider
//! success has already been checked by the time entries get here.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::data_sources::openweather::{ForecastEntry, ForecastMain};
use crate::model::{ForecastSample, ForecastSeries};

/// Format for the hour-of-day label, e.g. "03 PM".
const LABEL_FORMAT: &str = "%I %p";

/// Build a fixed offset from a provider `timezone` shift in seconds.
///
/// Shifts outside ±24h fall back to UTC.
pub fn utc_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

/// Normalize provider entries into an ordered series.
///
/// # Guarantees
///
/// - Output has one sample per entry, in the same order:
///   `series.samples[i].timestamp` is `entries[i].dt`.
/// - Labels are the hour of day in `offset`, formatted `%I %p`. Two entries in
///   the same hour get the same label; they are not merged.
/// - A missing `pop` counts as 0.0; the probability is scaled to percent.
pub fn normalize(entries: &[ForecastEntry], offset: FixedOffset) -> ForecastSeries {
    let samples = entries
        .iter()
        .map(|entry| {
            // Out-of-range timestamps cannot come from a real provider; pin them to the epoch.
            let timestamp = DateTime::from_timestamp(entry.dt, 0).unwrap_or_default();
            ForecastSample {
                timestamp,
                label: timestamp
                    .with_timezone(&offset)
                    .format(LABEL_FORMAT)
                    .to_string(),
                temperature: entry.main.temp,
                humidity: entry.main.humidity,
                rain_probability: entry.pop.unwrap_or(0.0) * 100.0,
            }
        })
        .collect();

    ForecastSeries::new(samples)
}

impl From<&ForecastSample> for ForecastEntry {
    fn from(sample: &ForecastSample) -> Self {
        ForecastEntry {
            dt: sample.timestamp.timestamp(),
            main: ForecastMain {
                temp: sample.temperature,
                humidity: sample.humidity,
            },
            pop: Some(sample.rain_probability / 100.0),
        }
    }
}
