//! Map overlay description for the weather page.
//!
//! Builds plain data only. The map widget on the client fetches the tiles
//! itself as the user pans and zooms.

use serde::Serialize;

use crate::model::{Coordinates, WeatherSnapshot};

/// Base URL of the OpenWeather tile server.
const TILE_BASE: &str = "https://tile.openweathermap.org/map";

/// Initial zoom level of the map.
const DEFAULT_ZOOM: u8 = 7;

/// Overlay layers in display order: (name, provider layer id).
const OVERLAY_LAYERS: [(&str, &str); 5] = [
    ("Clouds", "clouds_new"),
    ("Precipitation", "precipitation_new"),
    ("Temperature", "temp_new"),
    ("Wind", "wind_new"),
    ("Pressure", "pressure_new"),
];

/// Everything needed to draw the weather map.
#[derive(Debug, Clone, Serialize)]
pub struct MapOverlay {
    pub base_map: &'static str,
    pub center: Coordinates,
    pub zoom: u8,
    pub layers: Vec<TileLayer>,
    pub marker: Marker,
}

/// One weather overlay.
#[derive(Debug, Clone, Serialize)]
pub struct TileLayer {
    pub name: &'static str,
    pub layer: &'static str,

    /// Tile URL with `{z}`, `{x}` and `{y}` placeholders left for the client.
    pub url_template: String,

    pub attribution: &'static str,
    pub overlay: bool,
    pub control: bool,
}

/// Pin placed on the city.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub location: Coordinates,
    pub tooltip: String,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Build the overlay description for a snapshot's location.
pub fn build_overlays(snapshot: &WeatherSnapshot, api_key: &str) -> MapOverlay {
    let layers = OVERLAY_LAYERS
        .iter()
        .map(|&(name, layer)| TileLayer {
            name,
            layer,
            url_template: format!(
                "{}/{}/{{z}}/{{x}}/{{y}}.png?appid={}",
                TILE_BASE, layer, api_key
            ),
            attribution: "OpenWeatherMap",
            overlay: true,
            control: true,
        })
        .collect();

    MapOverlay {
        base_map: "OpenStreetMap",
        center: snapshot.coordinates,
        zoom: DEFAULT_ZOOM,
        layers,
        marker: Marker {
            location: snapshot.coordinates,
            tooltip: title_case(&snapshot.city),
            color: "blue",
            icon: "info-sign",
        },
    }
}

/// Uppercase the first letter of each word, lowercase the rest.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
