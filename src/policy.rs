//! Display policy: background colour and advisory for the current conditions.
//!
//! # Matching rule
//!
//! The description ("light rain", "overcast clouds") is lowercased and scanned
//! against [`POLICIES`] in order; the first key contained in it wins. If the
//! description matches nothing, the condition label ("Rain", "Clouds") gets the
//! same scan. Otherwise the neutral [`DEFAULT_POLICY`] applies.
//!
//! Order matters: "thunderstorm with light rain" must resolve to the
//! thunderstorm entry, so it comes before rain.

use crate::model::{Advisory, AdvisoryLevel, DisplayPolicy};

/// Policy for conditions that match no key.
pub const DEFAULT_POLICY: DisplayPolicy = DisplayPolicy {
    key: "default",
    color: "#F9F9F9",
    advisory: None,
};

/// Ordered lookup table. First match wins.
pub const POLICIES: [DisplayPolicy; 7] = [
    DisplayPolicy {
        key: "thunderstorm",
        color: "#C7D2FE",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Warning,
            text: "⛈️ Thunderstorms around. Stay indoors if you can!",
        }),
    },
    DisplayPolicy {
        key: "rain",
        color: "#D0E5F2",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Warning,
            text: "☔ Carry an umbrella!",
        }),
    },
    DisplayPolicy {
        key: "drizzle",
        color: "#D0E5F2",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Info,
            text: "🌦️ A light jacket should do.",
        }),
    },
    DisplayPolicy {
        key: "snow",
        color: "#F0F8FF",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Warning,
            text: "❄️ Dress warmly!",
        }),
    },
    DisplayPolicy {
        key: "clear",
        color: "#FDF6EC",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Success,
            text: "☀️ Great weather today!",
        }),
    },
    DisplayPolicy {
        key: "cloud",
        color: "#ECECEC",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Info,
            text: "☁️ A little cloudy.",
        }),
    },
    DisplayPolicy {
        key: "mist",
        color: "#E8E8E8",
        advisory: Some(Advisory {
            level: AdvisoryLevel::Info,
            text: "🌫️ Low visibility, drive carefully.",
        }),
    },
];

/// Select the display policy for a condition.
///
/// Total: every input, including empty strings, yields a policy.
pub fn select_policy(description: &str, label: &str) -> DisplayPolicy {
    first_match(description)
        .or_else(|| first_match(label))
        .unwrap_or(DEFAULT_POLICY)
}

fn first_match(text: &str) -> Option<DisplayPolicy> {
    if text.is_empty() {
        return None;
    }
    let text = text.to_lowercase();
    POLICIES.iter().find(|p| text.contains(p.key)).copied()
}
