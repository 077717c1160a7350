use foundation::Color;
use serde::{Deserialize, Serialize};
use store::Legend;

/// How survey rows are turned into marker styles, plus the legend shown for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Marker background when `Verified Status` is `Y`.
    pub verified_color: Color,
    pub unverified_color: Color,
    pub foreground_color: Color,
    /// Icon for rows with pedestrian markings.
    pub marked_icon: String,
    pub unmarked_icon: String,
    pub legend: Legend,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            verified_color: Color::named("green"),
            unverified_color: Color::named("blue"),
            foreground_color: Color::white(),
            marked_icon: "fa-times".to_string(),
            unmarked_icon: "fa-exchange".to_string(),
            legend: Legend::default(),
        }
    }
}

impl StyleConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
