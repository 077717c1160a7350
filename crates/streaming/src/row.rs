use serde_json::{Map, Value};
use store::{AttributeSet, IconPatch, Verification};

use crate::config::StyleConfig;

pub const FIELD_LATITUDE: &str = "Latitude";
pub const FIELD_LONGITUDE: &str = "Longitude";
pub const FIELD_VERIFIED: &str = "Verified Status";
pub const FIELD_MARKINGS: &str = "Pedestrian Markings";
pub const FIELD_SIGNAL: &str = "Crossing Signal";
pub const FIELD_OTHER: &str = "Other Features";
pub const FIELD_NOTES: &str = "Notes";

/// The survey columns a client reads from one spreadsheet row.
///
/// Spreadsheet cells arrive as text, numbers or booleans depending on the
/// exporter; everything except the coordinates is kept as trimmed text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurveyRow {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub verified_status: Option<String>,
    pub pedestrian_markings: Option<String>,
    pub crossing_signal: Option<String>,
    pub other_features: Option<String>,
    pub notes: Option<String>,
}

impl SurveyRow {
    pub fn from_json(fields: &Map<String, Value>) -> Self {
        Self {
            latitude: fields.get(FIELD_LATITUDE).and_then(coordinate),
            longitude: fields.get(FIELD_LONGITUDE).and_then(coordinate),
            verified_status: fields.get(FIELD_VERIFIED).and_then(cell_text),
            pedestrian_markings: fields.get(FIELD_MARKINGS).and_then(cell_text),
            crossing_signal: fields.get(FIELD_SIGNAL).and_then(cell_text),
            other_features: fields.get(FIELD_OTHER).and_then(cell_text),
            notes: fields.get(FIELD_NOTES).and_then(cell_text),
        }
    }

    /// Agrees with the marker color: only a `Y` status is verified, and a
    /// row without the column counts as unverified.
    pub fn verification(&self) -> Verification {
        if self.verified_status.as_deref().is_some_and(is_yes) {
            Verification::Verified
        } else {
            Verification::Unverified
        }
    }

    /// Any recorded marking other than "unmarked" counts as marked.
    pub fn has_markings(&self) -> bool {
        self.pedestrian_markings
            .as_deref()
            .is_some_and(|m| !m.is_empty() && !m.eq_ignore_ascii_case("unmarked"))
    }

    /// Checkbox state of the markings column in the edit form (`Y` only).
    pub fn markings_flag(&self) -> bool {
        self.pedestrian_markings.as_deref().is_some_and(is_yes)
    }

    pub fn signal_flag(&self) -> bool {
        self.crossing_signal.as_deref().is_some_and(is_yes)
    }

    pub fn popup_content(&self) -> String {
        let line = |label: &str, value: &Option<String>| {
            format!(
                "{label}: {}",
                htmlize::escape_text(value.as_deref().unwrap_or(""))
            )
        };
        [
            line("Verified", &self.verified_status),
            line(FIELD_MARKINGS, &self.pedestrian_markings),
            line(FIELD_SIGNAL, &self.crossing_signal),
            line(FIELD_OTHER, &self.other_features),
            line(FIELD_NOTES, &self.notes),
        ]
        .join("<br>")
    }

    /// Display attributes for this row. Coordinates are only included when
    /// the row carried usable numbers, so a merge never moves a marker to a
    /// placeholder position.
    pub fn to_attributes(&self, style: &StyleConfig) -> AttributeSet {
        let verification = self.verification();
        let background = if verification == Verification::Verified {
            &style.verified_color
        } else {
            &style.unverified_color
        };
        let icon_class = if self.has_markings() {
            &style.marked_icon
        } else {
            &style.unmarked_icon
        };

        AttributeSet {
            latitude: self.latitude,
            longitude: self.longitude,
            icon: Some(IconPatch {
                background_color: Some(background.clone()),
                foreground_color: Some(style.foreground_color.clone()),
                icon_class: Some(icon_class.clone()),
            }),
            popup_content: Some(self.popup_content()),
            verification: Some(verification),
        }
    }
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("y")
}

fn coordinate(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(if *b { "Y" } else { "N" }.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::Color;
    use serde_json::json;

    fn row(value: Value) -> SurveyRow {
        match value {
            Value::Object(map) => SurveyRow::from_json(&map),
            _ => panic!("test rows are objects"),
        }
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_text() {
        let r = row(json!({"Latitude": 41.5, "Longitude": " -71.25 "}));
        assert_eq!(r.latitude, Some(41.5));
        assert_eq!(r.longitude, Some(-71.25));

        let r = row(json!({"Latitude": "", "Longitude": "n/a"}));
        assert_eq!(r.latitude, None);
        assert_eq!(r.longitude, None);
    }

    #[test]
    fn verification_from_status_column() {
        assert_eq!(row(json!({"Verified Status": "Y"})).verification(), Verification::Verified);
        assert_eq!(row(json!({"Verified Status": " y "})).verification(), Verification::Verified);
        assert_eq!(row(json!({"Verified Status": "N"})).verification(), Verification::Unverified);
        assert_eq!(row(json!({"Verified Status": ""})).verification(), Verification::Unverified);
        assert_eq!(row(json!({})).verification(), Verification::Unverified);
    }

    #[test]
    fn verification_always_matches_the_background() {
        let style = StyleConfig::default();
        for status in [json!({}), json!({"Verified Status": "N"}), json!({"Verified Status": "y"})] {
            let attrs = row(status).to_attributes(&style);
            let background = attrs.icon.as_ref().and_then(|i| i.background_color.clone());
            let expected = match attrs.verification {
                Some(Verification::Verified) => Some(style.verified_color.clone()),
                _ => Some(style.unverified_color.clone()),
            };
            assert_eq!(background, expected);
            assert_ne!(attrs.verification, Some(Verification::Unknown));
        }
    }

    #[test]
    fn markings_pick_the_icon() {
        let style = StyleConfig::default();
        let marked = row(json!({"Pedestrian Markings": "Zebra"})).to_attributes(&style);
        let unmarked = row(json!({"Pedestrian Markings": "UNMARKED"})).to_attributes(&style);
        let missing = row(json!({})).to_attributes(&style);

        let class = |a: &AttributeSet| a.icon.as_ref().and_then(|i| i.icon_class.clone());
        assert_eq!(class(&marked).as_deref(), Some("fa-times"));
        assert_eq!(class(&unmarked).as_deref(), Some("fa-exchange"));
        assert_eq!(class(&missing).as_deref(), Some("fa-exchange"));
    }

    #[test]
    fn attributes_use_configured_colors() {
        let style = StyleConfig::default();
        let attrs = row(json!({"Latitude": 45, "Longitude": -71, "Verified Status": "Y"}))
            .to_attributes(&style);
        let icon = attrs.icon.unwrap();
        assert_eq!(icon.background_color, Some(Color::named("green")));
        assert_eq!(icon.foreground_color, Some(Color::white()));
        assert_eq!(attrs.latitude, Some(45.0));

        let attrs = row(json!({"Verified Status": "N"})).to_attributes(&style);
        assert_eq!(attrs.icon.unwrap().background_color, Some(Color::named("blue")));
        assert_eq!(attrs.latitude, None);
    }

    #[test]
    fn popup_lists_columns_and_escapes_markup() {
        let r = row(json!({
            "Verified Status": "Y",
            "Pedestrian Markings": "Y",
            "Crossing Signal": "N",
            "Notes": "<b>curb</b> & ramp",
        }));
        assert_eq!(
            r.popup_content(),
            "Verified: Y<br>Pedestrian Markings: Y<br>Crossing Signal: N<br>\
             Other Features: <br>Notes: &lt;b&gt;curb&lt;/b&gt; &amp; ramp"
        );
    }

    #[test]
    fn form_flags_require_yes() {
        let r = row(json!({"Pedestrian Markings": "Zebra", "Crossing Signal": true}));
        assert!(r.has_markings());
        assert!(!r.markings_flag());
        assert!(r.signal_flag());
    }
}
