use foundation::{Color, LatLng, MarkerId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ICON_CLASS: &str = "fa-info-circle";

/// Verification state of the survey row behind a marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verification {
    Verified,
    Unverified,
    #[default]
    Unknown,
}

/// Icon option group. Merged field by field, independently of the rest of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconOptions {
    pub background_color: Color,
    pub foreground_color: Color,
    pub icon_class: String,
}

impl Default for IconOptions {
    fn default() -> Self {
        Self {
            background_color: Color::white(),
            foreground_color: Color::black(),
            icon_class: DEFAULT_ICON_CLASS.to_string(),
        }
    }
}

impl IconOptions {
    /// Class list for icon fonts that expect the family prefix ("fa fa-times").
    pub fn css_classes(&self) -> String {
        if self.icon_class.starts_with("fa ") {
            self.icon_class.clone()
        } else {
            format!("fa {}", self.icon_class)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IconPatch {
    pub background_color: Option<Color>,
    pub foreground_color: Option<Color>,
    pub icon_class: Option<String>,
}

impl IconPatch {
    pub fn is_empty(&self) -> bool {
        self.background_color.is_none()
            && self.foreground_color.is_none()
            && self.icon_class.is_none()
    }
}

/// Partial record update. `None` means "keep what the record already has".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeSet {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub icon: Option<IconPatch>,
    pub popup_content: Option<String>,
    pub verification: Option<Verification>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    pub fn with_background(mut self, color: impl Into<Color>) -> Self {
        self.icon_mut().background_color = Some(color.into());
        self
    }

    pub fn with_foreground(mut self, color: impl Into<Color>) -> Self {
        self.icon_mut().foreground_color = Some(color.into());
        self
    }

    pub fn with_icon_class(mut self, class: impl Into<String>) -> Self {
        self.icon_mut().icon_class = Some(class.into());
        self
    }

    pub fn with_popup(mut self, content: impl Into<String>) -> Self {
        self.popup_content = Some(content.into());
        self
    }

    pub fn with_verification(mut self, verification: Verification) -> Self {
        self.verification = Some(verification);
        self
    }

    fn icon_mut(&mut self) -> &mut IconPatch {
        self.icon.get_or_insert_with(IconPatch::default)
    }
}

/// Display attributes of one survey row.
///
/// Every field is always populated: a fresh record starts from neutral
/// defaults and merges only ever overwrite. The record also remembers whether
/// each coordinate was ever supplied, so a default (0, 0) is never plotted.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub latitude: f64,
    pub longitude: f64,
    pub icon: IconOptions,
    pub popup_content: String,
    pub verification: Verification,
    has_latitude: bool,
    has_longitude: bool,
}

impl MarkerRecord {
    pub fn new(id: MarkerId) -> Self {
        Self {
            id,
            latitude: 0.0,
            longitude: 0.0,
            icon: IconOptions::default(),
            popup_content: String::new(),
            verification: Verification::Unknown,
            has_latitude: false,
            has_longitude: false,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// True once both coordinates have been supplied and are finite.
    pub fn is_placeable(&self) -> bool {
        self.has_latitude && self.has_longitude && self.position().is_finite()
    }

    /// Merges `partial` over this record. Returns `true` if anything changed.
    pub fn merge(&mut self, partial: &AttributeSet) -> bool {
        let before = self.clone();

        if let Some(lat) = partial.latitude {
            self.latitude = lat;
            self.has_latitude = true;
        }
        if let Some(lng) = partial.longitude {
            self.longitude = lng;
            self.has_longitude = true;
        }
        if let Some(icon) = &partial.icon {
            if let Some(color) = &icon.background_color {
                self.icon.background_color = color.clone();
            }
            if let Some(color) = &icon.foreground_color {
                self.icon.foreground_color = color.clone();
            }
            if let Some(class) = &icon.icon_class {
                self.icon.icon_class = class.clone();
            }
        }
        if let Some(content) = &partial.popup_content {
            self.popup_content = content.clone();
        }
        if let Some(verification) = partial.verification {
            self.verification = verification;
        }

        *self != before
    }
}
