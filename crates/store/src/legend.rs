use foundation::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: impl Into<Color>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Ordered label → color mapping shown in the map legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Legend {
    entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn new(entries: Vec<LegendEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn color_of(&self, label: &str) -> Option<&Color> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.color)
    }
}

impl Default for Legend {
    fn default() -> Self {
        Self::new(vec![
            LegendEntry::new("Verified", "green"),
            LegendEntry::new("Not Verified", "blue"),
            LegendEntry::new("Cluster contains both", "orange"),
        ])
    }
}
