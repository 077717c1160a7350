use std::fmt;

use serde::{Deserialize, Serialize};

/// A CSS color value as understood by the map surface ("green", "#ff8800").
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn named(name: impl Into<String>) -> Self {
        Color(name.into())
    }

    pub fn white() -> Self {
        Color::named("white")
    }

    pub fn black() -> Self {
        Color::named("black")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Color::named(value)
    }
}
