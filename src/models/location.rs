use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: Option<String>,
}

impl GeoLocation {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            country: None,
        }
    }

    /// "Madrid, ES" when the country is known, otherwise just the name
    pub fn display_name(&self) -> String {
        match self.country.as_deref() {
            Some(c) if !c.is_empty() => format!("{}, {}", self.name, c),
            _ => self.name.clone(),
        }
    }
}
