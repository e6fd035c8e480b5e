use std::collections::HashSet;

use canavial_core::error::{NetworkError, ReqwestErrorExt, SearchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A candidate location returned by the city lookup.
///
/// Field names match the `/api/cities` wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    /// First-level administrative region (state)
    #[serde(default)]
    pub admin1: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: String,
    /// Display label, e.g. "Piracicaba - São Paulo - Brasil"
    #[serde(default)]
    pub label: String,
}

/// Suggestions and cities are the same thing on the wire.
pub type Suggestion = City;

impl City {
    /// Text mirrored into the search field once this city is selected.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Row identity: suggestions in one response never share coordinates.
    pub fn key(&self) -> String {
        format!("{}-{}", self.latitude, self.longitude)
    }

    fn coordinates_bits(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// City lookup errors
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The lookup was superseded or torn down. Not a failure.
    #[error("Lookup cancelled")]
    Cancelled,
    #[error("Query too short: {0:?}")]
    QueryTooShort(String),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LookupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LookupError::Cancelled)
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Network(e.into_network_error())
    }
}

impl From<LookupError> for SearchError {
    fn from(e: LookupError) -> Self {
        SearchError::LookupFailed(e.to_string())
    }
}

/// Parse a lookup response body into suggestions.
///
/// Accepts a bare array or an object wrapping one under `cities`; a missing
/// or null `cities` is an empty result. Coordinates that repeat an earlier
/// entry are dropped.
pub fn parse_suggestions(body: Value) -> Result<Vec<City>, LookupError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => match map.remove("cities") {
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(cities) => cities,
        },
        other => {
            return Err(LookupError::Parse(format!(
                "expected a list of cities, got {}",
                other
            )))
        }
    };

    let cities: Vec<City> =
        serde_json::from_value(list).map_err(|e| LookupError::Parse(e.to_string()))?;

    let mut seen = HashSet::with_capacity(cities.len());
    let unique: Vec<City> = cities
        .into_iter()
        .filter(|c| seen.insert(c.coordinates_bits()))
        .collect();

    Ok(unique)
}
