//! Station records from the portal's station listing.

use serde::{Deserialize, Serialize};

/// A monitoring station as listed by the station search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station: String,
    pub site: Option<String>,
    /// Station type code, e.g. `WELL` or `WEATHER`.
    pub station_type: Option<String>,
    /// Latitude in signed decimal degrees.
    pub lat: Option<f64>,
    /// Longitude in signed decimal degrees (negative, western hemisphere).
    pub lon: Option<f64>,
    pub county: Option<String>,
    pub basin: Option<String>,
    pub description: Option<String>,
}
