//! Metadata describing one resolved DBHYDRO data stream ("dbkey").

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the portal's dbkey search results.
///
/// Rows whose coverage dates cannot be parsed never become a `StreamMetadata`,
/// so `start_date` and `end_date` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    /// The portal's unique stream identifier.
    pub dbkey: String,
    pub station: Option<String>,
    pub group: Option<String>,
    pub site: Option<String>,
    /// Data type code, e.g. `AIRT` or `RAIN`.
    pub data_type: Option<String>,
    pub freq: Option<String>,
    /// Statistic code, e.g. `MEAN` or `SUM`.
    pub stat: Option<String>,
    pub recorder: Option<String>,
    pub agency: Option<String>,
    /// First day of recorded coverage.
    pub start_date: NaiveDate,
    /// Last day of recorded coverage.
    pub end_date: NaiveDate,
    pub county: Option<String>,
    pub basin: Option<String>,
    /// Latitude in signed decimal degrees.
    pub lat: Option<f64>,
    /// Longitude in signed decimal degrees (negative, western hemisphere).
    pub lon: Option<f64>,
}
