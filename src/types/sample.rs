use crate::types::stream::StreamMetadata;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single observation parsed from a report payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_dt: NaiveDateTime,
    pub dbkey: String,
    /// The observed value; `None` when the portal left the cell blank.
    pub data_value: Option<f64>,
    /// Portal quality code. Not necessarily numeric.
    pub quality_flag: Option<String>,
}

/// A [`Sample`] joined with the metadata of its stream.
///
/// `metadata` is `None` only when no resolved stream carries the sample's dbkey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub sample: Sample,
    pub metadata: Option<StreamMetadata>,
}

impl MergedRecord {
    pub fn dbkey(&self) -> &str {
        &self.sample.dbkey
    }

    pub fn sample_dt(&self) -> NaiveDateTime {
        self.sample.sample_dt
    }
}
