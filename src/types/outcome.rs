//! Per-stream outcomes of the fetch and parse stages, and the report that
//! collects the non-fatal ones.

use crate::timeseries::error::{FetchError, FormatError};
use crate::types::sample::Sample;
use serde::Serialize;
use std::fmt;

/// Result of parsing one payload.
#[derive(Debug)]
pub enum PayloadOutcome {
    /// The payload carried no data rows.
    Empty,
    /// The payload parsed into one or more samples.
    Parsed(Vec<Sample>),
    /// The payload could not be parsed.
    Failed(FormatError),
}

/// Which stage dropped a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropStage {
    Fetch,
    Parse,
}

impl fmt::Display for DropStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropStage::Fetch => write!(f, "fetch"),
            DropStage::Parse => write!(f, "parse"),
        }
    }
}

/// A stream excluded from the merged dataset because of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedStream {
    pub dbkey: String,
    pub stage: DropStage,
    /// Rendered error message, including its source chain.
    pub reason: String,
}

impl DroppedStream {
    pub(crate) fn from_fetch(dbkey: &str, error: &FetchError) -> Self {
        Self {
            dbkey: dbkey.to_string(),
            stage: DropStage::Fetch,
            reason: render_chain(error),
        }
    }

    pub(crate) fn from_format(dbkey: &str, error: &FormatError) -> Self {
        Self {
            dbkey: dbkey.to_string(),
            stage: DropStage::Parse,
            reason: render_chain(error),
        }
    }
}

/// Non-fatal results of one pipeline run.
///
/// `empty` lists streams that simply had no rows in the window; `dropped`
/// lists streams whose data was unavailable because of an error.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub empty: Vec<String>,
    pub dropped: Vec<DroppedStream>,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }

    pub(crate) fn sort(&mut self) {
        self.empty.sort();
        self.dropped.sort_by(|a, b| a.dbkey.cmp(&b.dbkey));
    }
}

fn render_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
