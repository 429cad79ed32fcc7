use polars::error::PolarsError;
use std::time::Duration;
use thiserror::Error;

/// Failure to retrieve the report payload of one stream.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for dbkey {dbkey}")]
    NetworkRequest {
        dbkey: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Report request for dbkey {dbkey} failed with status {status}")]
    HttpStatus {
        dbkey: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Report request for dbkey {dbkey} timed out after {timeout:?}")]
    Timeout { dbkey: String, timeout: Duration },

    #[error("Batch deadline passed before dbkey {dbkey} was fetched")]
    DeadlineExceeded { dbkey: String },
}

/// Failure to turn one report payload into samples.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Payload for dbkey {dbkey} is not valid UTF-8")]
    Encoding {
        dbkey: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Could not read payload for dbkey {dbkey} as CSV")]
    CsvRead {
        dbkey: String,
        #[source]
        source: PolarsError,
    },

    #[error("Payload for dbkey {dbkey} has {found} columns, expected {expected}")]
    ColumnCount {
        dbkey: String,
        expected: usize,
        found: usize,
    },

    #[error("Unparseable timestamp '{value}' in payload for dbkey {dbkey} (row {row})")]
    Timestamp {
        dbkey: String,
        row: usize,
        value: String,
    },

    #[error("Unparseable data value '{value}' in payload for dbkey {dbkey} (row {row})")]
    DataValue {
        dbkey: String,
        row: usize,
        value: String,
    },

    #[error("Parse task for dbkey {dbkey} failed to complete")]
    TaskJoin {
        dbkey: String,
        #[source]
        source: tokio::task::JoinError,
    },
}
