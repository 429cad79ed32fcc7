use crate::streams::error::ResolveError;
use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbHydroError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Session bootstrap request to {url} failed")]
    Bootstrap {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Start date {start} is after end date {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to create export file '{0}'")]
    ExportIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode export file '{0}'")]
    ExportEncode(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
