//! The main entry point: a client for the DBHYDRO portal that resolves data
//! streams and merges their time series into one dataset.

use crate::config::PortalConfig;
use crate::error::DbHydroError;
use crate::pipeline;
use crate::streams::resolver::{resolve_streams, MATCH_ALL};
use crate::streams::station_listing::list_stations;
use crate::timeseries::dataset::MergedDataset;
use crate::transport::Transport;
use crate::types::date_window::{DateWindow, ReportPeriod};
use crate::types::station::Station;
use crate::types::stream::StreamMetadata;
use bon::bon;
use chrono::NaiveDate;
use log::info;

/// Client for the South Florida Water Management District's DBHYDRO portal.
///
/// Owns one [`Transport`] (HTTP session plus settings) that every request
/// shares. Create it with [`DbHydro::new()`] for the public defaults or
/// [`DbHydro::with_config()`] to tune concurrency, timeouts and retries.
///
/// # Examples
///
/// ```no_run
/// # use dbhydro::{DbHydro, DbHydroError};
/// # use chrono::NaiveDate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), DbHydroError> {
/// let client = DbHydro::new().await?;
/// let dataset = client
///     .fetch_and_merge()
///     .start(NaiveDate::from_ymd_opt(2021, 9, 10).unwrap())
///     .end(NaiveDate::from_ymd_opt(2021, 9, 10).unwrap())
///     .search_term("S331%")
///     .call()
///     .await?;
/// println!("{} records, {} streams dropped", dataset.len(), dataset.report.dropped.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DbHydro {
    transport: Transport,
}

#[bon]
impl DbHydro {
    /// Connects with [`PortalConfig::default()`].
    ///
    /// # Errors
    ///
    /// Returns [`DbHydroError::ClientBuild`] if the HTTP client cannot be created
    /// and [`DbHydroError::Bootstrap`] if the session bootstrap request fails.
    pub async fn new() -> Result<Self, DbHydroError> {
        Self::with_config(PortalConfig::default()).await
    }

    /// Connects with custom settings.
    pub async fn with_config(config: PortalConfig) -> Result<Self, DbHydroError> {
        Ok(Self {
            transport: Transport::connect(config).await?,
        })
    }

    /// Wraps an already connected transport.
    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Resolves a station search term into the streams whose coverage
    /// intersects the optional `[start, end]` window.
    ///
    /// * `.search_term(&str)`: Optional. Station name pattern; `%` is a
    ///   wildcard. Missing or blank matches every station.
    /// * `.start(NaiveDate)` / `.end(NaiveDate)`: Optional inclusive bounds.
    ///   An omitted bound does not filter that side.
    ///
    /// # Errors
    ///
    /// Returns [`DbHydroError::InvalidWindow`] if `start` is after `end`, and
    /// [`DbHydroError::Resolve`] if the request fails or the results page does
    /// not have the expected layout.
    ///
    /// ```no_run
    /// # use dbhydro::{DbHydro, DbHydroError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), DbHydroError> {
    /// let client = DbHydro::new().await?;
    /// let streams = client.resolve().call().await?;
    /// assert!(!streams.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn resolve(
        &self,
        search_term: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<StreamMetadata>, DbHydroError> {
        if let (Some(start), Some(end)) = (start, end) {
            check_window(start, end)?;
        }
        let term = normalize_search_term(search_term);
        Ok(resolve_streams(&self.transport, term, DateWindow::new(start, end)).await?)
    }

    /// Resolves streams for `search_term` over `[start, end]`, downloads each
    /// stream's report concurrently, parses the reports and left-joins the
    /// samples with their stream metadata.
    ///
    /// Per-stream fetch and parse failures do not fail the call. They are
    /// listed in [`MergedDataset::report`] together with streams that had no
    /// rows in the window.
    ///
    /// # Errors
    ///
    /// Returns [`DbHydroError::InvalidWindow`] if `start` is after `end` and
    /// [`DbHydroError::Resolve`] if stream resolution fails. No report is
    /// requested in either case.
    #[builder]
    pub async fn fetch_and_merge(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        search_term: Option<&str>,
    ) -> Result<MergedDataset, DbHydroError> {
        check_window(start, end)?;
        let period = ReportPeriod { start, end };
        let term = normalize_search_term(search_term);

        let streams = resolve_streams(&self.transport, term, period.into()).await?;
        info!("Merging {} streams for '{}'", streams.len(), term);

        Ok(pipeline::run(&self.transport, self.transport.config(), &streams, period).await)
    }

    /// Lists stations (without time-series metadata) whose name matches `name`.
    ///
    /// * `.name(&str)`: Optional. Station name pattern; missing or blank matches every station.
    #[builder]
    pub async fn stations(&self, name: Option<&str>) -> Result<Vec<Station>, DbHydroError> {
        Ok(list_stations(&self.transport, normalize_search_term(name)).await?)
    }
}

fn check_window(start: NaiveDate, end: NaiveDate) -> Result<(), DbHydroError> {
    if start > end {
        return Err(DbHydroError::InvalidWindow { start, end });
    }
    Ok(())
}

fn normalize_search_term(term: Option<&str>) -> &str {
    match term.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => MATCH_ALL,
    }
}
