//! Bounded concurrent download of report payloads, one per dbkey.

use crate::config::PortalConfig;
use crate::timeseries::error::FetchError;
use crate::transport::Transport;
use crate::types::date_window::ReportPeriod;
use crate::utils::REPORT_DATE_FORMAT;
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};
use tokio::time::Instant;

const REPORT_PROCEDURE: &str = "web_io.report_process";

/// Something that can produce the raw report payload of one stream.
///
/// [`Transport`] is the production implementation.
pub(crate) trait ReportSource {
    async fn fetch_report(&self, dbkey: &str, period: ReportPeriod) -> Result<Vec<u8>, FetchError>;
}

impl ReportSource for Transport {
    async fn fetch_report(&self, dbkey: &str, period: ReportPeriod) -> Result<Vec<u8>, FetchError> {
        let url = self.config().endpoint(REPORT_PROCEDURE);
        let params = report_params(dbkey, period);
        debug!("Requesting report for dbkey {}", dbkey);

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    dbkey: dbkey.to_string(),
                    timeout: self.config().request_timeout,
                }
            } else if let Some(status) = e.status() {
                FetchError::HttpStatus {
                    dbkey: dbkey.to_string(),
                    status,
                    source: e,
                }
            } else {
                FetchError::NetworkRequest {
                    dbkey: dbkey.to_string(),
                    source: e,
                }
            }
        };

        let response = self
            .client()
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;
        let body = response.bytes().await.map_err(classify)?;

        debug!("Received {} bytes for dbkey {}", body.len(), dbkey);
        Ok(body.to_vec())
    }
}

/// Query of the CSV (`format6`) report for one dbkey over `period`.
fn report_params(dbkey: &str, period: ReportPeriod) -> [(&'static str, String); 9] {
    [
        ("v_start_date", period.start.format(REPORT_DATE_FORMAT).to_string()),
        ("v_end_date", period.end.format(REPORT_DATE_FORMAT).to_string()),
        ("v_target_code", "file_csv".to_string()),
        ("v_run_mode", "onLine".to_string()),
        ("v_report_type", "format6".to_string()),
        ("v_dbkey", dbkey.to_string()),
        ("v_js_flag", "Y".to_string()),
        ("v_os_code", "Win".to_string()),
        ("v_interval_count", "5".to_string()),
    ]
}

/// Fetches one payload per dbkey with at most `config.worker_count()` requests in flight.
///
/// Every dbkey appears exactly once in the result, paired with its payload or
/// the error that prevented it. A failing dbkey never cancels its siblings.
/// Result order follows completion, not input order.
pub(crate) async fn fetch_all<S: ReportSource>(
    source: &S,
    dbkeys: &[String],
    period: ReportPeriod,
    config: &PortalConfig,
) -> Vec<(String, Result<Vec<u8>, FetchError>)> {
    let deadline = config.batch_deadline.map(|d| Instant::now() + d);
    info!(
        "Fetching {} reports from {} to {} with {} workers",
        dbkeys.len(),
        period.start,
        period.end,
        config.worker_count()
    );

    let results: Vec<(String, Result<Vec<u8>, FetchError>)> = stream::iter(dbkeys)
        .map(|dbkey| async move {
            let result = fetch_with_retry(source, dbkey, period, config, deadline).await;
            if let Err(e) = &result {
                warn!("Dropping dbkey {}: {}", dbkey, e);
            }
            (dbkey.clone(), result)
        })
        .buffer_unordered(config.worker_count())
        .collect()
        .await;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    info!(
        "Fetched {} reports, {} failed",
        results.len() - failed,
        failed
    );
    results
}

async fn fetch_with_retry<S: ReportSource>(
    source: &S,
    dbkey: &str,
    period: ReportPeriod,
    config: &PortalConfig,
    deadline: Option<Instant>,
) -> Result<Vec<u8>, FetchError> {
    let mut attempt: u32 = 0;
    loop {
        let request = source.fetch_report(dbkey, period);
        let result = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, request).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(FetchError::DeadlineExceeded {
                        dbkey: dbkey.to_string(),
                    })
                }
            },
            None => request.await,
        };

        match result {
            Ok(payload) => return Ok(payload),
            Err(e) if attempt < config.max_retries => {
                let delay = config
                    .retry_backoff
                    .saturating_mul(2u32.saturating_pow(attempt));
                // A retry that cannot start before the deadline is never attempted.
                let resumes_at = Instant::now().checked_add(delay);
                if deadline.is_some_and(|deadline| resumes_at.map_or(true, |t| t >= deadline)) {
                    warn!(
                        "Not retrying dbkey {} ({}): backoff of {:?} passes the batch deadline",
                        dbkey, e, delay
                    );
                    return Err(FetchError::DeadlineExceeded {
                        dbkey: dbkey.to_string(),
                    });
                }
                attempt += 1;
                warn!(
                    "Attempt {} for dbkey {} failed ({}), retrying in {:?}",
                    attempt, dbkey, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
