//! Turns one raw report payload into typed samples.
//!
//! A `format6` CSV report looks like this:
//!
//! ```text
//! <three lines of report preamble>
//! 10-SEP-2021 00:00:00,S331_W,IX844,82.3,,
//! 10-SEP-2021 00:15:00,S331_W,IX844,82.1,,M
//! MEASURING POINT REFERENCE ELEVATION ...   (optional footer)
//! ```
//!
//! The preamble is dropped, anything from the footer marker on is cut off and
//! the rest is read as a header-less six column table.

use crate::timeseries::error::FormatError;
use crate::types::outcome::PayloadOutcome;
use crate::types::sample::Sample;
use crate::utils::{non_blank, parse_portal_datetime};
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};
use polars::prelude::*;
use std::io::Cursor;
use tokio::task;

/// Fixed number of non-tabular lines at the top of every payload.
pub const PREAMBLE_LINES: usize = 3;
/// Start of the boilerplate the portal appends after some reports.
pub const FOOTER_MARKER: &str = "MEASURING POINT REFERENCE ELEVATION";

const PAYLOAD_COLUMNS: [&str; 6] = [
    "sample_dt",
    "dcvp_station_id",
    "dbkey",
    "data_value",
    "unused",
    "quality_flag",
];

/// Parses the payload fetched for `dbkey`.
///
/// Returns [`PayloadOutcome::Empty`] when no data rows remain after removing
/// the preamble and footer, and [`PayloadOutcome::Failed`] when the remaining
/// text is not the expected six column table.
pub fn parse_payload(dbkey: &str, payload: &[u8]) -> PayloadOutcome {
    match parse_samples(dbkey, payload) {
        Ok(samples) if samples.is_empty() => PayloadOutcome::Empty,
        Ok(samples) => PayloadOutcome::Parsed(samples),
        Err(e) => PayloadOutcome::Failed(e),
    }
}

fn parse_samples(dbkey: &str, payload: &[u8]) -> Result<Vec<Sample>, FormatError> {
    let text = std::str::from_utf8(payload).map_err(|source| FormatError::Encoding {
        dbkey: dbkey.to_string(),
        source,
    })?;

    let Some(table) = tabular_section(text) else {
        debug!("Payload for dbkey {} has no data rows", dbkey);
        return Ok(Vec::new());
    };

    let csv_err = |source: PolarsError| FormatError::CsvRead {
        dbkey: dbkey.to_string(),
        source,
    };

    // Schema inference is disabled so every column is read as text; typing happens below.
    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(table.into_bytes()))
        .finish()
        .map_err(csv_err)?;

    if df.width() != PAYLOAD_COLUMNS.len() {
        warn!(
            "Payload column count ({}) does not match expected ({}) for dbkey {}",
            df.width(),
            PAYLOAD_COLUMNS.len(),
            dbkey
        );
        return Err(FormatError::ColumnCount {
            dbkey: dbkey.to_string(),
            expected: PAYLOAD_COLUMNS.len(),
            found: df.width(),
        });
    }
    df.set_column_names(PAYLOAD_COLUMNS).map_err(csv_err)?;

    let timestamps = df.column("sample_dt").and_then(|c| c.str()).map_err(csv_err)?;
    let keys = df.column("dbkey").and_then(|c| c.str()).map_err(csv_err)?;
    let values = df.column("data_value").and_then(|c| c.str()).map_err(csv_err)?;
    let flags = df.column("quality_flag").and_then(|c| c.str()).map_err(csv_err)?;

    let mut samples = Vec::with_capacity(df.height());
    let rows = timestamps
        .into_iter()
        .zip(keys)
        .zip(values)
        .zip(flags)
        .enumerate();
    for (idx, (((sample_dt, key), value), flag)) in rows {
        let row = idx + 1;
        let raw_dt = sample_dt.unwrap_or_default();
        let sample_dt = parse_portal_datetime(raw_dt).ok_or_else(|| FormatError::Timestamp {
            dbkey: dbkey.to_string(),
            row,
            value: raw_dt.to_string(),
        })?;

        let data_value = match value.and_then(non_blank) {
            None => None,
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| FormatError::DataValue {
                dbkey: dbkey.to_string(),
                row,
                value: raw.to_string(),
            })?),
        };

        samples.push(Sample {
            sample_dt,
            dbkey: key
                .and_then(non_blank)
                .unwrap_or(dbkey)
                .to_string(),
            data_value,
            quality_flag: flag.and_then(non_blank).map(str::to_string),
        });
    }

    Ok(samples)
}

/// Strips the preamble and footer. `None` when nothing but whitespace remains.
fn tabular_section(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().skip(PREAMBLE_LINES).collect();
    let end = lines
        .iter()
        .position(|line| line.contains(FOOTER_MARKER))
        .unwrap_or(lines.len());

    let rows: Vec<&str> = lines[..end]
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(rows.join("\n"))
    }
}

/// Parses every payload on the blocking pool with at most `workers` parses running.
pub(crate) async fn parse_all(
    payloads: Vec<(String, Vec<u8>)>,
    workers: usize,
) -> Vec<(String, PayloadOutcome)> {
    let total = payloads.len();
    let outcomes: Vec<(String, PayloadOutcome)> = stream::iter(payloads)
        .map(|(dbkey, payload)| async move {
            let key = dbkey.clone();
            let outcome = match task::spawn_blocking(move || parse_payload(&key, &payload)).await {
                Ok(outcome) => outcome,
                Err(source) => PayloadOutcome::Failed(FormatError::TaskJoin {
                    dbkey: dbkey.clone(),
                    source,
                }),
            };
            if let PayloadOutcome::Failed(e) = &outcome {
                warn!("Dropping dbkey {}: {}", dbkey, e);
            }
            (dbkey, outcome)
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    info!("Parsed {} payloads", total);
    outcomes
}
