//! Drives fetch, parse and assembly for an already resolved set of streams.

use crate::config::PortalConfig;
use crate::timeseries::assembler::assemble;
use crate::timeseries::dataset::MergedDataset;
use crate::timeseries::fetcher::{fetch_all, ReportSource};
use crate::timeseries::parser::parse_all;
use crate::types::date_window::ReportPeriod;
use crate::types::outcome::{DroppedStream, PipelineReport};
use crate::types::stream::StreamMetadata;
use log::{info, warn};
use std::collections::HashSet;

/// Runs the fetch and parse stages over `streams` and merges the result.
///
/// Each stage completes for every dbkey before the next one starts. Per-stream
/// failures end up in the dataset's report; they never fail the run.
pub(crate) async fn run<S: ReportSource>(
    source: &S,
    config: &PortalConfig,
    streams: &[StreamMetadata],
    period: ReportPeriod,
) -> MergedDataset {
    let dbkeys = unique_dbkeys(streams);
    let mut report = PipelineReport::default();

    let fetched = fetch_all(source, &dbkeys, period, config).await;

    let mut payloads = Vec::with_capacity(fetched.len());
    for (dbkey, result) in fetched {
        match result {
            Ok(payload) => payloads.push((dbkey, payload)),
            Err(e) => report.dropped.push(DroppedStream::from_fetch(&dbkey, &e)),
        }
    }

    let outcomes = parse_all(payloads, config.worker_count()).await;
    let dataset = assemble(outcomes, report, streams);

    info!(
        "Pipeline finished: {} streams, {} records, {} empty, {} dropped",
        streams.len(),
        dataset.len(),
        dataset.report.empty.len(),
        dataset.report.dropped.len()
    );
    dataset
}

/// Dbkeys in first-listed order, each once.
fn unique_dbkeys(streams: &[StreamMetadata]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(streams.len());
    let dbkeys: Vec<String> = streams
        .iter()
        .filter(|s| seen.insert(s.dbkey.as_str()))
        .map(|s| s.dbkey.clone())
        .collect();
    if dbkeys.len() < streams.len() {
        warn!(
            "{} duplicate dbkey listings ignored",
            streams.len() - dbkeys.len()
        );
    }
    dbkeys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::resolver::parse_stream_table;
    use crate::streams::resolver::tests::{results_page, stream_row};
    use crate::timeseries::fetcher::tests::{period, FakePortal};
    use crate::timeseries::parser::tests::{payload, PREAMBLE};
    use crate::types::date_window::DateWindow;
    use crate::types::outcome::DropStage;

    fn fixture() -> String {
        results_page(&[
            stream_row("IX844", "S331_W", "AIRT", ("01-JAN-2021", "31-DEC-2021")),
            stream_row("15233", "L001", "RAIN", ("15-MAR-1992", "30-SEP-2024")),
            stream_row("QUIET", "L005", "WNDS", ("01-JAN-2020", "31-DEC-2022")),
            stream_row("NOPE1", "L006", "AIRT", ("01-JAN-2020", "31-DEC-2022")),
            stream_row("JUNK1", "L007", "AIRT", ("01-JAN-2020", "31-DEC-2022")),
        ])
    }

    #[test]
    fn empty_search_without_window_returns_every_known_stream() {
        let streams = parse_stream_table(&fixture(), DateWindow::default()).unwrap();
        assert!(!streams.is_empty());
        assert_eq!(streams.len(), 5);
    }

    #[tokio::test]
    async fn merges_resolved_streams_end_to_end() {
        let streams = parse_stream_table(&fixture(), period().into()).unwrap();
        let portal = FakePortal::default()
            .with_payload(
                "IX844",
                &payload(&[
                    "10-SEP-2021 00:15:00,S331_W,IX844,82.1,,",
                    "10-SEP-2021 00:00:00,S331_W,IX844,82.3,,",
                    "MEASURING POINT REFERENCE ELEVATION 4.2",
                ]),
            )
            .with_payload("15233", &payload(&["10-SEP-2021 00:00:00,L001,15233,0.01,,A"]))
            .with_payload("QUIET", PREAMBLE)
            .with_payload("JUNK1", &payload(&["this is not,a report"]))
            .failing("NOPE1", u32::MAX);
        let config = PortalConfig::builder().concurrency(2).build();

        let dataset = run(&portal, &config, &streams, period()).await;

        let keys: Vec<&str> = dataset.records.iter().map(|r| r.dbkey()).collect();
        assert_eq!(keys, ["15233", "IX844", "IX844"]);
        assert!(dataset.records[1].sample_dt() < dataset.records[2].sample_dt());
        assert!(dataset.records.iter().all(|r| r.metadata.is_some()));
        assert_eq!(
            dataset.records[1]
                .metadata
                .as_ref()
                .and_then(|m| m.station.as_deref()),
            Some("S331_W")
        );

        assert_eq!(dataset.report.empty, ["QUIET"]);
        let dropped: Vec<(&str, DropStage)> = dataset
            .report
            .dropped
            .iter()
            .map(|d| (d.dbkey.as_str(), d.stage))
            .collect();
        assert_eq!(dropped, [("JUNK1", DropStage::Parse), ("NOPE1", DropStage::Fetch)]);
        assert!(!dataset.report.is_clean());
    }

    #[tokio::test]
    async fn duplicate_listing_is_fetched_once() {
        let page = results_page(&[
            stream_row("IX844", "S331_W", "AIRT", ("01-JAN-2021", "31-DEC-2021")),
            stream_row("IX844", "S331_W", "AIRT", ("01-JAN-2021", "31-DEC-2021")),
        ]);
        let streams = parse_stream_table(&page, period().into()).unwrap();
        assert_eq!(streams.len(), 2);
        let portal = FakePortal::default().with_payload(
            "IX844",
            &payload(&["10-SEP-2021 00:00:00,S331_W,IX844,82.3,,"]),
        );

        let dataset = run(&portal, &PortalConfig::default(), &streams, period()).await;

        assert_eq!(dataset.len(), 1);
        assert_eq!(portal.attempts.lock().unwrap()["IX844"], 1);
    }

    #[test]
    fn unique_dbkeys_keeps_first_listing_order() {
        let page = results_page(&[
            stream_row("B", "S2", "AIRT", ("01-JAN-2021", "31-DEC-2021")),
            stream_row("A", "S1", "AIRT", ("01-JAN-2021", "31-DEC-2021")),
            stream_row("B", "S3", "AIRT", ("01-JAN-2021", "31-DEC-2021")),
        ]);
        let streams = parse_stream_table(&page, DateWindow::default()).unwrap();
        assert_eq!(unique_dbkeys(&streams), ["B", "A"]);
    }

    #[tokio::test]
    async fn no_streams_yields_empty_dataset() {
        let dataset = run(&FakePortal::default(), &PortalConfig::default(), &[], period()).await;
        assert!(dataset.is_empty());
        assert!(dataset.report.is_clean());
        assert!(dataset.report.empty.is_empty());
    }
}
