//! Combines parsed samples with stream metadata into the merged dataset.

use crate::timeseries::dataset::MergedDataset;
use crate::types::outcome::{DroppedStream, PayloadOutcome, PipelineReport};
use crate::types::sample::{MergedRecord, Sample};
use crate::types::stream::StreamMetadata;
use log::{info, warn};
use std::collections::HashMap;

/// Left-joins `samples` to `streams` on dbkey.
///
/// Every sample yields exactly one record. Samples whose dbkey matches no
/// stream keep `metadata = None`. If `streams` lists a dbkey more than once,
/// the first listing wins.
pub fn left_join(samples: Vec<Sample>, streams: &[StreamMetadata]) -> Vec<MergedRecord> {
    let lookup = make_lookup(streams);

    let mut unmatched = 0usize;
    let records: Vec<MergedRecord> = samples
        .into_iter()
        .map(|sample| {
            let metadata = lookup.get(sample.dbkey.as_str()).map(|m| (*m).clone());
            if metadata.is_none() {
                unmatched += 1;
            }
            MergedRecord { sample, metadata }
        })
        .collect();

    if unmatched > 0 {
        warn!("{} samples have no matching stream metadata", unmatched);
    }
    records
}

// dbkey -> metadata, first occurrence kept
fn make_lookup(streams: &[StreamMetadata]) -> HashMap<&str, &StreamMetadata> {
    let mut lookup = HashMap::with_capacity(streams.len());
    for stream in streams {
        lookup.entry(stream.dbkey.as_str()).or_insert(stream);
    }
    lookup
}

/// Collects parse outcomes into a sorted [`MergedDataset`].
///
/// Empty payloads are listed in `report.empty`; failed ones are added to
/// `report.dropped`. Neither contributes records.
pub(crate) fn assemble(
    outcomes: Vec<(String, PayloadOutcome)>,
    mut report: PipelineReport,
    streams: &[StreamMetadata],
) -> MergedDataset {
    let mut samples = Vec::new();
    for (dbkey, outcome) in outcomes {
        match outcome {
            PayloadOutcome::Parsed(parsed) => samples.extend(parsed),
            PayloadOutcome::Empty => report.empty.push(dbkey),
            PayloadOutcome::Failed(e) => {
                report.dropped.push(DroppedStream::from_format(&dbkey, &e))
            }
        }
    }

    let records = left_join(samples, streams);
    report.sort();

    let mut dataset = MergedDataset::new(records, report);
    dataset.sort();
    info!(
        "Assembled {} records ({} empty streams, {} dropped)",
        dataset.len(),
        dataset.report.empty.len(),
        dataset.report.dropped.len()
    );
    dataset
}
