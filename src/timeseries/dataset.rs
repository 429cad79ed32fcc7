use crate::error::DbHydroError;
use crate::types::outcome::PipelineReport;
use crate::types::sample::MergedRecord;
use crate::types::stream::StreamMetadata;
use chrono::{Datelike, NaiveDate};
use log::info;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::task;

/// Days between 0001-01-01 and 1970-01-01; polars dates count from the latter.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// The merged output of one pipeline run.
///
/// `records` holds one entry per parsed sample, sorted by dbkey and then by
/// timestamp. `report` lists streams that contributed nothing, and why.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MergedDataset {
    pub records: Vec<MergedRecord>,
    pub report: PipelineReport,
}

impl MergedDataset {
    pub fn new(records: Vec<MergedRecord>, report: PipelineReport) -> Self {
        Self { records, report }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorts records by `(dbkey, sample_dt)`.
    pub fn sort(&mut self) {
        self.records
            .sort_by(|a, b| (a.dbkey(), a.sample_dt()).cmp(&(b.dbkey(), b.sample_dt())));
    }

    /// Builds a flat DataFrame, one row per record.
    ///
    /// `sample_dt` is a millisecond `Datetime`, `start_date`/`end_date` are
    /// `Date`, metadata columns are null for unmatched samples.
    pub fn to_dataframe(&self) -> Result<DataFrame, DbHydroError> {
        let sample_dt: Vec<i64> = self
            .records
            .iter()
            .map(|r| r.sample_dt().and_utc().timestamp_millis())
            .collect();
        let dbkey: Vec<&str> = self.records.iter().map(|r| r.dbkey()).collect();
        let data_value: Vec<Option<f64>> =
            self.records.iter().map(|r| r.sample.data_value).collect();
        let quality_flag: Vec<Option<&str>> = self
            .records
            .iter()
            .map(|r| r.sample.quality_flag.as_deref())
            .collect();

        let columns: Vec<Column> = vec![
            Series::new("sample_dt".into(), sample_dt)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .into(),
            Series::new("dbkey".into(), dbkey).into(),
            Series::new("data_value".into(), data_value).into(),
            Series::new("quality_flag".into(), quality_flag).into(),
            Series::new("station".into(), self.text_column(|m| m.station.as_deref())).into(),
            Series::new("group".into(), self.text_column(|m| m.group.as_deref())).into(),
            Series::new("site".into(), self.text_column(|m| m.site.as_deref())).into(),
            Series::new("data_type".into(), self.text_column(|m| m.data_type.as_deref())).into(),
            Series::new("freq".into(), self.text_column(|m| m.freq.as_deref())).into(),
            Series::new("stat".into(), self.text_column(|m| m.stat.as_deref())).into(),
            Series::new("recorder".into(), self.text_column(|m| m.recorder.as_deref())).into(),
            Series::new("agency".into(), self.text_column(|m| m.agency.as_deref())).into(),
            Series::new("start_date".into(), self.date_column(|m| m.start_date))
                .cast(&DataType::Date)?
                .into(),
            Series::new("end_date".into(), self.date_column(|m| m.end_date))
                .cast(&DataType::Date)?
                .into(),
            Series::new("county".into(), self.text_column(|m| m.county.as_deref())).into(),
            Series::new("lat".into(), self.float_column(|m| m.lat)).into(),
            Series::new("lon".into(), self.float_column(|m| m.lon)).into(),
            Series::new("basin".into(), self.text_column(|m| m.basin.as_deref())).into(),
        ];

        Ok(DataFrame::new(columns)?)
    }

    /// Writes the dataset as CSV with a header row.
    pub async fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), DbHydroError> {
        let df = self.to_dataframe()?;
        let path_buf = path.as_ref().to_path_buf();
        task::spawn_blocking(move || write_frame(df, path_buf, ExportFormat::Csv)).await??;
        Ok(())
    }

    /// Writes the dataset as a Snappy-compressed Parquet file.
    pub async fn write_parquet(&self, path: impl AsRef<Path>) -> Result<(), DbHydroError> {
        let df = self.to_dataframe()?;
        let path_buf = path.as_ref().to_path_buf();
        task::spawn_blocking(move || write_frame(df, path_buf, ExportFormat::Parquet)).await??;
        Ok(())
    }

    fn text_column(&self, field: fn(&StreamMetadata) -> Option<&str>) -> Vec<Option<&str>> {
        self.records
            .iter()
            .map(|r| r.metadata.as_ref().and_then(field))
            .collect()
    }

    fn float_column(&self, field: fn(&StreamMetadata) -> Option<f64>) -> Vec<Option<f64>> {
        self.records
            .iter()
            .map(|r| r.metadata.as_ref().and_then(field))
            .collect()
    }

    // Polars dates are days since the unix epoch.
    fn date_column(&self, field: fn(&StreamMetadata) -> NaiveDate) -> Vec<Option<i32>> {
        self.records
            .iter()
            .map(|r| r.metadata.as_ref().map(|m| days_since_epoch(field(m))))
            .collect()
    }
}

enum ExportFormat {
    Csv,
    Parquet,
}

fn write_frame(mut df: DataFrame, path: PathBuf, format: ExportFormat) -> Result<(), DbHydroError> {
    let file = File::create(&path).map_err(|e| DbHydroError::ExportIo(path.clone(), e))?;
    let written = match format {
        ExportFormat::Csv => CsvWriter::new(file).include_header(true).finish(&mut df),
        ExportFormat::Parquet => ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map(|_| ()),
    };
    written.map_err(|e| DbHydroError::ExportEncode(path.clone(), e))?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample::Sample;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(minute: u32) -> NaiveDateTime {
        date(2021, 9, 10).and_hms_opt(0, minute, 0).unwrap()
    }

    fn metadata(dbkey: &str) -> StreamMetadata {
        StreamMetadata {
            dbkey: dbkey.to_string(),
            station: Some("S331_W".to_string()),
            group: Some("WX".to_string()),
            site: Some("S331".to_string()),
            data_type: Some("AIRT".to_string()),
            freq: Some("BK".to_string()),
            stat: Some("MEAN".to_string()),
            recorder: Some("CR10".to_string()),
            agency: Some("WMD".to_string()),
            start_date: date(2020, 1, 1),
            end_date: date(2021, 12, 31),
            county: Some("MIAMI-DADE".to_string()),
            basin: None,
            lat: Some(25.6),
            lon: Some(-80.5),
        }
    }

    fn record(dbkey: &str, minute: u32, matched: bool) -> MergedRecord {
        MergedRecord {
            sample: Sample {
                sample_dt: at(minute),
                dbkey: dbkey.to_string(),
                data_value: Some(f64::from(minute)),
                quality_flag: (minute == 15).then(|| "M".to_string()),
            },
            metadata: matched.then(|| metadata(dbkey)),
        }
    }

    fn dataset() -> MergedDataset {
        let mut dataset = MergedDataset::new(
            vec![
                record("IX844", 15, true),
                record("ORPHAN", 0, false),
                record("IX844", 0, true),
            ],
            PipelineReport::default(),
        );
        dataset.sort();
        dataset
    }

    #[test]
    fn sorts_by_dbkey_then_time() {
        let dataset = dataset();
        let order: Vec<(&str, NaiveDateTime)> = dataset
            .records
            .iter()
            .map(|r| (r.dbkey(), r.sample_dt()))
            .collect();
        assert_eq!(order, [("IX844", at(0)), ("IX844", at(15)), ("ORPHAN", at(0))]);
    }

    #[test]
    fn builds_typed_dataframe() -> Result<(), Box<dyn std::error::Error>> {
        let df = dataset().to_dataframe()?;

        assert_eq!(df.shape(), (3, 18));
        assert!(matches!(
            df.column("sample_dt")?.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert_eq!(df.column("start_date")?.dtype(), &DataType::Date);

        let expected_ms = at(15).and_utc().timestamp_millis();
        let sample_dt = df.column("sample_dt")?.cast(&DataType::Int64)?;
        assert_eq!(sample_dt.i64()?.get(1), Some(expected_ms));

        let start = df.column("start_date")?.cast(&DataType::Int32)?;
        assert_eq!(start.i32()?.get(0), Some(days_since_epoch(date(2020, 1, 1))));
        assert_eq!(start.i32()?.get(2), None);

        let station = df.column("station")?.str()?;
        assert_eq!(station.get(0), Some("S331_W"));
        assert_eq!(station.get(2), None);
        assert_eq!(df.column("quality_flag")?.str()?.get(1), Some("M"));
        Ok(())
    }

    #[test]
    fn epoch_offset_matches_unix_epoch() {
        assert_eq!(days_since_epoch(date(1970, 1, 1)), 0);
        assert_eq!(days_since_epoch(date(1970, 1, 2)), 1);
    }

    #[test]
    fn empty_dataset_builds_empty_frame() -> Result<(), Box<dyn std::error::Error>> {
        let df = MergedDataset::default().to_dataframe()?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 18);
        Ok(())
    }

    #[tokio::test]
    async fn writes_csv_and_parquet() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let csv_path = dir.path().join("merged.csv");
        let parquet_path = dir.path().join("merged.parquet");
        let dataset = dataset();

        dataset.write_csv(&csv_path).await?;
        dataset.write_parquet(&parquet_path).await?;

        let csv = std::fs::read_to_string(&csv_path)?;
        let mut lines = csv.lines();
        assert!(lines.next().unwrap_or_default().starts_with("sample_dt,dbkey,data_value"));
        assert_eq!(lines.count(), 3);

        let read_back = ParquetReader::new(File::open(&parquet_path)?).finish()?;
        assert_eq!(read_back.shape(), (3, 18));
        Ok(())
    }

    #[tokio::test]
    async fn export_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("merged.csv");
        let err = dataset().write_csv(&path).await.unwrap_err();
        assert!(matches!(err, DbHydroError::ExportIo(p, _) if p == path));
    }
}
