//! Resolves a station search term into the set of matching dbkeys and their metadata.

use crate::config::PortalConfig;
use crate::streams::error::ResolveError;
use crate::streams::html_table::{ColumnSpec, HtmlTable};
use crate::transport::Transport;
use crate::types::date_window::DateWindow;
use crate::types::stream::StreamMetadata;
use crate::utils::{non_blank, parse_dms_cell, parse_portal_date};
use log::{debug, info};

const SEARCH_PROCEDURE: &str = "show_dbkey_info.show_dbkeys_matched";
const RESULTS_TABLE: &str = "form > table";
/// Search term matching every station.
pub const MATCH_ALL: &str = "%";

const DBKEY: ColumnSpec = ColumnSpec {
    field: "dbkey",
    aliases: &["dbkey"],
};
const STATION: ColumnSpec = ColumnSpec {
    field: "station",
    aliases: &["station"],
};
const GROUP: ColumnSpec = ColumnSpec {
    field: "group",
    aliases: &["group"],
};
const SITE: ColumnSpec = ColumnSpec {
    field: "site",
    aliases: &["site"],
};
const DATA_TYPE: ColumnSpec = ColumnSpec {
    field: "data_type",
    aliases: &["type", "datatype"],
};
const FREQ: ColumnSpec = ColumnSpec {
    field: "freq",
    aliases: &["freq", "frequency"],
};
const STAT: ColumnSpec = ColumnSpec {
    field: "stat",
    aliases: &["stat", "statistic"],
};
const RECORDER: ColumnSpec = ColumnSpec {
    field: "recorder",
    aliases: &["recorder"],
};
const AGENCY: ColumnSpec = ColumnSpec {
    field: "agency",
    aliases: &["agency"],
};
const START_DATE: ColumnSpec = ColumnSpec {
    field: "start_date",
    aliases: &["startdate"],
};
const END_DATE: ColumnSpec = ColumnSpec {
    field: "end_date",
    aliases: &["enddate"],
};
const COUNTY: ColumnSpec = ColumnSpec {
    field: "county",
    aliases: &["county"],
};
const LATITUDE: ColumnSpec = ColumnSpec {
    field: "lat",
    aliases: &["latitude", "lat"],
};
const LONGITUDE: ColumnSpec = ColumnSpec {
    field: "lon",
    aliases: &["longitude", "lon", "long"],
};
const BASIN: ColumnSpec = ColumnSpec {
    field: "basin",
    aliases: &["basin"],
};

/// Column positions of the dbkey search results, derived once from the header.
///
/// Presentation columns (data links, state-plane coordinates, survey fields,
/// strata, operation numbers, structures) are never looked up and so are dropped.
struct StreamColumns {
    dbkey: usize,
    station: usize,
    group: usize,
    site: usize,
    data_type: usize,
    freq: usize,
    stat: usize,
    recorder: usize,
    agency: usize,
    start_date: usize,
    end_date: usize,
    county: usize,
    lat: usize,
    lon: usize,
    basin: usize,
}

impl StreamColumns {
    fn from_table(table: &HtmlTable) -> Result<Self, ResolveError> {
        Ok(Self {
            dbkey: table.column(&DBKEY)?,
            station: table.column(&STATION)?,
            group: table.column(&GROUP)?,
            site: table.column(&SITE)?,
            data_type: table.column(&DATA_TYPE)?,
            freq: table.column(&FREQ)?,
            stat: table.column(&STAT)?,
            recorder: table.column(&RECORDER)?,
            agency: table.column(&AGENCY)?,
            start_date: table.column(&START_DATE)?,
            end_date: table.column(&END_DATE)?,
            county: table.column(&COUNTY)?,
            lat: table.column(&LATITUDE)?,
            lon: table.column(&LONGITUDE)?,
            basin: table.column(&BASIN)?,
        })
    }

    /// Builds metadata from one row; `None` when a coverage date or the dbkey is unusable.
    fn to_metadata(&self, row: &[String]) -> Option<StreamMetadata> {
        let text = |idx: usize| non_blank(&row[idx]).map(str::to_string);

        Some(StreamMetadata {
            dbkey: text(self.dbkey)?,
            station: text(self.station),
            group: text(self.group),
            site: text(self.site),
            data_type: text(self.data_type),
            freq: text(self.freq),
            stat: text(self.stat),
            recorder: text(self.recorder),
            agency: text(self.agency),
            start_date: parse_portal_date(&row[self.start_date])?,
            end_date: parse_portal_date(&row[self.end_date])?,
            county: text(self.county),
            basin: text(self.basin),
            lat: parse_dms_cell(&row[self.lat], false),
            lon: parse_dms_cell(&row[self.lon], true),
        })
    }
}

/// Requests the dbkey search page for `search_term` and returns the streams
/// whose coverage intersects `window`.
pub(crate) async fn resolve_streams(
    transport: &Transport,
    search_term: &str,
    window: DateWindow,
) -> Result<Vec<StreamMetadata>, ResolveError> {
    let params = search_params(transport.config(), search_term);
    info!("Searching dbkeys matching '{}'", search_term);

    let html = transport.get_page(SEARCH_PROCEDURE, &params).await?;
    parse_stream_table(&html, window)
}

fn search_params(config: &PortalConfig, search_term: &str) -> [(&'static str, String); 4] {
    [
        ("display_quantity", config.display_quantity.to_string()),
        ("v_category", config.category.clone()),
        ("v_frequency", config.frequency.clone()),
        ("v_station", search_term.to_string()),
    ]
}

/// Parses the dbkey search results page and applies the coverage filter.
pub(crate) fn parse_stream_table(
    html: &str,
    window: DateWindow,
) -> Result<Vec<StreamMetadata>, ResolveError> {
    let table = HtmlTable::locate(html, RESULTS_TABLE, 0)?;
    let columns = StreamColumns::from_table(&table)?;

    let total = table.rows.len();
    let mut keyless = 0usize;
    let mut undated = 0usize;
    let mut parsed = Vec::with_capacity(total);
    for row in &table.rows {
        if non_blank(&row[columns.dbkey]).is_none() {
            keyless += 1;
            continue;
        }
        match columns.to_metadata(row) {
            Some(stream) => parsed.push(stream),
            None => undated += 1,
        }
    }
    let dated = parsed.len();

    let streams: Vec<StreamMetadata> = parsed
        .into_iter()
        .filter(|stream| window.overlaps(stream.start_date, stream.end_date))
        .collect();

    debug!(
        "{} rows without a dbkey, {} without usable dates, {} outside {:?}",
        keyless,
        undated,
        dated - streams.len(),
        window
    );
    info!("Resolved {} of {} listed dbkeys", streams.len(), total);
    Ok(streams)
}
