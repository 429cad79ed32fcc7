//! Station listing: the non-time-series counterpart of the dbkey search.

use crate::streams::error::ResolveError;
use crate::streams::html_table::{ColumnSpec, HtmlTable};
use crate::transport::Transport;
use crate::types::station::Station;
use crate::utils::{non_blank, parse_dms_cell};
use log::info;

const STATION_PROCEDURE: &str = "show_dbkey_info.show_station_info";
/// The station grid is the third table of the page (after layout tables).
const STATION_TABLE_INDEX: usize = 2;

const STATION: ColumnSpec = ColumnSpec {
    field: "station",
    aliases: &["station"],
};
const SITE: ColumnSpec = ColumnSpec {
    field: "site",
    aliases: &["site"],
};
const TYPE: ColumnSpec = ColumnSpec {
    field: "type",
    aliases: &["type", "stationtype"],
};
const LATITUDE: ColumnSpec = ColumnSpec {
    field: "lat",
    aliases: &["latitude", "lat"],
};
const LONGITUDE: ColumnSpec = ColumnSpec {
    field: "lon",
    aliases: &["longitude", "lon", "long"],
};
const COUNTY: ColumnSpec = ColumnSpec {
    field: "county",
    aliases: &["county"],
};
const BASIN: ColumnSpec = ColumnSpec {
    field: "basin",
    aliases: &["basin"],
};
const DESCRIPTION: ColumnSpec = ColumnSpec {
    field: "description",
    aliases: &["description"],
};

pub(crate) async fn list_stations(
    transport: &Transport,
    name: &str,
) -> Result<Vec<Station>, ResolveError> {
    info!("Listing stations matching '{}'", name);
    let html = transport
        .get_page(STATION_PROCEDURE, &[("v_station", name.to_string())])
        .await?;
    parse_station_table(&html)
}

pub(crate) fn parse_station_table(html: &str) -> Result<Vec<Station>, ResolveError> {
    let table = HtmlTable::locate(html, "table", STATION_TABLE_INDEX)?;

    let station = table.column(&STATION)?;
    let site = table.column(&SITE)?;
    let station_type = table.column(&TYPE)?;
    let lat = table.column(&LATITUDE)?;
    let lon = table.column(&LONGITUDE)?;
    let county = table.column(&COUNTY)?;
    let basin = table.column(&BASIN)?;
    let description = table.column(&DESCRIPTION)?;

    let stations = table
        .rows
        .iter()
        .filter_map(|row| {
            let text = |idx: usize| non_blank(&row[idx]).map(str::to_string);
            Some(Station {
                station: text(station)?,
                site: text(site),
                station_type: text(station_type),
                lat: parse_dms_cell(&row[lat], false),
                lon: parse_dms_cell(&row[lon], true),
                county: text(county),
                basin: text(basin),
                description: text(description),
            })
        })
        .collect::<Vec<_>>();

    info!("Listed {} stations", stations.len());
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table><tr><td>banner</td></tr></table>
            <table><tr><td>search form</td></tr></table>
            <table>
              <tr><th>GetData</th><th>ShowMap</th><th>NearbyStations</th><th>Attachments</th>
                  <th>Station</th><th>Site</th><th>Type</th><th>Latitude</th><th>Longitude</th>
                  <th>X Coord(ft)</th><th>Y Coord(ft)</th><th>County</th><th>Sec</th><th>Twp</th>
                  <th>Rng</th><th>Basin</th><th>Description</th></tr>
              {rows}
            </table></body></html>"#
        )
    }

    #[test]
    fn parses_station_listing() {
        let html = page(
            r#"<tr><td>x</td><td>x</td><td>x</td><td>x</td><td>S5A</td><td>S5A</td><td>WEATHER</td>
                <td>264100</td><td>802230</td><td>1</td><td>2</td><td>PALM BEACH</td><td>1</td>
                <td>2</td><td>3</td><td>L8</td><td>PUMP STATION S5A</td></tr>
               <tr><td>x</td><td>x</td><td>x</td><td>x</td><td>ENP1</td><td>&nbsp;</td><td>RAIN</td>
                <td>&nbsp;</td><td> </td><td>1</td><td>2</td><td>DADE</td><td>1</td>
                <td>2</td><td>3</td><td>&nbsp;</td><td>&nbsp;</td></tr>"#,
        );
        let stations = parse_station_table(&html).unwrap();
        assert_eq!(stations.len(), 2);

        let s5a = &stations[0];
        assert_eq!(s5a.station, "S5A");
        assert_eq!(s5a.station_type.as_deref(), Some("WEATHER"));
        assert_eq!(s5a.description.as_deref(), Some("PUMP STATION S5A"));
        assert!((s5a.lat.unwrap() - (26.0 + 41.0 / 60.0)).abs() < 1e-9);
        assert!(s5a.lon.unwrap() < -80.0);

        let enp1 = &stations[1];
        assert_eq!(enp1.site, None);
        assert_eq!(enp1.lat, None);
        assert_eq!(enp1.lon, None);
        assert_eq!(enp1.basin, None);
        assert_eq!(enp1.county.as_deref(), Some("DADE"));
    }

    #[test]
    fn missing_station_grid_is_fatal() {
        let err = parse_station_table("<table></table>").unwrap_err();
        assert!(matches!(err, ResolveError::TableNotFound { index: 2, .. }));
    }
}
