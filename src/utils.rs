use chrono::{NaiveDate, NaiveDateTime};

/// Date format used by the portal for coverage dates, e.g. `01-JAN-2021`.
pub(crate) const PORTAL_DATE_FORMAT: &str = "%d-%b-%Y";
/// Timestamp format used in report payloads, e.g. `10-SEP-2021 00:15:00`.
pub(crate) const PORTAL_DATETIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S";
/// Compact date format expected by the report endpoint, e.g. `20210910`.
pub(crate) const REPORT_DATE_FORMAT: &str = "%Y%m%d";

/// Converts a DMS-packed coordinate (`DDDMMSS`) into decimal degrees.
///
/// The degree part may have any number of digits. The result is always a
/// non-negative magnitude; callers apply the hemisphere sign.
///
/// ```
/// let lat = dbhydro::ddmmss_to_decimal(261530.0);
/// assert!((lat - (26.0 + 15.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-12);
/// ```
pub fn ddmmss_to_decimal(x: f64) -> f64 {
    let degrees = (x / 10000.0).floor();
    let minutes = (x / 100.0).floor() - degrees * 100.0;
    let seconds = x - (x / 100.0).floor() * 100.0;
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Returns the cell text, or `None` when the cell only holds whitespace or a
/// non-breaking-space placeholder.
pub(crate) fn non_blank(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == "&nbsp" || trimmed == "&nbsp;" {
        None
    } else {
        Some(trimmed)
    }
}

pub(crate) fn parse_portal_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(non_blank(cell)?, PORTAL_DATE_FORMAT).ok()
}

pub(crate) fn parse_portal_datetime(cell: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(cell.trim(), PORTAL_DATETIME_FORMAT).ok()
}

/// Parses a DMS coordinate cell. Unparseable or blank cells are treated as missing.
pub(crate) fn parse_dms_cell(cell: &str, negate: bool) -> Option<f64> {
    let raw: f64 = non_blank(cell)?.parse().ok()?;
    let decimal = ddmmss_to_decimal(raw);
    Some(if negate { -decimal } else { decimal })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_dms_to_decimal() {
        let expected = 26.0 + 15.0 / 60.0 + 30.0 / 3600.0;
        assert!((ddmmss_to_decimal(261530.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn converts_three_digit_degrees() {
        let expected = 80.0 + 45.0 / 60.0 + 7.0 / 3600.0;
        assert!((ddmmss_to_decimal(804507.0) - expected).abs() < 1e-12);

        let expected = 120.0 + 1.0 / 60.0;
        assert!((ddmmss_to_decimal(1200100.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_is_zero() {
        assert_eq!(ddmmss_to_decimal(0.0), 0.0);
    }

    #[test]
    fn blank_cells_are_missing() {
        assert_eq!(non_blank("   "), None);
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank("\u{a0}"), None);
        assert_eq!(non_blank("&nbsp"), None);
        assert_eq!(non_blank(" PALM BEACH "), Some("PALM BEACH"));
    }

    #[test]
    fn parses_portal_dates() {
        assert_eq!(
            parse_portal_date("01-JAN-2021"),
            NaiveDate::from_ymd_opt(2021, 1, 1)
        );
        assert_eq!(
            parse_portal_date("15-Sep-1995"),
            NaiveDate::from_ymd_opt(1995, 9, 15)
        );
        assert_eq!(parse_portal_date("not-a-date"), None);
        assert_eq!(parse_portal_date(""), None);
    }

    #[test]
    fn parses_portal_datetimes() {
        let parsed = parse_portal_datetime(" 10-SEP-2021 00:15:00").unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2021, 9, 10)
                .unwrap()
                .and_hms_opt(0, 15, 0)
                .unwrap()
        );
        assert!(parse_portal_datetime("2021-09-10 00:15").is_none());
    }

    #[test]
    fn negates_longitude_cells() {
        let lon = parse_dms_cell("801530", true).unwrap();
        assert!(lon < 0.0);
        assert!((lon + (80.0 + 15.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-12);
        assert_eq!(parse_dms_cell("&nbsp", true), None);
        assert_eq!(parse_dms_cell("N/A", false), None);
    }
}
