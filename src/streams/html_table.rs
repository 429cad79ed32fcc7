//! Extraction of a plain text grid from one table of a portal HTML page.
//!
//! The portal renders search results as HTML tables with a header row and one
//! `<tr>` per record. Columns are located by header name, never by position,
//! so a markup change surfaces as a [`ResolveError`] instead of silently
//! shifting fields.

use crate::streams::error::ResolveError;
use scraper::{ElementRef, Html, Selector};

/// A header-keyed column a caller needs, with the header spellings it accepts.
pub(crate) struct ColumnSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
}

#[derive(Debug)]
pub(crate) struct HtmlTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    /// Parses `html` and extracts the `index`-th element matching `selector`.
    ///
    /// The first row containing `<th>` cells is the header; when no such row
    /// exists the first row is used. Every following row must have exactly as
    /// many cells as the header.
    pub fn locate(html: &str, selector: &str, index: usize) -> Result<Self, ResolveError> {
        let not_found = || ResolveError::TableNotFound {
            selector: selector.to_string(),
            index,
        };
        let table_sel = Selector::parse(selector).map_err(|_| not_found())?;
        let row_sel = Selector::parse("tr").map_err(|_| not_found())?;
        let cell_sel = Selector::parse("th, td").map_err(|_| not_found())?;
        let th_sel = Selector::parse("th").map_err(|_| not_found())?;

        let document = Html::parse_document(html);
        let table = document.select(&table_sel).nth(index).ok_or_else(not_found)?;

        let rows: Vec<ElementRef> = table
            .select(&row_sel)
            .filter(|row| row.select(&cell_sel).next().is_some())
            .collect();

        let header_pos = rows
            .iter()
            .position(|row| row.select(&th_sel).next().is_some())
            .unwrap_or(0);
        let header_row = rows.get(header_pos).ok_or(ResolveError::MissingHeader)?;
        let header: Vec<String> = header_row.select(&cell_sel).map(cell_text).collect();

        let mut body = Vec::with_capacity(rows.len().saturating_sub(header_pos + 1));
        for (row_idx, row) in rows.iter().enumerate().skip(header_pos + 1) {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            if cells.len() != header.len() {
                return Err(ResolveError::ColumnCount {
                    row: row_idx,
                    expected: header.len(),
                    found: cells.len(),
                });
            }
            body.push(cells);
        }

        Ok(Self { header, rows: body })
    }

    /// Finds the position of a required column by any of its accepted header names.
    pub fn column(&self, spec: &ColumnSpec) -> Result<usize, ResolveError> {
        self.header
            .iter()
            .position(|name| {
                let name = normalize_header(name);
                spec.aliases.iter().any(|alias| name == *alias)
            })
            .ok_or(ResolveError::MissingColumn(spec.field))
    }
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>()
}

/// Lowercases a header and keeps only ASCII letters and digits,
/// so `"Start Date"` and `"start_date"` both become `"startdate"`.
fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
