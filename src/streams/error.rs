use thiserror::Error;

/// Fatal failure while resolving a search into streams or stations.
///
/// Any of these means the portal's search page did not look the way it is
/// expected to, so no partial result is returned.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Results table '{selector}' (index {index}) not found in search response")]
    TableNotFound { selector: String, index: usize },

    #[error("Results table has no header row")]
    MissingHeader,

    #[error("Results table is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Results table row {row} has {found} cells, header has {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },
}
