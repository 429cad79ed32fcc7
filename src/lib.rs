mod config;
mod dbhydro;
mod error;
mod pipeline;
mod streams;
mod timeseries;
mod transport;
mod types;
mod utils;

pub use crate::dbhydro::*;
pub use config::{PortalConfig, DEFAULT_BASE_URL};
pub use error::DbHydroError;
pub use transport::Transport;
pub use utils::ddmmss_to_decimal;

pub use streams::error::ResolveError;
pub use streams::resolver::MATCH_ALL;
pub use timeseries::error::{FetchError, FormatError};

pub use timeseries::assembler::left_join;
pub use timeseries::dataset::MergedDataset;
pub use timeseries::parser::{parse_payload, FOOTER_MARKER, PREAMBLE_LINES};

pub use types::date_window::{DateWindow, ReportPeriod};
pub use types::outcome::{DropStage, DroppedStream, PayloadOutcome, PipelineReport};
pub use types::sample::{MergedRecord, Sample};
pub use types::station::Station;
pub use types::stream::StreamMetadata;
