pub mod error;
pub(crate) mod html_table;
pub(crate) mod resolver;
pub(crate) mod station_listing;
