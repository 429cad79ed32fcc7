pub mod assembler;
pub mod dataset;
pub mod error;
pub(crate) mod fetcher;
pub mod parser;
