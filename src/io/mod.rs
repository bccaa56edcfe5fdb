//! Input/output helpers.
//!
//! - delimited choice data ingest (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
