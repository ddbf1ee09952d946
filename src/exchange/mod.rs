//! Fixed-format files handed to the engine
//!
//! - `writer`: Cornell condensed abundance file
//! - `params`: parameter records fed on standard input

pub mod params;
pub mod writer;

pub use params::parameter_file;
pub use writer::{AxisLabels, ExchangeDocument, ExchangeFormatWriter, FieldLayout};
