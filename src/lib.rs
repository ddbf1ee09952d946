//! decorana_rs - Detrended correspondence analysis through the DECORANA engine
//!
//! Wraps the classic Fortran DECORANA program: abundance tables are written
//! in the Cornell condensed format, the engine runs in a scoped temporary
//! workspace, and its report is parsed back into labelled site and species
//! scores.
//!
//! Layout:
//! - `data`: abundance tables (Polars / CSV ingestion, validation)
//! - `config`: analysis options and engine configuration
//! - `exchange`: exchange file and parameter file serialization
//! - `engine`: engine location and process supervision
//! - `report`: printed report and scores file parsing
//! - `biplot`: two-axis projection and SVG rendering
//! - `ordination`: the end-to-end coordinator
//! - `utils/`: label handling and workspaces

pub mod biplot;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod ordination;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use biplot::{biplot, project, project_scores, render_biplot, BiplotConfig, BiplotFigure};
pub use config::{
    Analysis, EngineConfig, EngineSource, LabelPolicy, OrdinationOptions, ReportSource, MAX_AXES,
};
pub use data::AbundanceTable;
pub use engine::{CancelFlag, EngineInvoker};
pub use error::{DecoranaError, Result, Section};
pub use exchange::{parameter_file, ExchangeDocument, ExchangeFormatWriter};
pub use ordination::{decorana, Decorana};
pub use report::{parse_report, parse_scores_file, OrdinationResult, ReportParser, ScoreTable};
