//! Engine output parsing
//!
//! - `parser`: labelled printed report (section markers, label matching)
//! - `scores_file`: positional scores file (no labels)
//! - `result`: `OrdinationResult` and `ScoreTable`

pub mod parser;
pub mod result;
pub mod scores_file;

pub use parser::{parse_report, MarkerRules, ReportParser};
pub use result::{Coordinates, OrdinationResult, ScoreTable};
pub use scores_file::parse_scores_file;
