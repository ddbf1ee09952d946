//! Engine parameter file
//!
//! The engine reads its run parameters from standard input, one value per
//! record, in this order:
//!
//! | record | value                                   |
//! |--------|-----------------------------------------|
//! | 1      | exchange file name (A80)                |
//! | 2      | sample omission (-1 = none)             |
//! | 3      | species omission count (0 = none)       |
//! | 4      | downweight rare species (0/1)           |
//! | 5      | rescaling cycles (0 = no rescaling)     |
//! | 6      | analysis type (0 = DCA, 1 = plain RA)   |
//! | 7      | detrending segments                     |
//! | 8      | shortest gradient to rescale            |
//! | 9      | write scores file (1)                   |
//! | 10     | further runs (0 = stop)                 |
//! | 11     | axes to extract                         |
//! | 12     | convergence tolerance                   |
//! | 13     | iteration limit                         |
//!
//! The engine stops reading after record 10; records 11-13 trail the run
//! terminator so an engine that reads only the first ten is unaffected.
//!
//! Numeric records are right-justified in 10-column fields.

use crate::config::{Analysis, OrdinationOptions};
use std::fmt::Write as _;

const FIELD_WIDTH: usize = 10;
const NAME_WIDTH: usize = 80;

/// Build the parameter file text for one run
pub fn parameter_file(exchange_file: &str, options: &OrdinationOptions) -> String {
    let rescaling_cycles = if options.rescale { options.rescaling_cycles } else { 0 };
    let analysis = match options.analysis {
        Analysis::Detrended => 0,
        Analysis::ReciprocalAveraging => 1,
    };

    let fields: [String; 12] = [
        "-1".to_string(),
        "0".to_string(),
        u8::from(options.downweight_rare).to_string(),
        rescaling_cycles.to_string(),
        analysis.to_string(),
        options.segments.to_string(),
        options.shortest_gradient.to_string(),
        "1".to_string(),
        "0".to_string(),
        options.axes.to_string(),
        format!("{:E}", options.tolerance),
        options.max_iterations.to_string(),
    ];

    let mut text = String::new();
    let name: String = exchange_file.chars().take(NAME_WIDTH).collect();
    text.push_str(&name);
    text.push('\n');
    for field in fields {
        let _ = writeln!(text, "{:>w$}", field, w = FIELD_WIDTH);
    }
    text
}
