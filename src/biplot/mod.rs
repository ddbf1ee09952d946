//! Biplots of ordination results
//!
//! - [`project`] / [`project_scores`]: pick two axes and build labelled points
//! - [`render_biplot`]: draw them to an SVG file

pub mod projector;
pub mod render;

pub use projector::{project, project_scores, BiplotFigure, BiplotPoint, Bounds, PointKind};
pub use render::{render_biplot, BiplotConfig};

use crate::error::Result;
use crate::report::ScoreTable;
use std::path::Path;

/// Project and render in one call from the four score outputs
///
/// `axes` are zero-based. Labels are the display labels, in table order.
#[allow(clippy::too_many_arguments)]
pub fn biplot(
    site_scores: &ScoreTable,
    species_scores: &ScoreTable,
    site_labels: &[String],
    species_labels: &[String],
    axes: (usize, usize),
    output_path: impl AsRef<Path>,
    config: Option<&BiplotConfig>,
) -> Result<BiplotFigure> {
    let figure = project_scores(site_scores, species_scores, site_labels, species_labels, axes)?;
    render_biplot(&figure, output_path, config)?;
    Ok(figure)
}
