//! Biplot projection
//!
//! Picks two ordination axes and lays site and species points into one
//! coordinate space. Coordinates are copied as-is; nothing is rescaled, so a
//! site near a species on the plot is near it in the ordination.

use crate::error::{DecoranaError, Result};
use crate::report::{OrdinationResult, ScoreTable};

/// Fraction of the data span added on each side of the default bounds
pub const DEFAULT_PADDING: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Site,
    Species,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiplotPoint {
    pub label: String,
    pub kind: PointKind,
    pub x: f64,
    pub y: f64,
}

/// Axis ranges shared by both point sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

/// Labelled 2-D points for sites and species on one pair of axes
#[derive(Debug, Clone, PartialEq)]
pub struct BiplotFigure {
    /// Zero-based axis indices (x, y)
    pub axes: (usize, usize),
    pub points: Vec<BiplotPoint>,
}

impl BiplotFigure {
    pub fn sites(&self) -> impl Iterator<Item = &BiplotPoint> {
        self.points.iter().filter(|p| p.kind == PointKind::Site)
    }

    pub fn species(&self) -> impl Iterator<Item = &BiplotPoint> {
        self.points.iter().filter(|p| p.kind == PointKind::Species)
    }

    /// Extent of all points, padded by `padding` × span on each side
    ///
    /// A degenerate span (all points on one line) gets a unit margin.
    pub fn bounds(&self, padding: f64) -> Bounds {
        bounds_of(self.points.iter(), padding)
    }
}

pub(crate) fn bounds_of<'a>(points: impl Iterator<Item = &'a BiplotPoint>, padding: f64) -> Bounds {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        x = (x.0.min(p.x), x.1.max(p.x));
        y = (y.0.min(p.y), y.1.max(p.y));
    }
    Bounds {
        x: pad(x, padding),
        y: pad(y, padding),
    }
}

fn pad((lo, hi): (f64, f64), padding: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    let margin = if span > 0.0 { span * padding } else { 1.0 };
    (lo - margin, hi + margin)
}

/// Project an ordination result onto two axes (zero-based)
///
/// # Example
/// ```rust,ignore
/// let figure = project(&result, (0, 1))?;
/// assert_eq!(figure.points.len(), result.sites().len() + result.species().len());
/// ```
pub fn project(result: &OrdinationResult, axes: (usize, usize)) -> Result<BiplotFigure> {
    project_scores(
        result.sites(),
        result.species(),
        result.sites().labels(),
        result.species().labels(),
        axes,
    )
}

/// Project score tables with caller-chosen display labels
///
/// The label slices replace the tables' own labels on the plot, in table
/// order, and must have the same lengths.
pub fn project_scores(
    sites: &ScoreTable,
    species: &ScoreTable,
    site_labels: &[String],
    species_labels: &[String],
    axes: (usize, usize),
) -> Result<BiplotFigure> {
    let mut points = Vec::with_capacity(sites.len() + species.len());
    push_points(&mut points, sites, site_labels, PointKind::Site, axes)?;
    push_points(&mut points, species, species_labels, PointKind::Species, axes)?;
    Ok(BiplotFigure { axes, points })
}

fn push_points(
    points: &mut Vec<BiplotPoint>,
    scores: &ScoreTable,
    labels: &[String],
    kind: PointKind,
    (ax, ay): (usize, usize),
) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(DecoranaError::InvalidInput(format!(
            "{} labels given for {} {} scores",
            labels.len(),
            scores.len(),
            if kind == PointKind::Site { "site" } else { "species" }
        )));
    }

    let available = scores.n_axes();
    for axis in [ax, ay] {
        if axis >= available {
            return Err(DecoranaError::AxisOutOfRange { axis, available });
        }
    }

    for (i, label) in labels.iter().enumerate() {
        let coords = scores.row(i);
        points.push(BiplotPoint {
            label: label.clone(),
            kind,
            x: coords[ax],
            y: coords[ay],
        });
    }
    Ok(())
}
