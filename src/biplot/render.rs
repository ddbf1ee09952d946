//! SVG biplot rendering
//!
//! Sites are drawn as filled circles, species as triangles, each with its
//! label beside the marker. Only the SVG backend is compiled in, so text is
//! emitted as `<text>` elements and no system fonts are needed.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use super::projector::{bounds_of, BiplotFigure, BiplotPoint, DEFAULT_PADDING};
use crate::error::{DecoranaError, Result};

/// Appearance of a rendered biplot
///
/// ```rust,ignore
/// let mut config = BiplotConfig::default();
/// config.title = "Dune meadows".to_string();
/// config.show_species = false;
/// render_biplot(&figure, "sites.svg", Some(&config))?;
/// ```
#[derive(Debug, Clone)]
pub struct BiplotConfig {
    /// Image width in pixels (default: 900)
    pub width: u32,

    /// Image height in pixels (default: 700)
    pub height: u32,

    pub title: String,

    pub show_sites: bool,
    pub show_species: bool,

    pub site_color: RGBColor,
    pub species_color: RGBColor,
    pub background: RGBColor,

    /// Marker radius in pixels
    pub marker_size: u32,

    pub site_label_size: f64,
    pub species_label_size: f64,

    /// Explicit axis ranges; `None` uses padded data bounds
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,

    pub show_grid: bool,
}

impl Default for BiplotConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 700,
            title: "DCA biplot".to_string(),
            show_sites: true,
            show_species: true,
            site_color: BLUE,
            species_color: RED,
            background: WHITE,
            marker_size: 4,
            site_label_size: 12.0,
            species_label_size: 11.0,
            xlim: None,
            ylim: None,
            show_grid: true,
        }
    }
}

/// Write a biplot of `figure` to an SVG file
///
/// Axis captions read "DCA Axis n" (one-based). The default ranges cover the
/// points actually shown, padded by 15% of their span.
///
/// # Errors
/// `Render` when plotters fails to lay out or write the image.
pub fn render_biplot(
    figure: &BiplotFigure,
    output_path: impl AsRef<Path>,
    config: Option<&BiplotConfig>,
) -> Result<()> {
    let default_config = BiplotConfig::default();
    let config = config.unwrap_or(&default_config);
    let output_path = output_path.as_ref();

    debug!(
        path = %output_path.display(),
        points = figure.points.len(),
        "Rendering biplot"
    );

    let backend = SVGBackend::new(output_path, (config.width, config.height));
    render_impl(backend, figure, config).map_err(|e| DecoranaError::Render(e.to_string()))
}

fn visible<'a>(figure: &'a BiplotFigure, config: &BiplotConfig) -> Vec<&'a BiplotPoint> {
    let mut shown: Vec<&BiplotPoint> = Vec::with_capacity(figure.points.len());
    if config.show_sites {
        shown.extend(figure.sites());
    }
    if config.show_species {
        shown.extend(figure.species());
    }
    shown
}

fn render_impl<DB: DrawingBackend>(
    backend: DB,
    figure: &BiplotFigure,
    config: &BiplotConfig,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let shown = visible(figure, config);
    let bounds = if shown.is_empty() {
        figure.bounds(DEFAULT_PADDING)
    } else {
        bounds_of(shown.iter().copied(), DEFAULT_PADDING)
    };
    let (x0, x1) = config.xlim.unwrap_or(bounds.x);
    let (y0, y1) = config.ylim.unwrap_or(bounds.y);

    let root = backend.into_drawing_area();
    root.fill(&config.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let tick = |v: &f64| format!("{:.1}", v);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(format!("DCA Axis {}", figure.axes.0 + 1))
        .y_desc(format!("DCA Axis {}", figure.axes.1 + 1))
        .x_label_formatter(&tick)
        .y_label_formatter(&tick);
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    let marker = config.marker_size;
    let offset = (marker as i32) + 3;

    if config.show_sites {
        let color = config.site_color;
        let font = ("sans-serif", config.site_label_size).into_font().color(&color);
        chart
            .draw_series(figure.sites().map(|p| {
                EmptyElement::at((p.x, p.y))
                    + Circle::new((0, 0), marker, color.filled())
                    + Text::new(p.label.clone(), (offset, -offset), font.clone())
            }))?
            .label("Sites")
            .legend(move |(x, y)| Circle::new((x + 10, y), marker, color.filled()));
    }

    if config.show_species {
        let color = config.species_color;
        let font = ("sans-serif", config.species_label_size).into_font().color(&color);
        chart
            .draw_series(figure.species().map(|p| {
                EmptyElement::at((p.x, p.y))
                    + TriangleMarker::new((0, 0), marker + 1, color.filled())
                    + Text::new(p.label.clone(), (offset, -offset), font.clone())
            }))?
            .label("Species")
            .legend(move |(x, y)| TriangleMarker::new((x + 10, y), marker + 1, color.filled()));
    }

    if config.show_sites || config.show_species {
        chart
            .configure_series_labels()
            .background_style(&config.background.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
