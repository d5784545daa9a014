//! Plotters-powered figures.
//!
//! Every figure is rendered through Plotters' SVG backend into an in-memory
//! document. The plotting functions validate all inputs first, then draw, then
//! (optionally) write the document to disk, so a configuration error never
//! leaves a partial file behind.
//!
//! - `pairing`: panel pairing + per-panel model dispatch
//! - `scatter`: 2D scatter panels with optional fit lines
//! - `plane`: 3D scatter with an optional fitted plane
//! - `boxplot`: grouped boxplots with two-sample tests
//! - `ascii`: terminal preview of a scatter panel

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::AppError;

pub mod ascii;
pub mod boxplot;
pub mod pairing;
pub mod plane;
pub mod scatter;

pub use boxplot::*;
pub use pairing::*;
pub use plane::*;
pub use scatter::*;

/// Default rendering resolution (pixels per inch of `FigSize`).
pub const DEFAULT_DPI: u32 = 100;

pub(crate) type DrawResult<T> = Result<T, DrawingAreaErrorKind<std::io::Error>>;

/// A rendered figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    svg: String,
    width: u32,
    height: u32,
}

impl Figure {
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Pixel size `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Write the SVG document to `path`.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        std::fs::write(path, &self.svg)
            .map_err(|e| AppError::io(format!("Failed to write figure '{}': {e}", path.display())))?;
        log::info!("Saved figure to {}", path.display());
        Ok(())
    }

    pub(crate) fn save_if_requested(&self, path: Option<&Path>) -> Result<(), AppError> {
        match path {
            Some(p) => self.save(p),
            None => Ok(()),
        }
    }
}

/// Render into a fresh SVG document of the given pixel size.
pub(crate) fn render_svg(
    size: (u32, u32),
    draw: impl FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult<()>,
) -> Result<Figure, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        draw(&root).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(Figure {
        svg,
        width: size.0,
        height: size.1,
    })
}

fn render_error(e: DrawingAreaErrorKind<std::io::Error>) -> AppError {
    AppError::render(format!("Plot rendering failed: {e}"))
}

/// Font and stroke sizes derived from the figure resolution.
///
/// Sizes are specified in points (1/72 inch) and converted to pixels so text
/// keeps the same physical size at any dpi.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Typography {
    dpi: u32,
}

impl Typography {
    pub(crate) fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    pub(crate) fn px(&self, pt: f64) -> f64 {
        pt * self.dpi as f64 / 72.0
    }

    pub(crate) fn px_u32(&self, pt: f64) -> u32 {
        self.px(pt).round().max(1.0) as u32
    }

    pub(crate) fn font(&self, pt: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.px(pt), FontStyle::Normal)
    }

    pub(crate) fn tick_font(&self) -> FontDesc<'static> {
        self.font(8.0)
    }

    pub(crate) fn label_font(&self) -> FontDesc<'static> {
        self.font(10.0)
    }

    pub(crate) fn title_font(&self) -> FontDesc<'static> {
        self.font(11.0)
    }
}

/// Draw text lines anchored at a fraction of `area` (0,0 = top-left).
pub(crate) fn draw_text_lines<DB: DrawingBackend, CT: CoordTranslate>(
    area: &DrawingArea<DB, CT>,
    lines: &[&str],
    x_frac: f64,
    y_frac: f64,
    font: &FontDesc<'static>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let screen = area.strip_coord_spec();
    let (w, h) = screen.dim_in_pixel();
    let x = (w as f64 * x_frac).round() as i32;
    let mut y = (h as f64 * y_frac).round() as i32;
    let line_height = (font.get_size() * 1.3).round() as i32;
    for line in lines {
        screen.draw(&Text::new(line.to_string(), (x, y), font.clone()))?;
        y += line_height;
    }
    Ok(())
}

/// Widen a range by `frac` of its span on each side.
///
/// Degenerate ranges (a single distinct value) are widened by a fixed amount.
pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    if span < 1e-12 {
        let pad = (min.abs() * frac).max(0.5);
        return (min - pad, max + pad);
    }
    let pad = span * frac;
    (min - pad, max + pad)
}

/// Named colors used by the default palettes.
pub mod colors {
    use plotters::style::RGBColor;

    pub const BLUE: RGBColor = RGBColor(0, 0, 255);
    pub const GREEN: RGBColor = RGBColor(0, 128, 0);
    pub const PURPLE: RGBColor = RGBColor(128, 0, 128);
    pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
    pub const TEAL: RGBColor = RGBColor(0, 128, 128);
    pub const RED: RGBColor = RGBColor(255, 0, 0);

    /// Scatter panel cycle.
    pub const PANEL_CYCLE: [RGBColor; 5] = [BLUE, GREEN, PURPLE, ORANGE, TEAL];

    /// Look up a color by name or `#rrggbb`.
    pub fn parse(name: &str) -> Option<RGBColor> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "blue" => Some(BLUE),
            "green" => Some(GREEN),
            "purple" => Some(PURPLE),
            "orange" => Some(ORANGE),
            "teal" => Some(TEAL),
            "red" => Some(RED),
            "black" => Some(RGBColor(0, 0, 0)),
            "gray" | "grey" => Some(RGBColor(128, 128, 128)),
            hex if hex.len() == 7 && hex.starts_with('#') => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(RGBColor(channel(1)?, channel(3)?, channel(5)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(color: RGBColor) -> String {
        format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
    }
}
