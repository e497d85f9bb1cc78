//! Output format handling for plots
//!
//! Figures are drawn once into an in-memory SVG document. Saving writes
//! that document as-is, or converts it to PDF. Nothing fills the
//! background, so both formats keep it transparent.

use crate::core::{PlotError, PlotResult};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use svg2pdf::usvg;

/// Supported vector output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Portable Document Format (default)
    #[default]
    Pdf,
    /// Scalable Vector Graphics
    Svg,
}

impl OutputFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }
}

/// A rendered figure held as an SVG document
#[derive(Debug, Clone)]
pub struct Figure {
    svg: String,
}

impl Figure {
    /// Render a figure of `size` pixels with `draw`
    pub fn render<F>(size: (u32, u32), draw: F) -> PlotResult<Self>
    where
        F: FnOnce(&DrawingArea<SVGBackend, Shift>) -> Result<(), DrawingAreaErrorKind<std::io::Error>>,
    {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            draw(&root).map_err(|e| PlotError::Draw(e.to_string()))?;
            root.present().map_err(|e| PlotError::Draw(e.to_string()))?;
        }
        Ok(Self { svg })
    }

    /// The SVG document
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Write the figure to `path` in `format`
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> PlotResult<()> {
        let path = path.as_ref();
        match format {
            OutputFormat::Svg => std::fs::write(path, self.svg.as_bytes())?,
            OutputFormat::Pdf => std::fs::write(path, svg_to_pdf(&self.svg)?)?,
        }
        log::debug!("Wrote {:?}", path);
        Ok(())
    }
}

/// Families tried for the generic `sans-serif` and `serif` names, in order
const SANS_SERIF_FAMILIES: [&str; 5] =
    ["Arial", "Helvetica", "DejaVu Sans", "Liberation Sans", "Noto Sans"];
const SERIF_FAMILIES: [&str; 4] =
    ["Times New Roman", "DejaVu Serif", "Liberation Serif", "Noto Serif"];

/// First preferred family present in `db`, else any installed family
fn installed_family(db: &usvg::fontdb::Database, preferred: &[&str]) -> Option<String> {
    let names: Vec<&str> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.as_str()))
        .collect();
    preferred
        .iter()
        .find(|family| names.contains(family))
        .or_else(|| names.first())
        .map(|family| family.to_string())
}

/// Load system fonts and point the generic families at installed faces.
///
/// usvg maps `sans-serif` to Arial and `serif` to Times New Roman. When
/// those are absent every text node is dropped from the PDF.
fn load_fonts(db: &mut usvg::fontdb::Database) {
    db.load_system_fonts();
    match installed_family(db, &SANS_SERIF_FAMILIES) {
        Some(sans) => {
            log::debug!("Using {:?} for sans-serif text", sans);
            let serif = installed_family(db, &SERIF_FAMILIES).unwrap_or_else(|| sans.clone());
            db.set_serif_family(serif);
            db.set_sans_serif_family(sans);
        }
        None => log::warn!("No system fonts found; PDF output will carry no text"),
    }
}

/// Convert an SVG document into a single-page PDF of the same size
pub fn svg_to_pdf(svg: &str) -> PlotResult<Vec<u8>> {
    let mut options = usvg::Options::default();
    load_fonts(options.fontdb_mut());

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| PlotError::Svg(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| PlotError::Pdf(format!("{:?}", e)))
}
