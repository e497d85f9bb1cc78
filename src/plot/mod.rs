//! Figures
//!
//! - `correlation`: value vs. genotype box/strip plot with statistic
//! - `map`: sample map colored by genotype
//! - `output`: SVG rendering and PDF export
//! - `theme`: colors

pub mod correlation;
pub mod map;
pub mod output;
pub mod theme;

pub use correlation::{allele_corr_plot, CorrelationFigure, CorrelationOptions};
pub use map::{scatter_map_plot, MapOptions};
pub use output::{Figure, OutputFormat};
pub use theme::Theme;
