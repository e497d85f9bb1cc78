//! GeoGenoPlot - genotype vs. environment plots for a single variant
//!
//! Joins the genotypes of one VCF record to sample coordinates, samples an
//! environmental raster at each location and draws the result.
//!
//! # Features
//!
//! - Plain, gzip/bgzip and bzip2 VCF input
//! - ESRI ASCII grid and GeoTIFF rasters
//! - Pearson, Spearman and Kruskal-Wallis association tests
//! - PDF or SVG figures plus a CSV of the joined table
//!
//! # Example
//!
//! ```ignore
//! use geogenoplot::{run, PlotOptions, Statistic};
//!
//! let mut options = PlotOptions::new("calls.vcf.gz", "bio1.tif", "samples.csv", "snp1");
//! options.statistics = vec![Statistic::Spearman];
//!
//! let report = run(&options)?;
//! println!("{} samples, {} with a value", report.samples, report.valued);
//! ```

pub mod core;
pub mod formats;
pub mod pipeline;
pub mod plot;

// Re-export commonly used types
pub use core::{
    GeoGenoPlotError, Phasing, Result, SampleRecord, SampleTable, Statistic, StatsError,
    TestResult, VcfError,
};
pub use formats::{read_variant, GeoReference, RasterGrid, RasterSampler, VariantGenotypes};
pub use pipeline::{enrich_table, run, write_outputs, PlotOptions, RunReport};
pub use plot::{allele_corr_plot, scatter_map_plot, OutputFormat};
