//! Error types for GeoGenoPlot
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GeoGenoPlot operations
#[derive(Debug, Error)]
pub enum GeoGenoPlotError {
    /// Variant file loading errors
    #[error("VCF error: {0}")]
    Vcf(#[from] VcfError),

    /// Geo-reference table errors
    #[error("Geo-reference error: {0}")]
    GeoRef(#[from] GeoRefError),

    /// Raster loading errors
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// Statistic computation errors
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Plot rendering errors
    #[error("Plot error: {0}")]
    Plot(#[from] PlotError),

    /// Table export errors
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading a variant from a VCF file
#[derive(Debug, Error)]
pub enum VcfError {
    /// No record carries the requested ID
    #[error("No variant with ID: {id}")]
    VariantNotFound { id: String },

    /// The `#CHROM` header line was never seen
    #[error("Missing #CHROM header line")]
    MissingHeader,

    /// Record has fewer columns than VCF requires
    #[error("Too few fields at line {line}: expected at least {expected}, found {found}")]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Record has a different number of sample columns than the header
    #[error("Sample count mismatch at line {line}: header has {expected}, record has {found}")]
    SampleCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Record has no GT entry in its FORMAT column
    #[error("No GT field in FORMAT at line {line}")]
    MissingGenotypeField { line: usize },

    /// Allele index is not a number
    #[error("Invalid allele '{value}' at line {line}")]
    InvalidAllele { line: usize, value: String },

    /// File not found
    #[error("VCF file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error during parsing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while reading the geo-reference table
#[derive(Debug, Error)]
pub enum GeoRefError {
    /// Required column absent from the header
    #[error("Geo-reference table is missing column '{0}'")]
    MissingColumn(&'static str),

    /// CSV parse error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while opening a raster
#[derive(Debug, Error)]
pub enum RasterError {
    /// File extension not recognized as a raster format
    #[error("Unsupported raster format: {0}")]
    UnsupportedFormat(String),

    /// Invalid ASCII grid header
    #[error("Invalid ASCII grid header at line {line}: {message}")]
    InvalidHeader { line: usize, message: String },

    /// Cell count does not match the declared dimensions
    #[error("Raster has {found} cells, expected {expected}")]
    CellCountMismatch { expected: usize, found: usize },

    /// Failed to parse a number
    #[error("Invalid number '{value}' at line {line}")]
    InvalidNumber { line: usize, value: String },

    /// GeoTIFF without georeferencing tags
    #[error("GeoTIFF is missing georeferencing tag: {0}")]
    MissingGeoTag(&'static str),

    /// TIFF decoding error
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while computing an association statistic
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    /// Not enough observations for the statistic
    #[error("Need at least {needed} observations, got {found}")]
    TooFewObservations { needed: usize, found: usize },

    /// x and y have different lengths
    #[error("Length mismatch: x has {x}, y has {y}")]
    LengthMismatch { x: usize, y: usize },

    /// An input has zero variance
    #[error("Input is constant; {0} is undefined")]
    ConstantInput(&'static str),

    /// Kruskal-Wallis needs two non-empty groups
    #[error("Need at least 2 non-empty groups, got {0}")]
    TooFewGroups(usize),

    /// Reference distribution could not be built
    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Errors that can occur while rendering or saving a figure
#[derive(Debug, Error)]
pub enum PlotError {
    /// Backend drawing error
    #[error("Failed to draw: {0}")]
    Draw(String),

    /// SVG could not be parsed for PDF conversion
    #[error("Failed to parse SVG: {0}")]
    Svg(String),

    /// PDF conversion failed
    #[error("Failed to convert to PDF: {0}")]
    Pdf(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GeoGenoPlot operations
pub type Result<T> = std::result::Result<T, GeoGenoPlotError>;

/// Result type alias for VCF loading
pub type VcfResult<T> = std::result::Result<T, VcfError>;

/// Result type alias for geo-reference reading
pub type GeoRefResult<T> = std::result::Result<T, GeoRefError>;

/// Result type alias for raster operations
pub type RasterResult<T> = std::result::Result<T, RasterError>;

/// Result type alias for statistics
pub type StatsResult<T> = std::result::Result<T, StatsError>;

/// Result type alias for plotting
pub type PlotResult<T> = std::result::Result<T, PlotError>;
