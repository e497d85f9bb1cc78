//! Core data model and analysis
//!
//! This module contains the error types, input helpers, the per-sample
//! table, genotype bucketing and the association statistics.

mod error;
pub mod genotype;
pub mod io;
pub mod stats;
pub mod table;

pub use error::{
    GeoGenoPlotError, GeoRefError, GeoRefResult, PlotError, PlotResult, RasterError,
    RasterResult, Result, StatsError, StatsResult, VcfError, VcfResult,
};
pub use genotype::{Phasing, PHASED_CATEGORIES, UNPHASED_CATEGORIES};
pub use io::{detect_compression, open_text_reader, CompressionFormat, LineIterator};
pub use stats::{BoxSummary, LinearFit, Statistic, TestResult};
pub use table::{Observation, SampleRecord, SampleTable};
