//! Input format adapters
//!
//! Adapters for the three inputs of a run: the VCF holding the variant,
//! the geo-reference table and the environmental raster.

pub mod georef;
pub mod raster;
pub mod vcf;

pub use georef::{GeoRefRow, GeoReference};
pub use raster::{add_raster_values, RasterGrid, RasterSampler};
pub use vcf::{read_variant, read_variant_from, VariantGenotypes, VcfRecordView};
