//! Environmental raster sampling
//!
//! Supports north-up single-band grids in two formats:
//! - ESRI ASCII grid (`.asc`, optionally gzip/bzip2 compressed)
//! - GeoTIFF (`.tif`/`.tiff`) georeferenced by ModelTiepoint + ModelPixelScale
//!
//! Points are given as (latitude, longitude) in the raster's CRS units.
//! A point outside the grid, on a nodata cell or on a NaN cell samples to
//! `None`.

use crate::core::io::{open_text_reader, LineIterator};
use crate::core::{RasterError, RasterResult, SampleTable};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

/// Anything that can look up raster values for a batch of points
pub trait RasterSampler {
    /// Value at each (latitude, longitude), in input order
    fn sample_many(&self, points: &[(f64, f64)]) -> Vec<Option<f64>>;
}

/// In-memory north-up raster grid
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    ncols: usize,
    nrows: usize,
    /// x (longitude) of the left edge
    west: f64,
    /// y (latitude) of the top edge
    north: f64,
    cell_width: f64,
    cell_height: f64,
    nodata: Option<f64>,
    /// Row-major cells, top row first
    cells: Vec<f64>,
}

impl RasterGrid {
    /// Build a grid from its geometry and row-major cells (top row first)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ncols: usize,
        nrows: usize,
        west: f64,
        north: f64,
        cell_width: f64,
        cell_height: f64,
        nodata: Option<f64>,
        cells: Vec<f64>,
    ) -> RasterResult<Self> {
        if cells.len() != ncols * nrows {
            return Err(RasterError::CellCountMismatch {
                expected: ncols * nrows,
                found: cells.len(),
            });
        }
        Ok(Self {
            ncols,
            nrows,
            west,
            north,
            cell_width,
            cell_height,
            nodata,
            cells,
        })
    }

    /// Open a raster file, choosing the format from its extension
    pub fn open<P: AsRef<Path>>(path: P) -> RasterResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let stem = name
            .trim_end_matches(".gz")
            .trim_end_matches(".bgz")
            .trim_end_matches(".bz2");

        if stem.ends_with(".asc") {
            Self::from_ascii_grid(open_text_reader(path)?)
        } else if stem.ends_with(".tif") || stem.ends_with(".tiff") {
            let file = File::open(path)?;
            Self::from_geotiff(BufReader::new(file))
        } else {
            Err(RasterError::UnsupportedFormat(name))
        }
    }

    /// Parse an ESRI ASCII grid
    pub fn from_ascii_grid<R: BufRead>(reader: R) -> RasterResult<Self> {
        let mut lines = LineIterator::new(reader);
        let mut header = AsciiGridHeader::default();
        let mut cells = Vec::new();
        let mut line_number = 0;

        while let Some(line) = lines.next_line() {
            let line = line?;
            line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let starts_alpha = trimmed
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic());
            if starts_alpha && cells.is_empty() {
                header.parse_line(trimmed, line_number)?;
                continue;
            }

            for token in trimmed.split_ascii_whitespace() {
                let value: f64 = token.parse().map_err(|_| RasterError::InvalidNumber {
                    line: line_number,
                    value: token.to_string(),
                })?;
                cells.push(value);
            }
        }

        header.into_grid(cells)
    }

    /// Decode the first band of a GeoTIFF
    pub fn from_geotiff<R: Read + Seek>(reader: R) -> RasterResult<Self> {
        let mut decoder = Decoder::new(reader)?;
        let (width, height) = decoder.dimensions()?;
        let (ncols, nrows) = (width as usize, height as usize);

        let scale = decoder
            .get_tag_f64_vec(Tag::ModelPixelScaleTag)
            .map_err(|_| RasterError::MissingGeoTag("ModelPixelScale"))?;
        let tiepoint = decoder
            .get_tag_f64_vec(Tag::ModelTiepointTag)
            .map_err(|_| RasterError::MissingGeoTag("ModelTiepoint"))?;
        if scale.len() < 2 {
            return Err(RasterError::MissingGeoTag("ModelPixelScale"));
        }
        if tiepoint.len() < 6 {
            return Err(RasterError::MissingGeoTag("ModelTiepoint"));
        }

        let nodata = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '\0').parse().ok());

        let samples = decoding_result_to_f64(decoder.read_image()?)?;
        let band_count = (samples.len() / (ncols * nrows).max(1)).max(1);
        let cells: Vec<f64> = samples.into_iter().step_by(band_count).collect();

        // Tiepoint maps raster (i, j) to model (x, y)
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let west = x - i * scale[0];
        let north = y + j * scale[1];

        Self::new(ncols, nrows, west, north, scale[0], scale[1], nodata, cells)
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Extent as (west, south, east, north)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.west,
            self.north - self.nrows as f64 * self.cell_height,
            self.west + self.ncols as f64 * self.cell_width,
            self.north,
        )
    }

    /// Value of the cell containing (lat, lon)
    pub fn value_at(&self, lat: f64, lon: f64) -> Option<f64> {
        if lat.is_nan() || lon.is_nan() {
            return None;
        }
        let col = ((lon - self.west) / self.cell_width).floor();
        let row = ((self.north - lat) / self.cell_height).floor();
        if col < 0.0 || row < 0.0 || col >= self.ncols as f64 || row >= self.nrows as f64 {
            return None;
        }

        let value = self.cells[row as usize * self.ncols + col as usize];
        if value.is_nan() || self.nodata == Some(value) {
            None
        } else {
            Some(value)
        }
    }
}

impl RasterSampler for RasterGrid {
    fn sample_many(&self, points: &[(f64, f64)]) -> Vec<Option<f64>> {
        points.iter().map(|(lat, lon)| self.value_at(*lat, *lon)).collect()
    }
}

fn decoding_result_to_f64(image: DecodingResult) -> RasterResult<Vec<f64>> {
    let values = match image {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => return Err(RasterError::UnsupportedFormat("TIFF sample type".to_string())),
    };
    Ok(values)
}

/// Header of an ESRI ASCII grid
#[derive(Debug, Default)]
struct AsciiGridHeader {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<f64>,
    yll: Option<f64>,
    /// true when xll/yll give the lower-left cell center
    centered: bool,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

impl AsciiGridHeader {
    fn parse_line(&mut self, line: &str, line_number: usize) -> RasterResult<()> {
        let mut parts = line.split_ascii_whitespace();
        let key = parts.next().unwrap_or("").to_ascii_lowercase();
        let raw = parts.next().ok_or_else(|| RasterError::InvalidHeader {
            line: line_number,
            message: format!("missing value for '{}'", key),
        })?;
        let number = |raw: &str| -> RasterResult<f64> {
            raw.parse().map_err(|_| RasterError::InvalidNumber {
                line: line_number,
                value: raw.to_string(),
            })
        };

        match key.as_str() {
            "ncols" => self.ncols = Some(number(raw)? as usize),
            "nrows" => self.nrows = Some(number(raw)? as usize),
            "xllcorner" => self.xll = Some(number(raw)?),
            "yllcorner" => self.yll = Some(number(raw)?),
            "xllcenter" => {
                self.xll = Some(number(raw)?);
                self.centered = true;
            }
            "yllcenter" => {
                self.yll = Some(number(raw)?);
                self.centered = true;
            }
            "cellsize" => self.cellsize = Some(number(raw)?),
            "nodata_value" => self.nodata = Some(number(raw)?),
            other => {
                return Err(RasterError::InvalidHeader {
                    line: line_number,
                    message: format!("unknown key '{}'", other),
                })
            }
        }
        Ok(())
    }

    fn into_grid(self, cells: Vec<f64>) -> RasterResult<RasterGrid> {
        let missing = |name: &str| RasterError::InvalidHeader {
            line: 0,
            message: format!("missing '{}'", name),
        };
        let ncols = self.ncols.ok_or_else(|| missing("ncols"))?;
        let nrows = self.nrows.ok_or_else(|| missing("nrows"))?;
        let xll = self.xll.ok_or_else(|| missing("xllcorner"))?;
        let yll = self.yll.ok_or_else(|| missing("yllcorner"))?;
        let cellsize = self.cellsize.ok_or_else(|| missing("cellsize"))?;

        let shift = if self.centered { cellsize / 2.0 } else { 0.0 };
        let west = xll - shift;
        let north = yll - shift + nrows as f64 * cellsize;

        RasterGrid::new(ncols, nrows, west, north, cellsize, cellsize, self.nodata, cells)
    }
}

/// Return `table` with `value` set to `sampled * factor` for every located row.
///
/// All located points go to the sampler in a single batch. Rows without
/// coordinates, or whose point samples to nothing, keep a missing value.
pub fn add_raster_values<S: RasterSampler + ?Sized>(
    table: SampleTable,
    sampler: &S,
    factor: f64,
) -> SampleTable {
    let located: Vec<(usize, (f64, f64))> = table
        .records()
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.coordinates().map(|c| (i, c)))
        .collect();
    let points: Vec<(f64, f64)> = located.iter().map(|(_, c)| *c).collect();

    let mut sampled: Vec<Option<f64>> = vec![None; table.len()];
    for ((index, _), value) in located.iter().zip(sampler.sample_many(&points)) {
        sampled[*index] = value;
    }

    let records = table
        .into_records()
        .into_iter()
        .zip(sampled)
        .map(|(mut record, value)| {
            record.value = value.map(|v| v * factor);
            record
        })
        .collect();
    SampleTable::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleRecord;
    use std::cell::Cell;
    use std::io::Cursor;

    const ASC: &str = "ncols 3\n\
nrows 2\n\
xllcorner 0\n\
yllcorner 0\n\
cellsize 10\n\
NODATA_value -9999\n\
1 2 3\n\
4 -9999 6\n";

    #[test]
    fn test_ascii_grid_lookup() {
        let grid = RasterGrid::from_ascii_grid(Cursor::new(ASC)).unwrap();
        assert_eq!(grid.ncols(), 3);
        assert_eq!(grid.nrows(), 2);
        assert_eq!(grid.bounds(), (0.0, 0.0, 30.0, 20.0));

        // top row covers latitude 10..20
        assert_eq!(grid.value_at(15.0, 5.0), Some(1.0));
        assert_eq!(grid.value_at(15.0, 25.0), Some(3.0));
        assert_eq!(grid.value_at(5.0, 5.0), Some(4.0));
        // nodata cell
        assert_eq!(grid.value_at(5.0, 15.0), None);
        // outside extent
        assert_eq!(grid.value_at(25.0, 5.0), None);
        assert_eq!(grid.value_at(5.0, -1.0), None);
        assert_eq!(grid.value_at(5.0, 30.0), None);
    }

    #[test]
    fn test_ascii_grid_center_registration() {
        let asc = "ncols 2\nnrows 1\nxllcenter 0.5\nyllcenter 0.5\ncellsize 1\n7 8\n";
        let grid = RasterGrid::from_ascii_grid(Cursor::new(asc)).unwrap();
        assert_eq!(grid.bounds(), (0.0, 0.0, 2.0, 1.0));
        assert_eq!(grid.value_at(0.5, 1.5), Some(8.0));
    }

    #[test]
    fn test_ascii_grid_errors() {
        let short = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n";
        assert!(matches!(
            RasterGrid::from_ascii_grid(Cursor::new(short)),
            Err(RasterError::CellCountMismatch { expected: 4, found: 3 })
        ));

        let bad = "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nabc\n";
        assert!(matches!(
            RasterGrid::from_ascii_grid(Cursor::new(bad)),
            Err(RasterError::InvalidHeader { .. })
        ));

        let no_size = "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\n1\n";
        assert!(matches!(
            RasterGrid::from_ascii_grid(Cursor::new(no_size)),
            Err(RasterError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_open_unsupported_extension() {
        let err = RasterGrid::open("climate.nc").err().unwrap();
        assert!(matches!(err, RasterError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_nan_cell_is_missing() {
        let grid = RasterGrid::new(1, 1, 0.0, 1.0, 1.0, 1.0, None, vec![f64::NAN]).unwrap();
        assert_eq!(grid.value_at(0.5, 0.5), None);
    }

    /// Sampler returning fixed values and counting batches
    struct FixedSampler {
        values: Vec<Option<f64>>,
        calls: Cell<usize>,
    }

    impl RasterSampler for FixedSampler {
        fn sample_many(&self, points: &[(f64, f64)]) -> Vec<Option<f64>> {
            self.calls.set(self.calls.get() + 1);
            self.values[..points.len()].to_vec()
        }
    }

    fn located(id: &str, coords: Option<(f64, f64)>) -> SampleRecord {
        let mut r = SampleRecord::new(id, Some("0/1".to_string()), false);
        if let Some((lat, lon)) = coords {
            r.latitude = Some(lat);
            r.longitude = Some(lon);
        }
        r
    }

    #[test]
    fn test_add_raster_values_single_batch() {
        let table = SampleTable::new(vec![
            located("a", Some((1.0, 1.0))),
            located("b", None),
            located("c", Some((2.0, 2.0))),
            located("d", Some((3.0, 3.0))),
        ]);
        let sampler = FixedSampler {
            values: vec![Some(1.5), None, Some(4.0)],
            calls: Cell::new(0),
        };

        let out = add_raster_values(table, &sampler, 2.0);
        let values: Vec<_> = out.records().iter().map(|r| r.value).collect();

        assert_eq!(sampler.calls.get(), 1);
        assert_eq!(values, vec![Some(3.0), None, None, Some(8.0)]);
        assert_eq!(out.sample_ids().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }
}
