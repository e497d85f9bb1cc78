//! Geo-reference table and coordinate join
//!
//! The table is a comma-separated file with a header naming at least
//! `sample_id`, `latitude` and `longitude` (any order, extra columns are
//! ignored). Empty, `NA` and `NaN` coordinates count as missing.

use crate::core::{GeoRefError, GeoRefResult, SampleTable};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 3] = ["sample_id", "latitude", "longitude"];

/// Deserialize an optional f64, treating "NA", "NaN", empty strings as None
fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty()
                || trimmed.eq_ignore_ascii_case("na")
                || trimmed.eq_ignore_ascii_case("nan")
            {
                Ok(None)
            } else {
                trimmed
                    .parse::<f64>()
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}

/// One row of the geo-reference table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoRefRow {
    pub sample_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub longitude: Option<f64>,
}

/// Sample coordinates keyed by sample ID
#[derive(Debug, Clone, Default)]
pub struct GeoReference {
    coords: HashMap<String, (Option<f64>, Option<f64>)>,
    rows: usize,
}

impl GeoReference {
    /// Build from rows; the first row for a repeated sample ID wins
    pub fn from_rows<I: IntoIterator<Item = GeoRefRow>>(rows: I) -> Self {
        let mut coords = HashMap::new();
        let mut count = 0;
        for row in rows {
            count += 1;
            coords
                .entry(row.sample_id)
                .or_insert((row.latitude, row.longitude));
        }
        Self { coords, rows: count }
    }

    /// Read a geo-reference CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> GeoRefResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a geo-reference table from any CSV stream
    pub fn from_reader<R: Read>(reader: R) -> GeoRefResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(GeoRefError::MissingColumn(column));
            }
        }

        let rows = rdr
            .deserialize::<GeoRefRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(rows))
    }

    /// Coordinates of a sample, if listed
    pub fn get(&self, sample_id: &str) -> Option<(Option<f64>, Option<f64>)> {
        self.coords.get(sample_id).copied()
    }

    /// Number of rows read, duplicates included
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Return `table` with latitude/longitude copied from matching rows.
    ///
    /// Unmatched samples keep missing coordinates; row order and count are
    /// unchanged.
    pub fn annotate(&self, table: SampleTable) -> SampleTable {
        let records = table
            .into_records()
            .into_iter()
            .map(|mut record| {
                if let Some((lat, lon)) = self.get(&record.sample_id) {
                    record.latitude = lat;
                    record.longitude = lon;
                }
                record
            })
            .collect();
        SampleTable::new(records)
    }
}
