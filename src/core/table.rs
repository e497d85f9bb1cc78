//! The per-sample table shared by every pipeline stage
//!
//! One row per VCF sample. Stages never add or drop rows; each enrichment
//! step returns a new table with one more group of columns filled in.

use crate::core::genotype::Phasing;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// CSV export columns, in `SampleRecord` field order
pub const CSV_COLUMNS: [&str; 6] = ["sample_id", "genotype", "phased", "latitude", "longitude", "value"];

/// One sample's genotype, location and environmental value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub sample_id: String,
    /// `a|b` or `a/b`; missing when the call has a missing allele
    pub genotype: Option<String>,
    pub phased: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub value: Option<f64>,
}

impl SampleRecord {
    pub fn new(sample_id: impl Into<String>, genotype: Option<String>, phased: bool) -> Self {
        Self {
            sample_id: sample_id.into(),
            genotype,
            phased,
            latitude: None,
            longitude: None,
            value: None,
        }
    }

    /// (latitude, longitude) when both are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if !lat.is_nan() && !lon.is_nan() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// A genotype category paired with an observed value, ready for plotting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Index into [`Phasing::categories`]
    pub category: usize,
    pub value: f64,
}

/// Ordered collection of sample records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    records: Vec<SampleRecord>,
}

impl SampleTable {
    pub fn new(records: Vec<SampleRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SampleRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.sample_id.as_str())
    }

    /// Rows with both coordinates
    pub fn located_count(&self) -> usize {
        self.records.iter().filter(|r| r.coordinates().is_some()).count()
    }

    /// Rows with an environmental value
    pub fn valued_count(&self) -> usize {
        self.records.iter().filter(|r| r.value.is_some()).count()
    }

    /// Rewrite recognized genotypes into the display vocabulary of `phasing`.
    ///
    /// Genotypes without a category are left as they are.
    pub fn normalized(self, phasing: Phasing) -> Self {
        let records = self
            .records
            .into_iter()
            .map(|mut record| {
                if let Some(category) = record.genotype.as_deref().and_then(|g| phasing.normalize(g)) {
                    record.genotype = Some(category.to_string());
                }
                record
            })
            .collect();
        Self { records }
    }

    /// Rows that have both a categorized genotype and a value, in table order
    pub fn observations(&self, phasing: Phasing) -> Vec<Observation> {
        self.records
            .iter()
            .filter_map(|r| {
                let value = r.value.filter(|v| !v.is_nan())?;
                let category = phasing.category_index(r.genotype.as_deref()?)?;
                Some(Observation { category, value })
            })
            .collect()
    }

    /// Write the table as CSV; missing fields become empty cells
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        // serde only emits the header together with the first row
        if self.records.is_empty() {
            wtr.write_record(CSV_COLUMNS)?;
        }
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table as CSV to a file
    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}
