//! VCF variant loader
//!
//! Scans a VCF (plain, gzip/bgzip or bzip2) for the first record whose ID
//! equals the requested variant and extracts one genotype call per sample.
//! Only the ID column is inspected for non-matching records.

use crate::core::genotype::encode_genotype;
use crate::core::io::{open_text_reader, LineIterator};
use crate::core::{SampleRecord, SampleTable, VcfError, VcfResult};
use memchr::memchr;
use std::io::BufRead;
use std::path::Path;

/// Number of fixed columns before FORMAT
const FIXED_FIELDS: usize = 8;

/// Zero-copy VCF record view for parsing
pub struct VcfRecordView<'a> {
    /// Original line
    line: &'a str,
    /// Field boundaries (start, end)
    field_bounds: Vec<(usize, usize)>,
}

impl<'a> VcfRecordView<'a> {
    /// Split a VCF data line on tabs
    pub fn parse(line: &'a str, line_number: usize) -> VcfResult<Self> {
        let bytes = line.as_bytes();
        let mut field_bounds = Vec::with_capacity(16);
        let mut start = 0;

        while let Some(tab) = memchr(b'\t', &bytes[start..]) {
            field_bounds.push((start, start + tab));
            start += tab + 1;
        }
        // Last field
        field_bounds.push((start, bytes.len()));

        if field_bounds.len() < FIXED_FIELDS {
            return Err(VcfError::TooFewFields {
                line: line_number,
                expected: FIXED_FIELDS,
                found: field_bounds.len(),
            });
        }

        Ok(Self { line, field_bounds })
    }

    /// Get the number of fields
    pub fn field_count(&self) -> usize {
        self.field_bounds.len()
    }

    /// Get field as string slice
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.field_bounds
            .get(index)
            .map(|(start, end)| &self.line[*start..*end])
    }

    /// CHROM field (field 0)
    pub fn chrom(&self) -> Option<&'a str> {
        self.field(0)
    }

    /// ID field (field 2)
    pub fn id(&self) -> Option<&'a str> {
        self.field(2)
    }

    /// REF field (field 3)
    pub fn ref_allele(&self) -> Option<&'a str> {
        self.field(3)
    }

    /// First ALT allele (field 4, up to the first comma)
    pub fn first_alt_allele(&self) -> Option<&'a str> {
        self.field(4).and_then(|alts| alts.split(',').next())
    }

    /// FORMAT field (field 8) if present
    pub fn format(&self) -> Option<&'a str> {
        self.field(FIXED_FIELDS)
    }

    /// Sample fields (fields 9+)
    pub fn samples(&self) -> impl Iterator<Item = &'a str> + '_ {
        (FIXED_FIELDS + 1..self.field_count()).filter_map(move |i| self.field(i))
    }

    /// Number of sample columns
    pub fn sample_count(&self) -> usize {
        self.field_count().saturating_sub(FIXED_FIELDS + 1)
    }
}

/// ID column of a data line without splitting the whole record
pub fn record_id(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    let first = memchr(b'\t', bytes)?;
    let second = first + 1 + memchr(b'\t', &bytes[first + 1..])?;
    let end = memchr(b'\t', &bytes[second + 1..])
        .map(|p| second + 1 + p)
        .unwrap_or(bytes.len());
    Some(&line[second + 1..end])
}

/// Parse one GT value into (first allele, second allele, phased).
///
/// Returns `Ok(None)` for missing alleles (`.`) and haploid calls.
pub fn parse_gt(gt: &str, line_number: usize) -> VcfResult<Option<(u32, u32, bool)>> {
    let bytes = gt.as_bytes();
    let sep_pos = match bytes.iter().position(|b| *b == b'/' || *b == b'|') {
        Some(pos) => pos,
        None => return Ok(None),
    };
    let phased = bytes[sep_pos] == b'|';

    let first = &gt[..sep_pos];
    let rest = &gt[sep_pos + 1..];
    let second_end = rest.find(&['/', '|'][..]).unwrap_or(rest.len());
    let second = &rest[..second_end];

    let parse_allele = |allele: &str| -> VcfResult<Option<u32>> {
        if allele == "." {
            return Ok(None);
        }
        allele.parse().map(Some).map_err(|_| VcfError::InvalidAllele {
            line: line_number,
            value: gt.to_string(),
        })
    };

    match (parse_allele(first)?, parse_allele(second)?) {
        (Some(a), Some(b)) => Ok(Some((a, b, phased))),
        _ => Ok(None),
    }
}

/// Genotypes of one variant across all samples
#[derive(Debug, Clone, PartialEq)]
pub struct VariantGenotypes {
    pub id: String,
    pub chrom: String,
    pub ref_allele: String,
    /// First ALT allele, "." when the site has none
    pub alt_allele: String,
    /// One row per sample in header order, genotype and phase filled
    pub table: SampleTable,
}

/// Load the genotypes of `variant_id` from a VCF file
pub fn read_variant<P: AsRef<Path>>(path: P, variant_id: &str) -> VcfResult<VariantGenotypes> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VcfError::FileNotFound(path.to_path_buf()));
    }
    let reader = open_text_reader(path)?;
    read_variant_from(reader, variant_id)
}

/// Load the genotypes of `variant_id` from any buffered VCF stream.
///
/// When several records share the ID, the first one wins.
pub fn read_variant_from<R: BufRead>(reader: R, variant_id: &str) -> VcfResult<VariantGenotypes> {
    let mut lines = LineIterator::new(reader);
    let mut samples: Option<Vec<String>> = None;
    let mut line_number = 0;

    while let Some(line) = lines.next_line() {
        let line = line?;
        line_number += 1;

        if line.is_empty() || line.starts_with("##") {
            continue;
        }
        if line.starts_with("#CHROM") {
            samples = Some(
                line.split('\t')
                    .skip(FIXED_FIELDS + 1)
                    .map(str::to_string)
                    .collect(),
            );
            continue;
        }

        if record_id(line) != Some(variant_id) {
            continue;
        }

        let samples = samples.take().ok_or(VcfError::MissingHeader)?;
        let view = VcfRecordView::parse(line, line_number)?;
        let table = extract_genotypes(&view, &samples, line_number)?;

        log::debug!(
            "Found {} at line {} with {} samples",
            variant_id,
            line_number,
            samples.len()
        );

        return Ok(VariantGenotypes {
            id: variant_id.to_string(),
            chrom: view.chrom().unwrap_or(".").to_string(),
            ref_allele: view.ref_allele().unwrap_or(".").to_string(),
            alt_allele: view.first_alt_allele().unwrap_or(".").to_string(),
            table,
        });
    }

    Err(VcfError::VariantNotFound {
        id: variant_id.to_string(),
    })
}

/// Build the sample table from a matched record
fn extract_genotypes(
    view: &VcfRecordView,
    samples: &[String],
    line_number: usize,
) -> VcfResult<SampleTable> {
    if samples.is_empty() {
        return Ok(SampleTable::default());
    }
    if view.sample_count() != samples.len() {
        return Err(VcfError::SampleCountMismatch {
            line: line_number,
            expected: samples.len(),
            found: view.sample_count(),
        });
    }

    let gt_index = view
        .format()
        .and_then(|format| format.split(':').position(|key| key == "GT"))
        .ok_or(VcfError::MissingGenotypeField { line: line_number })?;

    let mut records = Vec::with_capacity(samples.len());
    for (sample_id, sample_field) in samples.iter().zip(view.samples()) {
        // Trailing FORMAT keys may be dropped from a sample
        let call = match sample_field.split(':').nth(gt_index) {
            Some(gt) => parse_gt(gt, line_number)?,
            None => None,
        };

        let record = match call {
            Some((first, second, phased)) => {
                SampleRecord::new(sample_id.clone(), Some(encode_genotype(first, second, phased)), phased)
            }
            None => SampleRecord::new(sample_id.clone(), None, false),
        };
        records.push(record);
    }

    Ok(SampleTable::new(records))
}
