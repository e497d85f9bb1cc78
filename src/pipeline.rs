//! Run orchestration
//!
//! Load variant → join coordinates → sample raster → correlation plot(s)
//! → CSV export → map. Every stage takes a table and returns a new one.

use crate::core::genotype::Phasing;
use crate::core::{Result, SampleTable, Statistic};
use crate::formats::{add_raster_values, read_variant, GeoReference, RasterGrid, RasterSampler, VariantGenotypes};
use crate::plot::{allele_corr_plot, scatter_map_plot, CorrelationOptions, MapOptions, OutputFormat, Theme};
use std::path::PathBuf;

/// Resolved configuration of one run
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub vcf: PathBuf,
    pub raster: PathBuf,
    pub georef: PathBuf,
    pub variant_id: String,
    pub phasing: Phasing,
    /// Y axis label and map value label
    pub env_factor_name: String,
    /// Statistics to plot, one figure each
    pub statistics: Vec<Statistic>,
    pub trendline: bool,
    /// Map latitude bounds (south, north)
    pub lat: (i32, i32),
    /// Map longitude bounds (west, east)
    pub lon: (i32, i32),
    /// Multiplier applied to every sampled raster value
    pub factor: f64,
    pub outdir: PathBuf,
    pub format: OutputFormat,
    pub title: String,
}

impl PlotOptions {
    /// Options with the command line defaults
    pub fn new(
        vcf: impl Into<PathBuf>,
        raster: impl Into<PathBuf>,
        georef: impl Into<PathBuf>,
        variant_id: impl Into<String>,
    ) -> Self {
        Self {
            vcf: vcf.into(),
            raster: raster.into(),
            georef: georef.into(),
            variant_id: variant_id.into(),
            phasing: Phasing::Unphased,
            env_factor_name: "value".to_string(),
            statistics: Statistic::ALL.to_vec(),
            trendline: true,
            lat: (-37, 51),
            lon: (-20, 95),
            factor: 1.0,
            outdir: PathBuf::from("."),
            format: OutputFormat::Pdf,
            title: "Correlation".to_string(),
        }
    }

    /// `<outdir>/<id>.correlation.<statistic>.<ext>`
    pub fn correlation_path(&self, statistic: Statistic) -> PathBuf {
        self.outdir.join(format!(
            "{}.correlation.{}.{}",
            self.variant_id,
            statistic.name(),
            self.format.extension()
        ))
    }

    /// `<outdir>/<id>.csv`
    pub fn csv_path(&self) -> PathBuf {
        self.outdir.join(format!("{}.csv", self.variant_id))
    }

    /// `<outdir>/<id>.map.<ext>`
    pub fn map_path(&self) -> PathBuf {
        self.outdir
            .join(format!("{}.map.{}", self.variant_id, self.format.extension()))
    }
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunReport {
    pub samples: usize,
    pub located: usize,
    pub valued: usize,
    /// Files written, in order
    pub files: Vec<PathBuf>,
    /// Statistics whose figure could not be produced, with the reason
    pub failed: Vec<(Statistic, String)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Join coordinates and raster values onto the variant's sample table.
///
/// In unphased mode recognized genotypes are rewritten into the unphased
/// vocabulary so the plots, the CSV and the map agree.
pub fn enrich_table<S: RasterSampler + ?Sized>(
    variant: VariantGenotypes,
    georef: &GeoReference,
    sampler: &S,
    factor: f64,
    phasing: Phasing,
) -> SampleTable {
    let table = georef.annotate(variant.table);
    let table = add_raster_values(table, sampler, factor);
    match phasing {
        Phasing::Unphased => table.normalized(phasing),
        Phasing::Phased => table,
    }
}

/// Write the correlation figures, the CSV and the map for an enriched table.
///
/// A statistic that cannot be computed is recorded in the report and the
/// remaining outputs are still written.
pub fn write_outputs(
    table: &SampleTable,
    ref_allele: &str,
    alt_allele: &str,
    options: &PlotOptions,
) -> Result<RunReport> {
    std::fs::create_dir_all(&options.outdir)?;

    let mut report = RunReport {
        samples: table.len(),
        located: table.located_count(),
        valued: table.valued_count(),
        ..RunReport::default()
    };
    let theme = Theme::default();

    for &statistic in &options.statistics {
        let path = options.correlation_path(statistic);
        let corr_options = CorrelationOptions {
            ref_allele: Some(ref_allele.to_string()),
            alt_allele: Some(alt_allele.to_string()),
            phasing: options.phasing,
            trendline: options.trendline,
            statistic,
            y_label: options.env_factor_name.clone(),
            title: options.title.clone(),
            theme: theme.clone(),
            ..CorrelationOptions::default()
        };

        match allele_corr_plot(table, &corr_options, Some((path.as_path(), options.format))) {
            Ok(figure) => {
                if let Some(subtitle) = &figure.summary.subtitle {
                    log::info!("{}", subtitle);
                }
                report.files.push(path);
            }
            Err(e) => {
                log::error!("{} plot failed: {}", statistic, e);
                report.failed.push((statistic, e.to_string()));
            }
        }
    }

    let csv_path = options.csv_path();
    table.write_csv_file(&csv_path)?;
    report.files.push(csv_path);

    let map_options = MapOptions {
        title: options.variant_id.clone(),
        value_label: options.env_factor_name.clone(),
        lon: options.lon,
        lat: options.lat,
        phasing: options.phasing,
        theme,
        ..MapOptions::default()
    };
    let map_path = options.map_path();
    scatter_map_plot(table, &map_options)?.save(&map_path, options.format)?;
    report.files.push(map_path);

    Ok(report)
}

/// Run the whole pipeline from input files.
///
/// All inputs are read before anything is written, so a missing variant or
/// an unreadable input leaves no output behind.
pub fn run(options: &PlotOptions) -> Result<RunReport> {
    let variant = read_variant(&options.vcf, &options.variant_id)?;
    log::info!(
        "Variant {} at {} (Ref: {}, Alt: {}), {} samples",
        variant.id,
        variant.chrom,
        variant.ref_allele,
        variant.alt_allele,
        variant.table.len()
    );

    let georef = GeoReference::from_path(&options.georef)?;
    log::info!("Geo-reference: {} rows", georef.row_count());

    let raster = RasterGrid::open(&options.raster)?;
    log::info!("Raster: {} x {} cells", raster.ncols(), raster.nrows());

    let ref_allele = variant.ref_allele.clone();
    let alt_allele = variant.alt_allele.clone();
    let table = enrich_table(variant, &georef, &raster, options.factor, options.phasing);

    write_outputs(&table, &ref_allele, &alt_allele, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleRecord;
    use crate::formats::GeoRefRow;

    struct ListSampler(Vec<Option<f64>>);

    impl RasterSampler for ListSampler {
        fn sample_many(&self, points: &[(f64, f64)]) -> Vec<Option<f64>> {
            assert_eq!(points.len(), self.0.len());
            self.0.clone()
        }
    }

    fn variant() -> VariantGenotypes {
        let table = SampleTable::new(
            ["0/0", "0/1", "1/1", "1/0"]
                .iter()
                .enumerate()
                .map(|(i, gt)| SampleRecord::new(format!("s{}", i + 1), Some(gt.to_string()), false))
                .collect(),
        );
        VariantGenotypes {
            id: "snp1".into(),
            chrom: "1".into(),
            ref_allele: "A".into(),
            alt_allele: "T".into(),
            table,
        }
    }

    fn georef(ids: &[&str]) -> GeoReference {
        GeoReference::from_rows(ids.iter().enumerate().map(|(i, id)| GeoRefRow {
            sample_id: id.to_string(),
            latitude: Some(i as f64),
            longitude: Some(10.0 + i as f64),
        }))
    }

    #[test]
    fn test_output_paths() {
        let mut options = PlotOptions::new("a.vcf", "b.asc", "c.csv", "snp1");
        options.outdir = PathBuf::from("out");
        assert_eq!(
            options.correlation_path(Statistic::Kruskal),
            PathBuf::from("out/snp1.correlation.kruskal.pdf")
        );
        assert_eq!(options.csv_path(), PathBuf::from("out/snp1.csv"));
        options.format = OutputFormat::Svg;
        assert_eq!(options.map_path(), PathBuf::from("out/snp1.map.svg"));
    }

    #[test]
    fn test_enrich_normalizes_unphased() {
        let sampler = ListSampler(vec![Some(1.0), Some(2.0), Some(3.0), Some(2.5)]);
        let table = enrich_table(
            variant(),
            &georef(&["s1", "s2", "s3", "s4"]),
            &sampler,
            1.0,
            Phasing::Unphased,
        );

        let genotypes: Vec<_> = table.records().iter().map(|r| r.genotype.clone().unwrap()).collect();
        assert_eq!(genotypes, vec!["0/0", "0/1", "1/1", "0/1"]);
        let values: Vec<_> = table.records().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0), Some(2.5)]);
    }

    #[test]
    fn test_enrich_unlocated_sample() {
        // s2 has no coordinates, so only three points reach the sampler
        let sampler = ListSampler(vec![Some(1.0), Some(3.0), None]);
        let table = enrich_table(variant(), &georef(&["s1", "s3", "s4"]), &sampler, 2.0, Phasing::Unphased);

        assert_eq!(table.len(), 4);
        let s2 = &table.records()[1];
        assert_eq!((s2.latitude, s2.longitude, s2.value), (None, None, None));
        assert_eq!(table.records()[0].value, Some(2.0));
        assert_eq!(table.records()[2].value, Some(6.0));
        assert_eq!(table.records()[3].value, None);
    }

    #[test]
    fn test_enrich_phased_keeps_raw_genotypes() {
        let sampler = ListSampler(vec![None; 4]);
        let table = enrich_table(variant(), &georef(&["s1", "s2", "s3", "s4"]), &sampler, 1.0, Phasing::Phased);
        assert_eq!(table.records()[3].genotype.as_deref(), Some("1/0"));
    }

    #[test]
    fn test_write_outputs_records_failed_statistic() {
        // one observation per genotype is too few for any statistic but the
        // CSV and the map still get written
        let sampler = ListSampler(vec![Some(1.0)]);
        let table = enrich_table(variant(), &georef(&["s1"]), &sampler, 1.0, Phasing::Unphased);

        let dir = tempfile::tempdir().unwrap();
        let mut options = PlotOptions::new("a.vcf", "b.asc", "c.csv", "snp1");
        options.outdir = dir.path().to_path_buf();
        options.format = OutputFormat::Svg;
        options.statistics = vec![Statistic::Pearson];

        let report = write_outputs(&table, "A", "T", &options).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.failed[0].0, Statistic::Pearson);
        assert!(!options.correlation_path(Statistic::Pearson).exists());
        assert!(options.csv_path().exists());
        assert!(options.map_path().exists());
        assert_eq!(report.files.len(), 2);
        assert_eq!((report.samples, report.located, report.valued), (4, 1, 1));
    }
}
