//! End-to-end runs over small VCF, raster and geo-reference files

use geogenoplot::core::genotype::Phasing;
use geogenoplot::{run, GeoGenoPlotError, OutputFormat, PlotOptions, Statistic, VcfError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VCF: &str = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\ts2\ts3\ts4\n\
1\t100\tsnp0\tG\tC\t.\tPASS\t.\tGT\t0/0\t0/0\t0/0\t0/0\n\
1\t200\tsnp1\tA\tT\t.\tPASS\t.\tGT\t0/0\t0/1\t1/1\t1/0\n";

/// One row of four 10-degree cells starting at (0, 0)
const RASTER: &str = "ncols 4\n\
nrows 1\n\
xllcorner 0\n\
yllcorner 0\n\
cellsize 10\n\
NODATA_value -9999\n\
1.0 2.0 3.0 2.5\n";

const GEOREF: &str = "sample_id,latitude,longitude\n\
s1,5,5\n\
s2,5,15\n\
s3,5,25\n\
s4,5,35\n";

struct Fixture {
    dir: TempDir,
    options: PlotOptions,
}

fn fixture(georef: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, content: &str| -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    };
    let vcf = write("calls.vcf", VCF);
    let raster = write("bio1.asc", RASTER);
    let georef = write("samples.csv", georef);

    let mut options = PlotOptions::new(vcf, raster, georef, "snp1");
    options.outdir = dir.path().join("out");
    options.format = OutputFormat::Svg;
    options.env_factor_name = "bio1".to_string();
    Fixture { dir, options }
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

fn output_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_scenario_csv() {
    let f = fixture(GEOREF);
    let report = run(&f.options).unwrap();
    assert!(report.is_success());
    assert_eq!((report.samples, report.located, report.valued), (4, 4, 4));

    let rows = read_csv(&f.options.csv_path());
    assert_eq!(rows.len(), 4);
    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    let genotypes: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    let values: Vec<f64> = rows.iter().map(|r| r[5].parse().unwrap()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3", "s4"]);
    assert_eq!(genotypes, vec!["0/0", "0/1", "1/1", "0/1"]);
    assert_eq!(values, vec![1.0, 2.0, 3.0, 2.5]);
}

#[test]
fn test_all_statistics_write_three_figures() {
    let f = fixture(GEOREF);
    run(&f.options).unwrap();

    assert_eq!(
        output_names(&f.options.outdir),
        vec![
            "snp1.correlation.kruskal.svg",
            "snp1.correlation.pearson.svg",
            "snp1.correlation.spearman.svg",
            "snp1.csv",
            "snp1.map.svg",
        ]
    );
}

#[test]
fn test_single_statistic_writes_one_figure() {
    let mut f = fixture(GEOREF);
    f.options.statistics = vec![Statistic::Pearson];
    let report = run(&f.options).unwrap();

    assert_eq!(report.files.len(), 3);
    let svg = fs::read_to_string(f.options.correlation_path(Statistic::Pearson)).unwrap();
    assert!(svg.contains("Pearson correlation: 9.5618e-01"));
    assert!(svg.contains("Genotype (Ref: A, Alt: T)"));
    assert!(!f.options.correlation_path(Statistic::Spearman).exists());
}

#[test]
fn test_variant_not_found_writes_nothing() {
    let mut f = fixture(GEOREF);
    f.options.variant_id = "rs404".to_string();
    let err = run(&f.options).err().unwrap();

    assert!(matches!(err, GeoGenoPlotError::Vcf(VcfError::VariantNotFound { .. })));
    assert!(err.to_string().contains("rs404"));
    assert!(!f.options.outdir.exists());
}

#[test]
fn test_unlocated_sample_kept_in_csv() {
    let f = fixture("sample_id,latitude,longitude\ns1,5,5\ns2,5,15\ns3,5,25\n");
    let report = run(&f.options).unwrap();
    assert_eq!((report.located, report.valued), (3, 3));

    let rows = read_csv(&f.options.csv_path());
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], vec!["s4", "0/1", "false", "", "", ""]);
}

#[test]
fn test_point_outside_raster_has_no_value() {
    let f = fixture("sample_id,latitude,longitude\ns1,5,5\ns2,5,15\ns3,5,25\ns4,-50,35\n");
    let report = run(&f.options).unwrap();
    assert_eq!((report.located, report.valued), (4, 3));

    let rows = read_csv(&f.options.csv_path());
    assert_eq!(rows[3][5], "");
}

#[test]
fn test_factor_scales_values() {
    let mut f = fixture(GEOREF);
    f.options.factor = 0.5;
    f.options.statistics = vec![Statistic::Kruskal];
    run(&f.options).unwrap();

    let rows = read_csv(&f.options.csv_path());
    let values: Vec<f64> = rows.iter().map(|r| r[5].parse().unwrap()).collect();
    assert_eq!(values, vec![0.5, 1.0, 1.5, 1.25]);
}

#[test]
fn test_rerun_gives_identical_csv() {
    let f = fixture(GEOREF);
    run(&f.options).unwrap();
    let first = fs::read_to_string(f.options.csv_path()).unwrap();
    run(&f.options).unwrap();
    let second = fs::read_to_string(f.options.csv_path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_phased_run_keeps_raw_genotypes() {
    let mut f = fixture(GEOREF);
    f.options.phasing = Phasing::Phased;
    f.options.statistics = vec![Statistic::Spearman];
    let report = run(&f.options).unwrap();
    assert!(report.is_success());

    let rows = read_csv(&f.options.csv_path());
    let genotypes: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(genotypes, vec!["0/0", "0/1", "1/1", "1/0"]);

    let svg = fs::read_to_string(f.options.correlation_path(Statistic::Spearman)).unwrap();
    assert!(!svg.contains("Spearman correlation"));
}

#[test]
fn test_missing_raster_is_fatal() {
    let mut f = fixture(GEOREF);
    f.options.raster = f.dir.path().join("missing.asc");
    assert!(matches!(run(&f.options), Err(GeoGenoPlotError::Raster(_))));
    assert!(!f.options.outdir.exists());
}

#[test]
fn test_sites_only_variant_writes_csv_header() {
    let f = fixture(GEOREF);
    fs::write(
        &f.options.vcf,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n1\t200\tsnp1\tA\tT\t.\tPASS\t.\n",
    )
    .unwrap();
    let report = run(&f.options).unwrap();
    assert_eq!(report.samples, 0);

    let csv = fs::read_to_string(f.options.csv_path()).unwrap();
    assert_eq!(csv, "sample_id,genotype,phased,latitude,longitude,value\n");
}

#[test]
fn test_pdf_figures_embed_text() {
    let mut db = svg2pdf::usvg::fontdb::Database::new();
    db.load_system_fonts();
    if db.len() == 0 {
        return;
    }

    let mut f = fixture(GEOREF);
    f.options.format = OutputFormat::Pdf;
    f.options.statistics = vec![Statistic::Pearson];
    let report = run(&f.options).unwrap();
    assert!(report.is_success());

    let has_font = |path: PathBuf| {
        let pdf = fs::read(path).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        pdf.windows(5).any(|w| w == b"/Font")
    };
    assert!(has_font(f.options.correlation_path(Statistic::Pearson)));
    assert!(has_font(f.options.map_path()));
}
