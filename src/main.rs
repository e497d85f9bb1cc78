//! GeoGenoPlot CLI entry point
//!
//! Plots the genotypes of one variant against an environmental raster.

use clap::{CommandFactory, Parser, ValueEnum};
use geogenoplot::{run, OutputFormat, Phasing, PlotOptions, Statistic};
use std::path::PathBuf;
use std::time::Instant;

/// Statistic choice on the command line
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum StatisticArg {
    /// Pearson correlation
    Pearson,
    /// Spearman rank correlation
    Spearman,
    /// Kruskal-Wallis H test
    Kruskal,
    /// One figure per statistic
    #[default]
    All,
}

impl StatisticArg {
    fn statistics(self) -> Vec<Statistic> {
        match self {
            StatisticArg::Pearson => vec![Statistic::Pearson],
            StatisticArg::Spearman => vec![Statistic::Spearman],
            StatisticArg::Kruskal => vec![Statistic::Kruskal],
            StatisticArg::All => Statistic::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum FormatArg {
    #[default]
    Pdf,
    Svg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

/// Parse "MIN,MAX" into truncated integer bounds
fn parse_range(s: &str) -> Result<(i32, i32), String> {
    let (min, max) = s
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map(|f| f.trunc() as i32)
            .map_err(|e| format!("invalid bound '{}': {}", v, e))
    };
    let (min, max) = (parse(min)?, parse(max)?);
    if min >= max {
        return Err(format!("MIN must be below MAX, got {},{}", min, max));
    }
    Ok((min, max))
}

#[derive(Parser)]
#[command(name = "geogenoplot")]
#[command(about = "Plot correlations between a variant's genotypes and an environmental factor")]
#[command(version)]
struct Cli {
    /// VCF file (plain, gzip/bgzip or bzip2)
    vcf_file: Option<PathBuf>,
    /// Environmental raster (.asc or GeoTIFF)
    raster_file: Option<PathBuf>,
    /// CSV with sample_id, latitude and longitude columns
    georef_table: Option<PathBuf>,
    /// ID of the variant to plot
    var_id: Option<String>,

    /// Genotypes are phased
    #[arg(short = 'p', long = "phased")]
    phased: bool,
    /// Name of the environmental factor, used as axis label
    #[arg(short = 'n', long = "env_factor_name", default_value = "value")]
    env_factor_name: String,
    /// Statistic shown in the correlation plot
    #[arg(short = 's', long, value_enum, default_value_t = StatisticArg::All)]
    statistic: StatisticArg,
    /// Do not draw the trendline
    #[arg(short = 't', long = "no_trendline")]
    no_trendline: bool,
    /// Map latitude range
    #[arg(long, default_value = "-37,51", value_parser = parse_range, allow_hyphen_values = true)]
    lat: (i32, i32),
    /// Map longitude range
    #[arg(long, default_value = "-20,95", value_parser = parse_range, allow_hyphen_values = true)]
    lon: (i32, i32),
    /// Multiply raster values by this factor
    #[arg(short = 'f', long, default_value = "1", allow_hyphen_values = true)]
    factor: f64,
    /// Output directory
    #[arg(short = 'o', long, default_value = ".")]
    outdir: PathBuf,
    /// Figure format
    #[arg(long, value_enum, default_value_t = FormatArg::Pdf)]
    format: FormatArg,
    /// Correlation plot title
    #[arg(long, default_value = "Correlation")]
    title: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let (Some(vcf), Some(raster), Some(georef), Some(var_id)) =
        (cli.vcf_file, cli.raster_file, cli.georef_table, cli.var_id)
    else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut options = PlotOptions::new(vcf, raster, georef, var_id);
    options.phasing = Phasing::from_flag(cli.phased);
    options.env_factor_name = cli.env_factor_name;
    options.statistics = cli.statistic.statistics();
    options.trendline = !cli.no_trendline;
    options.lat = cli.lat;
    options.lon = cli.lon;
    options.factor = cli.factor;
    options.outdir = cli.outdir;
    options.format = cli.format.into();
    options.title = cli.title;

    eprintln!("Plotting variant {} from {:?}", options.variant_id, options.vcf);
    let report = run(&options)?;

    eprintln!("\n=== Run Summary ===");
    eprintln!("Samples:         {}", report.samples);
    eprintln!("Located:         {}", report.located);
    eprintln!("With value:      {}", report.valued);
    for file in &report.files {
        eprintln!("Wrote:           {}", file.display());
    }
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());

    if !report.is_success() {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|(statistic, reason)| format!("{} ({})", statistic, reason))
            .collect();
        anyhow::bail!("Failed statistics: {}", failed.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("-37,51"), Ok((-37, 51)));
        assert_eq!(parse_range(" -20 , 95 "), Ok((-20, 95)));
        assert_eq!(parse_range("-1.9,2.7"), Ok((-1, 2)));
        assert!(parse_range("10").is_err());
        assert!(parse_range("5,5").is_err());
        assert!(parse_range("a,1").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["geogenoplot", "a.vcf", "b.asc", "c.csv", "snp1"]);
        assert_eq!(cli.lat, (-37, 51));
        assert_eq!(cli.lon, (-20, 95));
        assert_eq!(cli.statistic.statistics(), Statistic::ALL.to_vec());
        assert_eq!(cli.env_factor_name, "value");
        assert!(!cli.phased && !cli.no_trendline);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "geogenoplot", "a.vcf", "b.asc", "c.csv", "snp1", "-p", "-t", "-s", "kruskal",
            "-n", "bio1", "--lat", "-10,10", "--format", "svg",
        ]);
        assert!(cli.phased && cli.no_trendline);
        assert_eq!(cli.statistic.statistics(), vec![Statistic::Kruskal]);
        assert_eq!(cli.lat, (-10, 10));
        assert_eq!(OutputFormat::from(cli.format), OutputFormat::Svg);
    }

    #[test]
    fn test_cli_missing_positionals_parse() {
        let cli = Cli::parse_from(["geogenoplot", "a.vcf"]);
        assert!(cli.raster_file.is_none() && cli.var_id.is_none());
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }
}
