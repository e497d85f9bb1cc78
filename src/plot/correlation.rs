//! Genotype vs. environmental value plot
//!
//! Draws one box per genotype category with the individual samples jittered
//! on top. In unphased mode the categories are ordinal (alternate allele
//! dosage 0/1/2), so a trendline and a single association statistic are
//! added; phased categories carry no order and get the title only.

use crate::core::genotype::{dosage, Phasing};
use crate::core::stats::{linear_fit, BoxSummary, LinearFit, Statistic, TestResult};
use crate::core::{Result, SampleTable, StatsResult};
use crate::plot::output::{Figure, OutputFormat};
use crate::plot::theme::Theme;
use plotters::coord::Shift;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Half width of a box along the category axis
const BOX_HALF_WIDTH: f64 = 0.15;

/// Half width of the uniform strip jitter
const JITTER: f64 = 0.2;

/// Seed for the strip jitter so reruns draw identical figures
const JITTER_SEED: u64 = 0x6765_6f67;

/// Options for [`allele_corr_plot`]
#[derive(Debug, Clone)]
pub struct CorrelationOptions {
    pub ref_allele: Option<String>,
    pub alt_allele: Option<String>,
    pub phasing: Phasing,
    pub trendline: bool,
    pub statistic: Statistic,
    pub y_label: String,
    pub title: String,
    /// Figure size in pixels
    pub size: (u32, u32),
    pub theme: Theme,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            ref_allele: None,
            alt_allele: None,
            phasing: Phasing::Unphased,
            trendline: true,
            statistic: Statistic::Pearson,
            y_label: "Value".to_string(),
            title: "Correlation".to_string(),
            size: (400, 600),
            theme: Theme::default(),
        }
    }
}

impl CorrelationOptions {
    /// "Genotype (Ref: A, Alt: T)" when both alleles are known
    pub fn x_label(&self) -> String {
        match (&self.ref_allele, &self.alt_allele) {
            (Some(r), Some(a)) => format!("Genotype (Ref: {}, Alt: {})", r, a),
            _ => "Genotype".to_string(),
        }
    }
}

/// Plot input: values grouped by category in display order
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationData {
    pub phasing: Phasing,
    /// `groups[i]` holds the values of `phasing.categories()[i]`
    pub groups: Vec<Vec<f64>>,
    /// (category index, value) in table order
    pub points: Vec<(usize, f64)>,
}

impl CorrelationData {
    /// Keep rows with a categorized genotype and a value
    pub fn from_table(table: &SampleTable, phasing: Phasing) -> Self {
        let mut groups = vec![Vec::new(); phasing.categories().len()];
        let mut points = Vec::new();
        for obs in table.observations(phasing) {
            groups[obs.category].push(obs.value);
            points.push((obs.category, obs.value));
        }
        Self { phasing, groups, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dosage and value columns; phased categories have no dosage and are skipped
    pub fn dosage_pairs(&self) -> (Vec<f64>, Vec<f64>) {
        let categories = self.phasing.categories();
        self.points
            .iter()
            .filter_map(|(c, v)| dosage(categories[*c]).map(|d| (f64::from(d), *v)))
            .unzip()
    }
}

/// Numbers drawn into the figure besides the raw points
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationSummary {
    pub boxes: Vec<Option<BoxSummary>>,
    pub trendline: Option<LinearFit>,
    pub test: Option<TestResult>,
    pub subtitle: Option<String>,
}

/// Compute boxes, trendline and the requested statistic.
///
/// A trendline that cannot be fitted is dropped; a statistic that cannot be
/// computed is an error.
pub fn summarize(data: &CorrelationData, options: &CorrelationOptions) -> StatsResult<CorrelationSummary> {
    let boxes = data.groups.iter().map(|g| BoxSummary::from_values(g)).collect();

    if !data.phasing.is_ordinal() {
        return Ok(CorrelationSummary {
            boxes,
            trendline: None,
            test: None,
            subtitle: None,
        });
    }

    let (dosage, values) = data.dosage_pairs();

    let trendline = if options.trendline {
        match linear_fit(&dosage, &values) {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::debug!("Skipping trendline: {}", e);
                None
            }
        }
    } else {
        None
    };

    let test = options.statistic.compute(&dosage, &values)?;
    let subtitle = options.statistic.subtitle(&test);

    Ok(CorrelationSummary {
        boxes,
        trendline,
        test: Some(test),
        subtitle: Some(subtitle),
    })
}

/// A correlation figure and the numbers behind it
#[derive(Debug, Clone)]
pub struct CorrelationFigure {
    pub figure: Figure,
    pub data: CorrelationData,
    pub summary: CorrelationSummary,
}

/// Plot values against genotype categories, optionally saving the figure.
///
/// Rows with a missing value or genotype are dropped first. With nothing
/// left the figure is an empty frame (no statistic is attempted in phased
/// mode; in unphased mode the statistic reports too few observations).
pub fn allele_corr_plot(
    table: &SampleTable,
    options: &CorrelationOptions,
    save: Option<(&Path, OutputFormat)>,
) -> Result<CorrelationFigure> {
    let data = CorrelationData::from_table(table, options.phasing);
    let summary = summarize(&data, options)?;

    let figure = Figure::render(options.size, |root| {
        draw_correlation(root, &data, &summary, options)
    })?;

    if let Some((path, format)) = save {
        figure.save(path, format)?;
    }

    Ok(CorrelationFigure { figure, data, summary })
}

/// y range covering points, whiskers and trendline ends, padded by 5%
fn value_range(data: &CorrelationData, summary: &CorrelationSummary) -> (f64, f64) {
    let last = data.groups.len().saturating_sub(1) as f64;
    let trend = summary
        .trendline
        .iter()
        .flat_map(|fit| [fit.predict(0.0), fit.predict(last)]);

    let (lo, hi) = data
        .points
        .iter()
        .map(|(_, v)| *v)
        .chain(trend)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Label for an x tick; only whole positions inside the range are named
fn category_label(categories: &[&str], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    categories
        .get(rounded as usize)
        .map(|c| c.to_string())
        .unwrap_or_default()
}

fn draw_correlation<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &CorrelationData,
    summary: &CorrelationSummary,
    options: &CorrelationOptions,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let theme = &options.theme;
    let categories = data.phasing.categories();
    let n = categories.len();

    let titled = root.titled(&options.title, ("sans-serif", 18).into_font().color(&theme.text))?;
    let area = match &summary.subtitle {
        Some(subtitle) => titled.titled(subtitle, ("sans-serif", 12).into_font().color(&theme.text))?,
        None => titled,
    };

    let (y_min, y_max) = value_range(data, summary);
    let mut chart = ChartBuilder::on(&area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_min..y_max)?;

    let x_formatter = |x: &f64| category_label(categories, *x);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .x_label_formatter(&x_formatter)
        .x_desc(options.x_label())
        .y_desc(options.y_label.as_str())
        .x_label_style(("sans-serif", 12).into_font().color(&theme.text))
        .y_label_style(("sans-serif", 12).into_font().color(&theme.text))
        .axis_style(theme.axis)
        .draw()?;

    // Boxes without outliers
    for (i, entry) in summary.boxes.iter().enumerate() {
        let Some(b) = entry else { continue };
        let x = i as f64;
        let (left, right) = (x - BOX_HALF_WIDTH, x + BOX_HALF_WIDTH);
        let edge = theme.box_edge.stroke_width(1);

        chart.draw_series(std::iter::once(Rectangle::new(
            [(left, b.q1), (right, b.q3)],
            theme.box_fill.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new([(left, b.q1), (right, b.q3)], edge)))?;
        chart.draw_series(
            [
                vec![(left, b.median), (right, b.median)],
                vec![(x, b.whisker_low), (x, b.q1)],
                vec![(x, b.q3), (x, b.whisker_high)],
                vec![(x - BOX_HALF_WIDTH / 2.0, b.whisker_low), (x + BOX_HALF_WIDTH / 2.0, b.whisker_low)],
                vec![(x - BOX_HALF_WIDTH / 2.0, b.whisker_high), (x + BOX_HALF_WIDTH / 2.0, b.whisker_high)],
            ]
            .into_iter()
            .map(|segment| PathElement::new(segment, edge)),
        )?;
    }

    // Jittered strip
    let mut rng = StdRng::seed_from_u64(JITTER_SEED);
    let strip_style = theme.strip_points.mix(0.5).filled();
    chart.draw_series(data.points.iter().map(|(category, value)| {
        let x = *category as f64 + rng.gen_range(-JITTER..=JITTER);
        Circle::new((x, *value), 3, strip_style)
    }))?;

    if let Some(fit) = &summary.trendline {
        let last = (n - 1) as f64;
        chart.draw_series(LineSeries::new(
            vec![(0.0, fit.predict(0.0)), (last, fit.predict(last))],
            theme.trendline.stroke_width(2),
        ))?;
    }

    Ok(())
}
