//! Geographic scatter map of samples
//!
//! Samples are drawn at (longitude, latitude) in a plain lon/lat frame whose
//! bounds come from the caller, not from the data. Each genotype category
//! gets one color and one legend entry in display order; marker radius grows
//! with the environmental value.

use crate::core::genotype::Phasing;
use crate::core::{PlotError, PlotResult, SampleTable};
use crate::plot::output::Figure;
use crate::plot::theme::Theme;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Options for [`scatter_map_plot`]
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub title: String,
    /// Name of the environmental value, shown with its range
    pub value_label: String,
    /// Longitude bounds (west, east)
    pub lon: (i32, i32),
    /// Latitude bounds (south, north)
    pub lat: (i32, i32),
    /// Category vocabulary and display order
    pub phasing: Phasing,
    /// Largest marker radius in pixels; the smallest is a quarter of it
    pub point_size: f64,
    pub size: (u32, u32),
    pub theme: Theme,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: "Samples".to_string(),
            value_label: "value".to_string(),
            lon: (-20, 95),
            lat: (-37, 51),
            phasing: Phasing::Phased,
            point_size: 8.0,
            size: (1500, 800),
            theme: Theme::default(),
        }
    }
}

/// One located sample on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub value: Option<f64>,
}

/// Points grouped by category in display order
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    pub series: Vec<Vec<MapPoint>>,
    /// (min, max) over the values of plotted points
    pub value_range: Option<(f64, f64)>,
}

impl MapData {
    /// Keep located rows with a categorized genotype inside the bounds
    pub fn from_table(table: &SampleTable, options: &MapOptions) -> Self {
        let (west, east) = (options.lon.0 as f64, options.lon.1 as f64);
        let (south, north) = (options.lat.0 as f64, options.lat.1 as f64);

        let mut series = vec![Vec::new(); options.phasing.categories().len()];
        for record in table.records() {
            let Some((latitude, longitude)) = record.coordinates() else { continue };
            let Some(category) = record
                .genotype
                .as_deref()
                .and_then(|g| options.phasing.category_index(g))
            else {
                continue;
            };
            if longitude < west || longitude > east || latitude < south || latitude > north {
                continue;
            }
            series[category].push(MapPoint {
                longitude,
                latitude,
                value: record.value.filter(|v| !v.is_nan()),
            });
        }

        let value_range = series
            .iter()
            .flatten()
            .filter_map(|p| p.value)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });

        Self { series, value_range }
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(Vec::len).sum()
    }

    /// Marker radius for `value`: a quarter of `max` for missing values or
    /// the range minimum, `max` for the range maximum
    pub fn radius(&self, value: Option<f64>, max: f64) -> f64 {
        let min = max / 4.0;
        match (value, self.value_range) {
            (Some(v), Some((lo, hi))) if hi > lo => min + (max - min) * (v - lo) / (hi - lo),
            (Some(_), Some(_)) => (min + max) / 2.0,
            _ => min,
        }
    }
}

/// Draw the sample map.
///
/// Bounds must be increasing; rows without coordinates, without a
/// categorized genotype or outside the bounds are not drawn.
pub fn scatter_map_plot(table: &SampleTable, options: &MapOptions) -> PlotResult<Figure> {
    if options.lon.0 >= options.lon.1 || options.lat.0 >= options.lat.1 {
        return Err(PlotError::Draw(format!(
            "invalid map bounds: lon {:?}, lat {:?}",
            options.lon, options.lat
        )));
    }

    let data = MapData::from_table(table, options);
    log::debug!("Map: {} of {} samples inside bounds", data.point_count(), table.len());

    Figure::render(options.size, |root| draw_map(root, &data, options))
}

fn value_caption(label: &str, range: Option<(f64, f64)>) -> String {
    match range {
        Some((lo, hi)) => format!("{} range: {:.3} to {:.3}", label, lo, hi),
        None => format!("{}: no values", label),
    }
}

fn draw_map<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &MapData,
    options: &MapOptions,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let theme = &options.theme;
    let font = |size: u32| ("sans-serif", size).into_font().color(&theme.text);

    let area = root.titled(&options.title, font(20))?;
    let area = area.titled(&value_caption(&options.value_label, data.value_range), font(13))?;

    let (west, east) = (options.lon.0 as f64, options.lon.1 as f64);
    let (south, north) = (options.lat.0 as f64, options.lat.1 as f64);

    let mut chart = ChartBuilder::on(&area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(west..east, south..north)?;

    chart
        .configure_mesh()
        .light_line_style(TRANSPARENT)
        .bold_line_style(theme.graticule.stroke_width(1))
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_label_style(font(12))
        .y_label_style(font(12))
        .axis_style(theme.axis)
        .draw()?;

    let max_radius = options.point_size;
    for (index, (category, points)) in options
        .phasing
        .categories()
        .iter()
        .zip(&data.series)
        .enumerate()
    {
        let color = theme.category_color(index);
        let style = color.mix(0.8).filled();
        chart
            .draw_series(points.iter().map(|p| {
                Circle::new((p.longitude, p.latitude), data.radius(p.value, max_radius), style)
            }))?
            .label(*category)
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(theme.axis)
        .label_font(font(12))
        .draw()?;

    Ok(())
}
