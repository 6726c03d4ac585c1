//! Histogram rendering to PNG.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use da_core::extract;
use indexmap::IndexMap;
use plotters::prelude::*;
use statrs::statistics::Statistics;

use crate::RenderError;

/// Bar fill matching the analyst client's plot styling.
const BAR_COLOR: RGBColor = RGBColor(92, 140, 97);

/// Configuration for histogram rendering
#[derive(Clone)]
pub struct HistogramConfig {
    /// Number of bins for numeric columns
    pub bins: usize,

    /// Canvas size in pixels
    pub width: u32,
    pub height: u32,

    /// Whether to overlay a smoothed density curve
    pub show_density: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        // 10x6 inches at 100 dpi.
        Self {
            bins: 30,
            width: 1000,
            height: 600,
            show_density: true,
        }
    }
}

struct Bin {
    start: f64,
    end: f64,
    count: usize,
}

/// Render a single-column histogram to `out_path`.
///
/// The column must exist in the table; if it does not, this fails with
/// `ColumnNotFound` before any file is created. Numeric columns get
/// fixed-width frequency bins with an optional Gaussian-KDE overlay;
/// any other column falls back to frequency-count-per-category bars.
pub fn render_histogram(
    batch: &RecordBatch,
    column: &str,
    out_path: &Path,
    config: &HistogramConfig,
) -> Result<(), RenderError> {
    let array = batch
        .column_by_name(column)
        .ok_or_else(|| RenderError::ColumnNotFound(column.to_string()))?;

    match extract::numeric_values(array.as_ref()) {
        Some(values) if !values.is_empty() => {
            render_numeric(&values, column, out_path, config)
        }
        _ => {
            let values = extract::string_values(array.as_ref());
            render_categorical(&values, column, out_path, config)
        }
    }
}

fn render_numeric(
    values: &[f64],
    column: &str,
    out_path: &Path,
    config: &HistogramConfig,
) -> Result<(), RenderError> {
    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        // A single distinct value still needs a non-degenerate axis.
        min -= 0.5;
        max += 0.5;
    }

    let num_bins = config.bins.max(1);
    let bin_width = (max - min) / num_bins as f64;
    let mut bins = Vec::with_capacity(num_bins);
    for i in 0..num_bins {
        let start = min + i as f64 * bin_width;
        let end = start + bin_width;
        let count = values
            .iter()
            .filter(|&&v| {
                if i == num_bins - 1 {
                    v >= start && v <= end
                } else {
                    v >= start && v < end
                }
            })
            .count();
        bins.push(Bin { start, end, count });
    }

    let density_curve = if config.show_density {
        kde_curve(values, min, max)
    } else {
        Vec::new()
    };

    // The KDE is a probability density; scale it into count space so both
    // series share one y axis.
    let count_scale = values.len() as f64 * bin_width;
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let max_curve = density_curve
        .iter()
        .map(|&(_, d)| d * count_scale)
        .fold(0.0, f64::max);
    let y_max = (max_count.max(max_curve) * 1.05).max(1.0);

    let root = BitMapBackend::new(out_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(column, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(min..max, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Count")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                BAR_COLOR.mix(0.8).filled(),
            )
        }))
        .map_err(plot_err)?;

    if !density_curve.is_empty() {
        chart
            .draw_series(LineSeries::new(
                density_curve
                    .iter()
                    .map(|&(x, d)| (x, d * count_scale)),
                RED.stroke_width(2),
            ))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    tracing::debug!(column, bins = num_bins, "rendered numeric histogram");
    Ok(())
}

fn render_categorical(
    values: &[String],
    column: &str,
    out_path: &Path,
    config: &HistogramConfig,
) -> Result<(), RenderError> {
    // Frequency per distinct value, in first-seen order.
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value.clone()).or_insert(0) += 1;
    }

    let labels: Vec<String> = counts.keys().cloned().collect();
    let max_count = counts.values().copied().max().unwrap_or(0) as f64;
    let x_max = counts.len().max(1) as f64;
    let y_max = (max_count * 1.05).max(1.0);

    let root = BitMapBackend::new(out_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(column, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len().clamp(1, 20))
        .x_label_formatter(&|x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .x_desc(column)
        .y_desc("Count")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(counts.values().enumerate().map(|(i, &count)| {
            Rectangle::new(
                [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, count as f64)],
                BAR_COLOR.mix(0.8).filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    tracing::debug!(
        column,
        categories = counts.len(),
        "rendered categorical histogram"
    );
    Ok(())
}

/// Gaussian kernel density estimate over [min, max].
fn kde_curve(values: &[f64], min: f64, max: f64) -> Vec<(f64, f64)> {
    let std_dev = values.iter().std_dev();
    // Silverman's rule of thumb.
    let bandwidth = 1.06 * std_dev * (values.len() as f64).powf(-0.2);
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Vec::new();
    }

    let num_points = 100;
    let mut curve = Vec::with_capacity(num_points + 1);
    for i in 0..=num_points {
        let x = min + (max - min) * i as f64 / num_points as f64;
        let mut density = 0.0;
        for &value in values {
            let u = (x - value) / bandwidth;
            density += (-0.5_f64 * u * u).exp() / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth);
        }
        density /= values.len() as f64;
        curve.push((x, density));
    }
    curve
}

fn plot_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Plot(e.to_string())
}
