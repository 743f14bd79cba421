use crate::error::ChartError;
use crate::table::Table;
use plotters::prelude::*;

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart, omitted when empty
    pub title: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 800,
            height: 400,
        }
    }
}

/// Creates a line chart of two numeric columns
///
/// Both columns are drawn as separate series against the row index, the
/// way a data-frame line chart plots the columns it is given. A missing
/// value breaks its series into separate segments. Passing the same column
/// twice draws it twice.
///
/// # Arguments
/// * `table` - Table containing the data
/// * `x` - Name of the first selected column
/// * `y` - Name of the second selected column
/// * `options` - Chart size and title
///
/// # Returns
/// * A Result containing the SVG document or an error
///
/// # Examples
/// ```
/// use growth_mindset::graph::{ChartOptions, line_chart};
/// use growth_mindset::loader::from_csv;
///
/// let table = from_csv(b"day,minutes\n1,20\n2,35\n3,30\n").unwrap();
/// let svg = line_chart(&table, "day", "minutes", &ChartOptions::default()).unwrap();
/// assert!(svg.contains("<svg"));
/// ```
pub fn line_chart(
    table: &Table,
    x: &str,
    y: &str,
    options: &ChartOptions,
) -> Result<String, ChartError> {
    let rows = table.row_count();
    if rows == 0 {
        return Err(ChartError::NoRows);
    }

    let first = series(table, x)?;
    let second = series(table, y)?;

    let (min_y, max_y) = value_bounds(first.iter().chain(second.iter()));
    let max_x = rows.saturating_sub(1).max(1) as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut builder = ChartBuilder::on(&root);
        if !options.title.is_empty() {
            builder.caption(&options.title, ("sans-serif", 20).into_font());
        }
        let mut chart = builder
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..max_x, min_y..max_y)
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .x_desc("row")
            .draw()
            .map_err(render_error)?;

        for (name, values, color) in [(x, &first, BLUE), (y, &second, RED)] {
            for segment in segments(values) {
                chart
                    .draw_series(LineSeries::new(segment, color.stroke_width(2)))
                    .map_err(render_error)?;
            }

            // Empty series carrying the legend entry for this column
            chart
                .draw_series(LineSeries::new(
                    std::iter::empty::<(f64, f64)>(),
                    color.stroke_width(2),
                ))
                .map_err(render_error)?
                .label(name)
                .legend(move |(lx, ly)| {
                    PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
    }

    Ok(svg)
}

fn series(table: &Table, name: &str) -> Result<Vec<Option<f64>>, ChartError> {
    let column = table
        .column(name)
        .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
    if !column.is_numeric() {
        return Err(ChartError::NotNumeric(name.to_string()));
    }
    Ok(table.numeric_series(name).unwrap_or_default())
}

/// Split a series into runs of consecutive present values, as (row, value)
/// points.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (row, value) in values.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => current.push((row as f64, *v)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Y-axis bounds over all finite values, widened when the data is flat or
/// absent so the axis range is never empty.
fn value_bounds<'a>(values: impl Iterator<Item = &'a Option<f64>>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for v in values.flatten().filter(|v| v.is_finite()) {
        min = min.min(*v);
        max = max.max(*v);
    }

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    (min, max)
}

fn render_error(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}
