/// Bar chart of the first two numeric columns, drawn to SVG with plotters.

use crate::error::{Result, SweepError};
use crate::table::Table;
use plotters::prelude::*;
use serde::Serialize;

pub const NOT_ENOUGH_NUMERIC_COLUMNS: &str = "Not enough numeric columns to create a bar chart.";

const CHART_WIDTH: u32 = 900;
const CHART_HEIGHT: u32 = 420;
const SERIES_COLORS: [RGBColor; 2] = [RGBColor(31, 119, 180), RGBColor(255, 127, 14)];

/// One bar series: a column name and its values by row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Values to plot, indexed by row number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartData {
    pub series: [Series; 2],
    /// Rows in the table before the row limit was applied.
    pub total_rows: usize,
}

impl BarChartData {
    pub fn len(&self) -> usize {
        self.series[0].values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.len() < self.total_rows
    }

    /// Y range covering every bar and the zero baseline.
    fn value_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .filter(|v| v.is_finite())
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if hi - lo < f64::EPSILON {
            (lo, lo + 1.0)
        } else {
            let pad = (hi - lo) * 0.05;
            (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
        }
    }
}

/// What the chart section shows for a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Hidden,
    Rendered {
        columns: Vec<String>,
        rows_plotted: usize,
        total_rows: usize,
        svg: String,
    },
    NotEnoughNumericColumns {
        numeric_columns: usize,
        warning: String,
    },
}

/// Pick the first two numeric columns. `None` when fewer than two exist.
pub fn plan_bar_chart(table: &Table, row_limit: usize) -> Option<BarChartData> {
    let numeric: Vec<_> = table
        .columns()
        .iter()
        .filter(|c| c.column_type().is_numeric())
        .take(2)
        .collect();
    if numeric.len() < 2 {
        return None;
    }

    let rows = table.len().min(row_limit);
    let series = |idx: usize| Series {
        name: numeric[idx].name().to_string(),
        values: (0..rows).map(|row| numeric[idx].get_f64(row)).collect(),
    };

    Some(BarChartData {
        series: [series(0), series(1)],
        total_rows: table.len(),
    })
}

fn chart_err<E: std::fmt::Display>(e: E) -> SweepError {
    SweepError::Chart(e.to_string())
}

/// Grouped bars, one pair per row, as an SVG document.
pub fn render_svg(chart: &BarChartData) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let (y_min, y_max) = chart.value_range();
        let x_max = chart.len().max(1) as f64;
        let mut ctx = ChartBuilder::on(&root)
            .margin(16)
            .x_label_area_size(36)
            .y_label_area_size(56)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)
            .map_err(chart_err)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(chart.len().clamp(1, 12))
            .x_label_formatter(&|x| format!("{}", x.floor() as i64))
            .x_desc("row")
            .draw()
            .map_err(chart_err)?;

        let bar_width = 0.4;
        for (idx, series) in chart.series.iter().enumerate() {
            let color = SERIES_COLORS[idx];
            let offset = 0.1 + idx as f64 * bar_width;
            ctx.draw_series(series.values.iter().enumerate().filter_map(|(row, value)| {
                value.filter(|v| v.is_finite()).map(|v| {
                    let x0 = row as f64 + offset;
                    Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled())
                })
            }))
            .map_err(chart_err)?
            .label(series.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }

        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

/// Chart section for a table: a rendered chart, or the warning when fewer
/// than two numeric columns remain.
pub fn chart_outcome(table: &Table, row_limit: usize) -> Result<ChartOutcome> {
    match plan_bar_chart(table, row_limit) {
        Some(chart) => Ok(ChartOutcome::Rendered {
            columns: chart.series.iter().map(|s| s.name.clone()).collect(),
            rows_plotted: chart.len(),
            total_rows: chart.total_rows,
            svg: render_svg(&chart)?,
        }),
        None => Ok(ChartOutcome::NotEnoughNumericColumns {
            numeric_columns: table.schema().numeric_column_names().len(),
            warning: NOT_ENOUGH_NUMERIC_COLUMNS.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnType, ColumnValue};
    use crate::table::Schema;

    fn table_with(types: &[(&str, ColumnType)], rows: Vec<Vec<ColumnValue>>) -> Table {
        let schema = Schema::new(types.iter().map(|(n, t)| (n.to_string(), *t)).collect());
        let mut table = Table::new("t".to_string(), schema);
        for row in rows {
            table.append_row(row).unwrap();
        }
        table
    }

    #[test]
    fn test_gating_needs_two_numeric_columns() {
        let table = table_with(
            &[("label", ColumnType::String), ("n", ColumnType::Int64)],
            vec![vec![ColumnValue::String("a".to_string()), ColumnValue::Int64(1)]],
        );
        assert!(plan_bar_chart(&table, 100).is_none());

        match chart_outcome(&table, 100).unwrap() {
            ChartOutcome::NotEnoughNumericColumns { numeric_columns, warning } => {
                assert_eq!(numeric_columns, 1);
                assert_eq!(warning, NOT_ENOUGH_NUMERIC_COLUMNS);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_picks_first_two_numeric_columns() {
        let table = table_with(
            &[
                ("label", ColumnType::String),
                ("a", ColumnType::Float64),
                ("b", ColumnType::Int64),
                ("c", ColumnType::Int64),
            ],
            vec![
                vec![
                    ColumnValue::String("x".to_string()),
                    ColumnValue::Float64(1.5),
                    ColumnValue::Int64(2),
                    ColumnValue::Int64(9),
                ],
                vec![
                    ColumnValue::String("y".to_string()),
                    ColumnValue::Null,
                    ColumnValue::Int64(-4),
                    ColumnValue::Int64(9),
                ],
            ],
        );

        let chart = plan_bar_chart(&table, 100).unwrap();
        assert_eq!(chart.series[0].name, "a");
        assert_eq!(chart.series[1].name, "b");
        assert_eq!(chart.series[0].values, vec![Some(1.5), None]);
        assert_eq!(chart.series[1].values, vec![Some(2.0), Some(-4.0)]);
        assert!(!chart.is_truncated());
    }

    #[test]
    fn test_row_limit() {
        let rows = (0..10)
            .map(|i| vec![ColumnValue::Int64(i), ColumnValue::Int64(i * 2)])
            .collect();
        let table = table_with(&[("a", ColumnType::Int64), ("b", ColumnType::Int64)], rows);

        let chart = plan_bar_chart(&table, 4).unwrap();
        assert_eq!(chart.len(), 4);
        assert_eq!(chart.total_rows, 10);
        assert!(chart.is_truncated());
    }

    #[test]
    fn test_render_svg() {
        let table = table_with(
            &[("a", ColumnType::Int64), ("b", ColumnType::Float64)],
            vec![
                vec![ColumnValue::Int64(3), ColumnValue::Float64(1.25)],
                vec![ColumnValue::Int64(5), ColumnValue::Null],
            ],
        );

        match chart_outcome(&table, 100).unwrap() {
            ChartOutcome::Rendered { columns, rows_plotted, svg, .. } => {
                assert_eq!(columns, vec!["a", "b"]);
                assert_eq!(rows_plotted, 2);
                assert!(svg.contains("<svg"));
                assert!(svg.contains("<rect"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_render_empty_table() {
        let table = table_with(&[("a", ColumnType::Int64), ("b", ColumnType::Int64)], vec![]);
        let chart = plan_bar_chart(&table, 100).unwrap();
        assert!(chart.is_empty());
        assert!(render_svg(&chart).is_ok());
    }
}
