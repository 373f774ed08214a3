//! # ASCII Tide Chart
//!
//! Renders a predicted single-location series as a terminal chart for the
//! `otps2-predict predict --ascii` command. One column per sample (series
//! longer than [`MAX_COLUMNS`] are thinned), heights on the Y axis, the
//! highest sample marked `H` and the lowest `L`.

use crate::time_grid::TimeGrid;
use std::fmt::Write;

/// Chart height in text rows
const ROWS: usize = 20;

/// Space for Y-axis labels, including the axis line
const Y_AXIS_WIDTH: usize = 7;

/// Widest plotted series; longer series keep every k-th sample
pub const MAX_COLUMNS: usize = 120;

/// Format a height label with an explicit sign and sensible precision
fn format_height(height: f64) -> String {
    if height == 0.0 {
        " 0".to_string()
    } else if height.fract() == 0.0 {
        format!("{:+.0}", height)
    } else {
        format!("{:+.2}", height)
    }
}

/// Indices of the samples that get a column
fn plotted_indices(len: usize) -> Vec<usize> {
    let stride = len.div_ceil(MAX_COLUMNS).max(1);
    (0..len).step_by(stride).collect()
}

/// Render `heights`, sampled on `grid`, as a multi-line string.
///
/// Returns an empty string for an empty series.
pub fn render_ascii(grid: &TimeGrid, heights: &[f64]) -> String {
    if heights.is_empty() {
        return String::new();
    }

    let columns = plotted_indices(heights.len());
    let (min, max) = heights
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &h| {
            (min.min(h), max.max(h))
        });
    let range = if max > min { max - min } else { 1.0 };

    let height_to_row = |h: f64| {
        let normalized = (h - min) / range;
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut chart = vec![vec![' '; columns.len() + Y_AXIS_WIDTH]; ROWS];

    // Y-axis: top, middle and bottom labels
    for value in [max, (min + max) / 2.0, min] {
        let row = height_to_row(value).min(ROWS - 1);
        let label = format!("{:>width$}", format_height(value), width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            chart[row][i] = ch;
        }
    }
    for row in chart.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    let highest = columns
        .iter()
        .copied()
        .max_by(|&a, &b| heights[a].total_cmp(&heights[b]));
    let lowest = columns
        .iter()
        .copied()
        .min_by(|&a, &b| heights[a].total_cmp(&heights[b]));

    for (column, &index) in columns.iter().enumerate() {
        let row = height_to_row(heights[index]).min(ROWS - 1);
        chart[row][column + Y_AXIS_WIDTH] = if Some(index) == highest {
            'H'
        } else if Some(index) == lowest {
            'L'
        } else {
            '•'
        };
    }

    let mut out = String::new();
    for row in chart {
        let line: String = row.into_iter().collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }

    // Time markers below the chart, one every ten columns
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let markers: String = (0..columns.len())
        .map(|i| if i % 10 == 0 { '|' } else { ' ' })
        .collect();
    let _ = writeln!(out, "{}{}", padding, markers.trim_end());

    let label = |i: usize| {
        grid.timestamp(i)
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    };
    let first = label(columns[0]);
    let last = label(columns[columns.len() - 1]);
    let gap = (columns.len() + 1).saturating_sub(first.len() + last.len()).max(2);
    let _ = writeln!(out, "{}{}{}{}", padding, first, " ".repeat(gap), last);

    out
}

/// Print the chart to stdout.
pub fn draw_ascii(grid: &TimeGrid, heights: &[f64]) {
    print!("{}", render_ascii(grid, heights));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_grid(ntime: usize) -> TimeGrid {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TimeGrid::new(start, ntime, 600.0).unwrap()
    }

    fn semidiurnal(ntime: usize) -> Vec<f64> {
        (0..ntime)
            .map(|i| (i as f64 * 600.0 / 44_712.0 * std::f64::consts::TAU).sin())
            .collect()
    }

    #[test]
    fn test_format_height() {
        assert_eq!(format_height(0.0), " 0");
        assert_eq!(format_height(1.0), "+1");
        assert_eq!(format_height(1.25), "+1.25");
        assert_eq!(format_height(-2.0), "-2");
        assert_eq!(format_height(-0.5), "-0.50");
    }

    #[test]
    fn test_ascii_rendering_marks_extremes() {
        let heights = semidiurnal(145);
        let chart = render_ascii(&test_grid(145), &heights);

        assert_eq!(chart.matches('H').count(), 1);
        assert_eq!(chart.matches('L').count(), 1);
        assert!(chart.contains("2020-01-01 00:00"));
        // chart rows + marker row + label row
        assert_eq!(chart.lines().count(), ROWS + 2);
    }

    #[test]
    fn test_long_series_is_thinned() {
        let columns = plotted_indices(1000);
        assert!(columns.len() <= MAX_COLUMNS);
        assert_eq!(columns[0], 0);

        let short = plotted_indices(10);
        assert_eq!(short, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_flat_series_renders() {
        let chart = render_ascii(&test_grid(5), &[1.5; 5]);
        assert!(!chart.is_empty());
    }

    #[test]
    fn test_empty_series_renders_nothing() {
        assert!(render_ascii(&test_grid(1), &[]).is_empty());
    }
}
