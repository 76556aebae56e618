//! Shaping of backend series for terminal rendering: axis bounds, label
//! thinning, heatmap coloring and radar scaling. Pure functions, no
//! drawing here.

use once_cell::sync::Lazy;
use ratatui::style::Color;

use crate::api::RadarMetrics;

/// Radar axes in display order. `percent` axes are fractions scaled to
/// 0-100; ratio axes are capped at 5 and stretched onto the same scale so
/// the axes are comparable.
pub static RADAR_AXES: Lazy<Vec<RadarAxis>> = Lazy::new(|| {
    vec![
        RadarAxis::percent("CAGR"),
        RadarAxis::percent("Volatility"),
        RadarAxis::ratio("Sharpe Ratio"),
        RadarAxis::ratio("Sortino Ratio"),
        RadarAxis::ratio("Calmar Ratio"),
        RadarAxis::percent("Max Drawdown"),
        RadarAxis::percent("Win Rate"),
    ]
});

#[derive(Debug, Clone, Copy)]
pub struct RadarAxis {
    pub label: &'static str,
    pub percent: bool,
}

impl RadarAxis {
    const fn percent(label: &'static str) -> Self {
        RadarAxis {
            label,
            percent: true,
        }
    }

    const fn ratio(label: &'static str) -> Self {
        RadarAxis {
            label,
            percent: false,
        }
    }

    pub fn scale(&self, value: f64) -> f64 {
        if self.percent {
            (value.abs() * 100.0).clamp(0.0, 100.0)
        } else {
            value.clamp(0.0, 5.0) * 20.0
        }
    }
}

/// One 0-100 value per [`RADAR_AXES`] entry. Drawdowns are folded to their
/// magnitude so "less is better" axes still render as a filled bar.
pub fn radar_axis_values(metrics: &RadarMetrics) -> Vec<f64> {
    let raw = [
        metrics.cagr,
        metrics.volatility,
        metrics.sharpe,
        metrics.sortino,
        metrics.calmar,
        metrics.max_drawdown,
        metrics.win_rate,
    ];
    RADAR_AXES
        .iter()
        .zip(raw)
        .map(|(axis, value)| axis.scale(value))
        .collect()
}

/// Series values paired with their index for the ratatui `Chart` widget.
pub fn series_points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

/// Y-axis bounds over any number of series, padded by 5% of the span so
/// the extremes do not sit on the border. Degenerates gracefully for
/// empty or flat input.
pub fn y_bounds(series: &[&[f64]]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for values in series {
        for v in *values {
            min = min.min(*v);
            max = max.max(*v);
        }
    }
    if min > max {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// First, middle and last label of a dense date axis; the terminal has no
/// room for more.
pub fn x_axis_labels(labels: &[String]) -> Vec<String> {
    let pick: Vec<&String> = match labels.len() {
        0 => vec![],
        1 => vec![&labels[0]],
        2 => vec![&labels[0], &labels[1]],
        n => vec![&labels[0], &labels[n / 2], &labels[n - 1]],
    };
    pick.into_iter().map(|l| short_date_label(l)).collect()
}

/// Compress an ISO date label ("2015-01-02") to "Jan 2015" for axis
/// display. Anything that is not an ISO date passes through unchanged.
pub fn short_date_label(label: &str) -> String {
    match chrono::NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        Ok(date) => date.format("%b %Y").to_string(),
        Err(_) => label.to_string(),
    }
}

/// Keep roughly `max_points` evenly spaced samples of a long series. The
/// last point is always kept so the chart ends on the latest value.
pub fn downsample(values: &[f64], max_points: usize) -> Vec<f64> {
    if max_points == 0 || values.len() <= max_points {
        return values.to_vec();
    }
    let step = values.len().div_ceil(max_points);
    let mut sampled: Vec<f64> = values.iter().copied().step_by(step).collect();
    if let Some(last) = values.last() {
        if sampled.last() != Some(last) {
            sampled.push(*last);
        }
    }
    sampled
}

/// Cell color for one monthly return. Stronger moves get the brighter
/// shade; the dead zone around zero stays neutral.
pub fn heatmap_color(value: f64) -> Color {
    if value >= 0.05 {
        Color::LightGreen
    } else if value > 0.005 {
        Color::Green
    } else if value > -0.005 {
        Color::DarkGray
    } else if value > -0.05 {
        Color::Red
    } else {
        Color::LightRed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_the_extremes() {
        let (lo, hi) = y_bounds(&[&[1.0, 2.0], &[0.0, 3.0]]);
        assert!(lo < 0.0 && lo > -0.2);
        assert!(hi > 3.0 && hi < 3.2);
    }

    #[test]
    fn bounds_handle_empty_and_flat_series() {
        assert_eq!(y_bounds(&[]), (0.0, 1.0));
        assert_eq!(y_bounds(&[&[]]), (0.0, 1.0));
        let (lo, hi) = y_bounds(&[&[2.0, 2.0]]);
        assert_eq!((lo, hi), (1.0, 3.0));
    }

    #[test]
    fn x_labels_thin_to_three() {
        let labels: Vec<String> = (0..9).map(|i| format!("2015-0{}", i + 1)).collect();
        let picked = x_axis_labels(&labels);
        assert_eq!(picked, vec!["2015-01", "2015-05", "2015-09"]);
        assert!(x_axis_labels(&[]).is_empty());
    }

    #[test]
    fn iso_date_labels_are_shortened() {
        assert_eq!(short_date_label("2015-01-02"), "Jan 2015");
        assert_eq!(short_date_label("not a date"), "not a date");
        let labels = vec!["2015-01-02".to_string(), "2024-12-30".to_string()];
        assert_eq!(x_axis_labels(&labels), vec!["Jan 2015", "Dec 2024"]);
    }

    #[test]
    fn downsample_keeps_the_last_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let sampled = downsample(&values, 10);
        assert!(sampled.len() <= 11);
        assert_eq!(*sampled.last().unwrap(), 99.0);

        // short series pass through untouched
        assert_eq!(downsample(&[1.0, 2.0], 10), vec![1.0, 2.0]);
    }

    #[test]
    fn heatmap_buckets_by_magnitude() {
        assert_eq!(heatmap_color(0.08), Color::LightGreen);
        assert_eq!(heatmap_color(0.02), Color::Green);
        assert_eq!(heatmap_color(0.0), Color::DarkGray);
        assert_eq!(heatmap_color(-0.02), Color::Red);
        assert_eq!(heatmap_color(-0.08), Color::LightRed);
    }

    #[test]
    fn radar_scaling_caps_ratios_and_folds_drawdown() {
        let metrics = RadarMetrics {
            cagr: 0.15,
            volatility: 0.27,
            sharpe: 7.0,
            sortino: 1.5,
            calmar: 0.5,
            max_drawdown: -0.35,
            win_rate: 0.54,
        };
        let values = radar_axis_values(&metrics);
        assert_eq!(values.len(), RADAR_AXES.len());
        assert!((values[0] - 15.0).abs() < 1e-9);
        assert_eq!(values[2], 100.0); // sharpe capped at 5 -> 100
        assert!((values[3] - 30.0).abs() < 1e-9);
        assert!((values[5] - 35.0).abs() < 1e-9); // |−35%|
    }
}
