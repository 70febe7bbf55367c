//! Legend layout: one swatch per color bucket plus an axis whose ticks sit
//! on the bucket boundaries.

use crate::color::Rgb;
use crate::scale::{ColorBucket, Scales};

#[derive(Clone, Debug, PartialEq)]
pub struct Swatch {
    pub lower: f64,
    pub upper: f64,
    /// Offset along the legend axis, in the position scale's units
    pub x: f64,
    pub width: f64,
    pub color: Rgb,
    pub opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub x: f64,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub swatches: Vec<Swatch>,
    pub ticks: Vec<Tick>,
}

pub fn tick_label(value: f64) -> String {
    format!("{value:.1}%")
}

/// Closed extent of a bucket: open ends fall back to the position domain
pub fn bucket_extent(bucket: &ColorBucket, domain: (f64, f64)) -> (f64, f64) {
    (bucket.lower.unwrap_or(domain.0), bucket.upper.unwrap_or(domain.1))
}

impl Legend {
    pub fn build(scales: &Scales, opacity: f64) -> Self {
        let position = &scales.position;
        let domain = position.domain();

        let swatches = scales
            .color
            .buckets()
            .iter()
            .map(|bucket| {
                let (lower, upper) = bucket_extent(bucket, domain);
                let x = position.apply(lower);
                Swatch {
                    lower,
                    upper,
                    x,
                    width: position.apply(upper) - x,
                    color: bucket.color,
                    opacity,
                }
            })
            .collect();

        let ticks = scales
            .color
            .thresholds()
            .iter()
            .map(|&value| Tick {
                value,
                x: position.apply(value),
                label: tick_label(value),
            })
            .collect();

        Self { swatches, ticks }
    }

    /// Rasterize into terminal columns. Expects a legend whose position range
    /// is `(0, width)`.
    pub fn columns(&self, width: usize) -> LegendColumns {
        let mut swatches = vec![None; width];
        for swatch in &self.swatches {
            let start = swatch.x.floor().max(0.0) as usize;
            let end = ((swatch.x + swatch.width).round() as usize).min(width).max(start + 1);
            for cell in swatches.iter_mut().take(end).skip(start) {
                *cell = Some((swatch.color, swatch.opacity));
            }
        }

        let mut ticks = Vec::with_capacity(self.ticks.len());
        let mut labels: [Vec<(usize, String)>; 2] = [Vec::new(), Vec::new()];
        for (i, tick) in self.ticks.iter().enumerate() {
            let col = (tick.x.round().max(0.0) as usize).min(width.saturating_sub(1));
            ticks.push(col);

            let len = tick.label.chars().count();
            if len > width {
                continue;
            }
            let start = col.saturating_sub(len / 2).min(width - len);
            let row = &mut labels[i % 2];
            let clear = row.last().map_or(true, |(prev, text)| prev + text.chars().count() < start);
            if clear {
                row.push((start, tick.label.clone()));
            }
        }

        LegendColumns {
            swatches,
            ticks,
            labels,
        }
    }
}

/// A legend laid out on a character grid
#[derive(Clone, Debug, PartialEq)]
pub struct LegendColumns {
    /// Color and opacity per column, `None` where no swatch covers it
    pub swatches: Vec<Option<(Rgb, f64)>>,
    pub ticks: Vec<usize>,
    /// Labels as (start column, text), staggered over two rows
    pub labels: [Vec<(usize, String)>; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::parse_palette;
    use crate::config::PALETTE;

    fn legend_for(metrics: &[f64], range: (f64, f64)) -> (Scales, Legend) {
        let palette = parse_palette(&PALETTE).unwrap();
        let scales = Scales::from_metrics(metrics.iter().copied(), &palette, range).unwrap();
        let legend = Legend::build(&scales, 0.8);
        (scales, legend)
    }

    #[test]
    fn test_swatches_cover_the_domain_without_gaps() {
        let metrics: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0).collect();
        let (_, legend) = legend_for(&metrics, (710.0, 960.0));
        assert_eq!(legend.swatches.len(), 9);
        assert_eq!(legend.swatches[0].lower, 10.0);
        assert_eq!(legend.swatches[0].x, 710.0);
        assert_eq!(legend.swatches[8].upper, 100.0);
        let last = &legend.swatches[8];
        assert!((last.x + last.width - 960.0).abs() < 1e-9);
        for pair in legend.swatches.windows(2) {
            assert!((pair[0].x + pair[0].width - pair[1].x).abs() < 1e-9);
            assert_eq!(pair[0].upper, pair[1].lower);
        }
    }

    #[test]
    fn test_ticks_sit_on_boundaries_with_percent_labels() {
        let metrics: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0).collect();
        let (scales, legend) = legend_for(&metrics, (0.0, 90.0));
        assert_eq!(legend.ticks.len(), 8);
        assert_eq!(legend.ticks[0].label, "20.0%");
        assert_eq!(legend.ticks[7].label, "90.0%");
        for tick in &legend.ticks {
            assert_eq!(tick.x, scales.position.apply(tick.value));
        }
        assert_eq!(tick_label(18.888), "18.9%");
    }

    #[test]
    fn test_swatch_midpoint_maps_back_to_its_color() {
        let (scales, legend) = legend_for(&[2.6, 41.0, 75.1], (0.0, 250.0));
        for swatch in &legend.swatches {
            let mid = (swatch.lower + swatch.upper) / 2.0;
            assert_eq!(scales.color.color_of(mid), swatch.color);
        }
    }

    #[test]
    fn test_degenerate_domain_yields_single_swatch() {
        let (scales, legend) = legend_for(&[42.0, 42.0, 42.0], (0.0, 250.0));
        assert_eq!(legend.swatches.len(), 1);
        let swatch = &legend.swatches[0];
        assert_eq!((swatch.lower, swatch.upper), (42.0, 42.0));
        assert_eq!(swatch.width, 0.0);
        assert!(swatch.x.is_finite());
        assert!(legend.ticks.is_empty());
        assert_eq!(swatch.color, *scales.color.colors().last().unwrap());

        let cols = legend.columns(40);
        assert_eq!(cols.swatches.iter().filter(|c| c.is_some()).count(), 1);
    }

    #[test]
    fn test_zero_is_a_real_lower_bound() {
        // A boundary at exactly zero must not be treated as missing.
        let (_, legend) = legend_for(&[-8.0, 10.0], (0.0, 18.0));
        let zero_edge = legend.swatches.iter().find(|s| s.lower == 0.0);
        assert!(zero_edge.is_some());
    }

    #[test]
    fn test_columns_fill_width_and_stagger_labels() {
        let metrics: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0).collect();
        let (_, legend) = legend_for(&metrics, (0.0, 60.0));
        let cols = legend.columns(60);
        assert!(cols.swatches.iter().all(|c| c.is_some()));
        assert_eq!(cols.ticks.len(), 8);
        assert!(cols.ticks.windows(2).all(|w| w[0] < w[1]));
        for row in &cols.labels {
            for pair in row.windows(2) {
                assert!(pair[0].0 + pair[0].1.len() < pair[1].0);
            }
            for (start, text) in row {
                assert!(start + text.len() <= 60);
            }
        }
        assert!(!cols.labels[0].is_empty() && !cols.labels[1].is_empty());
    }
}
