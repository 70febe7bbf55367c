//! Position and color scales derived from the metric extent.
//!
//! The color scale is a threshold scale: `palette.len()` equal-width buckets
//! over `[min, max]`, with the first bucket open below and the last open
//! above. A value sitting exactly on a boundary belongs to the upper bucket.

use crate::color::Rgb;
use crate::data::StatisticRecord;
use anyhow::{bail, Result};

/// Linear map from a metric domain to a pixel range, clamped to the domain
#[derive(Clone, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Same domain, different output range (terminal resize)
    pub fn with_range(&self, range: (f64, f64)) -> Self {
        Self::new(self.domain, range)
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return r0;
        }
        let t = ((value - d0) / span).clamp(0.0, 1.0);
        r0 + t * (r1 - r0)
    }
}

/// One interval of the threshold scale; `None` bounds are unbounded
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorBucket {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdScale {
    thresholds: Vec<f64>,
    colors: Vec<Rgb>,
}

impl ThresholdScale {
    /// Equal-width buckets over `[min, max]`, one per palette color.
    /// A zero-width extent collapses to a single bucket holding the last color.
    pub fn equal_width(min: f64, max: f64, palette: &[Rgb]) -> Result<Self> {
        let Some(&last) = palette.last() else {
            bail!("color palette is empty");
        };

        let count = palette.len();
        let step = (max - min) / count as f64;
        if step == 0.0 || count == 1 {
            return Ok(Self {
                thresholds: Vec::new(),
                colors: vec![last],
            });
        }

        let thresholds = (1..count).map(|k| min + step * k as f64).collect();
        Ok(Self {
            thresholds,
            colors: palette.to_vec(),
        })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Colors in use, lowest bucket first
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn bucket_count(&self) -> usize {
        self.colors.len()
    }

    /// Index of the bucket holding `value`
    pub fn bucket_of(&self, value: f64) -> usize {
        self.thresholds.partition_point(|&t| t <= value)
    }

    pub fn color_of(&self, value: f64) -> Rgb {
        self.colors[self.bucket_of(value)]
    }

    /// Input interval that maps to `color`, or `None` if the color is not in use
    pub fn invert_extent(&self, color: Rgb) -> Option<(Option<f64>, Option<f64>)> {
        let idx = self.colors.iter().position(|&c| c == color)?;
        let lower = idx.checked_sub(1).map(|i| self.thresholds[i]);
        let upper = self.thresholds.get(idx).copied();
        Some((lower, upper))
    }

    pub fn buckets(&self) -> Vec<ColorBucket> {
        self.colors
            .iter()
            .filter_map(|&color| {
                let (lower, upper) = self.invert_extent(color)?;
                Some(ColorBucket { lower, upper, color })
            })
            .collect()
    }
}

/// Min and max of the metrics, or `None` when there are none
pub fn metric_extent(metrics: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    metrics.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Color scale plus the legend's position scale, sharing one metric domain
#[derive(Clone, Debug, PartialEq)]
pub struct Scales {
    pub min: f64,
    pub max: f64,
    pub position: LinearScale,
    pub color: ThresholdScale,
}

impl Scales {
    pub fn from_metrics(
        metrics: impl IntoIterator<Item = f64>,
        palette: &[Rgb],
        legend_range: (f64, f64),
    ) -> Result<Self> {
        let mut non_finite = 0usize;
        let extent = metric_extent(metrics.into_iter().filter(|v| {
            let ok = v.is_finite();
            non_finite += usize::from(!ok);
            ok
        }));
        if non_finite > 0 {
            bail!("{non_finite} metric value(s) are not finite");
        }
        let Some((min, max)) = extent else {
            bail!("cannot derive scales from an empty statistic collection");
        };

        Ok(Self {
            min,
            max,
            position: LinearScale::new((min, max), legend_range),
            color: ThresholdScale::equal_width(min, max, palette)?,
        })
    }

    pub fn build(records: &[StatisticRecord], palette: &[Rgb], legend_range: (f64, f64)) -> Result<Self> {
        Self::from_metrics(records.iter().map(|r| r.metric), palette, legend_range)
    }
}
