// Bar geometry for stacked and grouped arrangements, and the animated
// transition between them

use crate::config::TransitionTiming;
use crate::error::ChartError;
use crate::scale::{millis, LinearScale};
use crate::stacker::StackedLayer;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutMode {
    #[default]
    Stacked,
    Grouped,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Stacked => "stacked",
            LayoutMode::Grouped => "grouped",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stacked" => Ok(LayoutMode::Stacked),
            "grouped" => Ok(LayoutMode::Grouped),
            _ => Err(ChartError::UnknownLayout(s.to_string())),
        }
    }
}

/// One bar in chart pixel space
#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub category: String,
    pub category_index: usize,
    pub bucket_start: DateTime<FixedOffset>,
    pub count: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BarRect {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Compute bar rectangles for every stack point of every layer.
///
/// Layers come out in series order, points in bucket order, so the
/// stacked and grouped results of the same series line up index by index.
pub fn layout(
    series: &[StackedLayer],
    mode: LayoutMode,
    x: &LinearScale,
    y: &LinearScale,
    band_width: f64,
) -> Vec<BarRect> {
    let n = series.len().max(1) as f64;
    let sub_band = band_width / n;
    let mut bars = Vec::with_capacity(series.iter().map(|l| l.points.len()).sum());

    for layer in series {
        for point in &layer.points {
            let left = x.apply(millis(&point.bucket));
            let count = point.count();
            let (bar_x, width, top, bottom) = match mode {
                LayoutMode::Stacked => (
                    left,
                    band_width,
                    y.apply(point.high as f64),
                    y.apply(point.low as f64),
                ),
                LayoutMode::Grouped => (
                    left + sub_band * layer.index as f64,
                    sub_band,
                    y.apply(count as f64),
                    y.apply(0.0),
                ),
            };
            bars.push(BarRect {
                category: layer.key.clone(),
                category_index: layer.index,
                bucket_start: point.bucket,
                count,
                x: bar_x,
                y: top,
                width,
                height: bottom - top,
            });
        }
    }

    bars
}

/// Cubic in-out easing
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Which bar properties a transition phase animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `x` and `width`
    Horizontal,
    /// `y` and `height`
    Vertical,
}

/// A running stacked/grouped transition.
///
/// Going to grouped moves bars sideways first and then drops them to the
/// baseline; going to stacked lifts them first and then slides them back
/// into one band. Each bar starts `category_index * stagger` late.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: LayoutMode,
    pub to: LayoutMode,
    started: Duration,
    timing: TransitionTiming,
    category_count: usize,
}

impl Transition {
    pub fn new(
        from: LayoutMode,
        to: LayoutMode,
        started: Duration,
        timing: TransitionTiming,
        category_count: usize,
    ) -> Self {
        Transition {
            from,
            to,
            started,
            timing,
            category_count,
        }
    }

    pub fn phases(&self) -> [Phase; 2] {
        match self.to {
            LayoutMode::Grouped => [Phase::Horizontal, Phase::Vertical],
            LayoutMode::Stacked => [Phase::Vertical, Phase::Horizontal],
        }
    }

    /// Total time until the last category's bars have settled
    pub fn duration(&self) -> Duration {
        let stagger = self.timing.stagger * self.category_count.saturating_sub(1) as u32;
        self.timing.phase_one + self.timing.phase_two + stagger
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now.saturating_sub(self.started) >= self.duration()
    }

    /// Eased progress of both phases for one category at `now`
    pub fn progress(&self, category_index: usize, now: Duration) -> (f64, f64) {
        let delay = self.timing.stagger * category_index as u32;
        let local = now.saturating_sub(self.started).saturating_sub(delay);
        let first = fraction(local, self.timing.phase_one);
        let second = fraction(local.saturating_sub(self.timing.phase_one), self.timing.phase_two);
        (ease_cubic_in_out(first), ease_cubic_in_out(second))
    }

    /// Blend `from`-mode and `to`-mode geometry of the same series at `now`
    pub fn interpolate(&self, from: &[BarRect], to: &[BarRect], now: Duration) -> Vec<BarRect> {
        let [first_phase, _] = self.phases();
        from.iter()
            .zip(to)
            .map(|(start, end)| {
                let (p1, p2) = self.progress(end.category_index, now);
                let (horizontal, vertical) = match first_phase {
                    Phase::Horizontal => (p1, p2),
                    Phase::Vertical => (p2, p1),
                };
                BarRect {
                    x: lerp(start.x, end.x, horizontal),
                    width: lerp(start.width, end.width, horizontal),
                    y: lerp(start.y, end.y, vertical),
                    height: lerp(start.height, end.height, vertical),
                    ..end.clone()
                }
            })
            .collect()
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}
