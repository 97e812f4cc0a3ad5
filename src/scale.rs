// Time and value scales with per-axis zoom transforms

use crate::binner::{Bucket, Resolution};
use crate::config::ChartConfig;
use crate::layout::LayoutMode;
use crate::stacker::{self, StackedLayer};
use crate::ticks;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, TimeZone};
use tracing::debug;

/// Continuous mapping from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        self.range.0 + (value - self.domain.0) / span * (self.range.1 - self.range.0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        if span == 0.0 {
            return (self.domain.0 + self.domain.1) / 2.0;
        }
        self.domain.0 + (pixel - self.range.0) / span * (self.domain.1 - self.domain.0)
    }

    /// Range with its endpoints ordered low to high
    pub fn range_extent(&self) -> (f64, f64) {
        (self.range.0.min(self.range.1), self.range.0.max(self.range.1))
    }

    /// Nicely rounded tick values covering the domain
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks::linear_ticks(self.domain.0, self.domain.1, count)
    }
}

/// Pixel-space zoom of one axis: `effective(v) = t + k * reference(v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub t: f64,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, t: 0.0 };

    pub fn new(k: f64, t: f64) -> Self {
        ZoomTransform { k, t }
    }

    pub fn apply(&self, pixel: f64) -> f64 {
        self.t + self.k * pixel
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        (pixel - self.t) / self.k
    }

    /// Translate by `d` reference pixels (`d * k` screen pixels)
    pub fn translate_by(&self, d: f64) -> ZoomTransform {
        ZoomTransform::new(self.k, self.t + self.k * d)
    }

    /// Change the scale to `k` keeping the screen position `anchor` fixed
    pub fn scale_to(&self, k: f64, anchor: f64) -> ZoomTransform {
        let reference = self.invert(anchor);
        ZoomTransform::new(k, anchor - k * reference)
    }

    pub fn is_identity(&self) -> bool {
        *self == ZoomTransform::IDENTITY
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        ZoomTransform::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// A reference scale plus the zoom applied on top of it.
///
/// The reference never changes after construction, so resetting the
/// transform to identity restores the original mapping exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisZoomState {
    reference: LinearScale,
    transform: ZoomTransform,
    scale_extent: (f64, f64),
    translate_extent: (f64, f64),
}

impl AxisZoomState {
    pub fn new(reference: LinearScale, max_scale: f64) -> Self {
        AxisZoomState {
            reference,
            transform: ZoomTransform::IDENTITY,
            scale_extent: (1.0, max_scale.max(1.0)),
            translate_extent: reference.range_extent(),
        }
    }

    pub fn reference(&self) -> &LinearScale {
        &self.reference
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        self.scale_extent
    }

    /// The reference scale with its range pushed through the zoom transform
    pub fn live(&self) -> LinearScale {
        LinearScale::new(
            self.reference.domain,
            (
                self.transform.apply(self.reference.range.0),
                self.transform.apply(self.reference.range.1),
            ),
        )
    }

    /// Clamp a transform into the scale and translate extents
    pub fn constrain(&self, transform: ZoomTransform) -> ZoomTransform {
        let k = if transform.k.is_finite() {
            transform.k.clamp(self.scale_extent.0, self.scale_extent.1)
        } else {
            self.transform.k
        };
        // The zoomed extent must keep covering the viewport
        let (lo, hi) = self.translate_extent;
        let min_t = hi - k * hi;
        let max_t = lo - k * lo;
        let t = if transform.t.is_finite() { transform.t } else { self.transform.t };
        ZoomTransform::new(k, t.clamp(min_t, max_t))
    }

    /// Store a clamped transform and return what was stored
    pub fn apply(&mut self, transform: ZoomTransform) -> ZoomTransform {
        self.transform = self.constrain(transform);
        self.transform
    }

    pub fn reset(&mut self) {
        self.transform = ZoomTransform::IDENTITY;
    }
}

/// Owns the time and value scales of one chart build.
#[derive(Debug, Clone)]
pub struct ScaleManager {
    resolution: Resolution,
    time_domain: (DateTime<FixedOffset>, DateTime<FixedOffset>),
    slot_count: usize,
    stacked_max: f64,
    grouped_max: f64,
    band_padding: f64,
    mode: LayoutMode,
    x: AxisZoomState,
    y: AxisZoomState,
}

impl ScaleManager {
    /// Build reference scales for the given buckets and stacked series
    pub fn build(
        buckets: &[Bucket],
        series: &[StackedLayer],
        resolution: Resolution,
        mode: LayoutMode,
        config: &ChartConfig,
    ) -> Result<Self> {
        let plot = config.plot_area();

        let (first, last) = match (buckets.first(), buckets.last()) {
            (Some(first), Some(last)) => (first.start, last.start),
            _ => {
                // Empty dataset: an axis frame around the epoch bucket
                let epoch = config
                    .utc_offset
                    .timestamp_opt(0, 0)
                    .single()
                    .context("Epoch is not representable")?;
                let anchor = resolution.floor(&epoch);
                (anchor, anchor)
            }
        };

        let start = resolution
            .offset(&first, -1)
            .context("Failed to pad time domain start")?;
        let mut end = resolution
            .offset(&last, 2)
            .context("Failed to pad time domain end")?;
        if end <= start {
            end = resolution.offset(&start, 1).context("Failed to widen degenerate time domain")?;
        }
        let slot_count = resolution.steps_between(&start, &end).max(1);

        let x_reference = LinearScale::new(
            (millis(&start), millis(&end)),
            (plot.left, plot.right),
        );

        let stacked_max = value_max(stacker::max_total(series), config.value_headroom);
        let grouped_max = value_max(stacker::max_single(series), config.value_headroom);
        let value_top = match mode {
            LayoutMode::Stacked => stacked_max,
            LayoutMode::Grouped => grouped_max,
        };
        let y_reference = LinearScale::new((0.0, value_top), (plot.bottom, plot.top));

        debug!(
            resolution = %resolution,
            slots = slot_count,
            stacked_max,
            grouped_max,
            "Built reference scales"
        );

        Ok(ScaleManager {
            resolution,
            time_domain: (start, end),
            slot_count,
            stacked_max,
            grouped_max,
            band_padding: config.band_padding,
            mode,
            x: AxisZoomState::new(x_reference, slot_count as f64),
            y: AxisZoomState::new(y_reference, slot_count as f64),
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn time_domain(&self) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        self.time_domain
    }

    /// Bucket slots in the unzoomed time domain
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn axis(&self, axis: Axis) -> &AxisZoomState {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn transform(&self, axis: Axis) -> ZoomTransform {
        self.axis(axis).transform()
    }

    /// Update one axis' live transform; the reference scale is untouched
    pub fn apply_zoom(&mut self, axis: Axis, transform: ZoomTransform) -> ZoomTransform {
        match axis {
            Axis::X => self.x.apply(transform),
            Axis::Y => self.y.apply(transform),
        }
    }

    pub fn reset_zoom(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    /// Switch the value domain between total-stack and single-category magnitude
    pub fn set_mode(&mut self, mode: LayoutMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        let reference = LinearScale::new((0.0, self.value_top(mode)), self.y.reference.range);
        self.y.reference = reference;
    }

    pub fn reference_x(&self) -> &LinearScale {
        self.x.reference()
    }

    pub fn live_x(&self) -> LinearScale {
        self.x.live()
    }

    pub fn live_y(&self) -> LinearScale {
        self.live_y_for(self.mode)
    }

    /// Live value scale as it would be in `mode`, sharing the current y zoom
    pub fn live_y_for(&self, mode: LayoutMode) -> LinearScale {
        let live = self.y.live();
        LinearScale::new((0.0, self.value_top(mode)), live.range)
    }

    /// Pixel width of one bucket's bar at the current zoom
    pub fn band_width(&self) -> f64 {
        let live = self.live_x();
        let (lo, hi) = live.range_extent();
        (hi - lo) / self.slot_count as f64 * (1.0 - self.band_padding)
    }

    /// Time span (ms) currently visible between the plot edges
    pub fn visible_time(&self) -> (f64, f64) {
        let live = self.live_x();
        let (left, right) = self.x.reference.range;
        (live.invert(left), live.invert(right))
    }

    fn value_top(&self, mode: LayoutMode) -> f64 {
        match mode {
            LayoutMode::Stacked => self.stacked_max,
            LayoutMode::Grouped => self.grouped_max,
        }
    }
}

pub fn millis(instant: &DateTime<FixedOffset>) -> f64 {
    instant.timestamp_millis() as f64
}

fn value_max(max: u32, headroom: f64) -> f64 {
    if max == 0 {
        // Degenerate value domain: keep a unit axis so the scale stays invertible
        1.0
    } else {
        max as f64 * headroom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binner::{bin, categories};
    use crate::event::{parse_timestamp, Event};
    use crate::stacker::stack;
    use chrono::{Offset, Utc};

    fn ev(t: &str, c: &str) -> Event {
        Event::new(parse_timestamp(t).unwrap(), c)
    }

    fn build(events: &[Event], mode: LayoutMode) -> ScaleManager {
        let buckets = bin(events, Resolution::Day, Utc.fix());
        let series = stack(&buckets, &categories(&buckets));
        ScaleManager::build(&buckets, &series, Resolution::Day, mode, &ChartConfig::default()).unwrap()
    }

    fn sample() -> Vec<Event> {
        vec![
            ev("2024-06-01 21:00:00+0000", "A"),
            ev("2024-06-01 22:00:00+0000", "A"),
            ev("2024-06-01 22:10:00+0000", "B"),
            ev("2024-06-04 22:00:00+0000", "B"),
        ]
    }

    #[test]
    fn test_linear_scale_apply_invert() {
        let scale = LinearScale::new((0.0, 10.0), (280.0, 10.0));
        assert_eq!(scale.apply(0.0), 280.0);
        assert_eq!(scale.apply(10.0), 10.0);
        assert_eq!(scale.invert(145.0), 5.0);
        assert_eq!(scale.range_extent(), (10.0, 280.0));
    }

    #[test]
    fn test_zoom_transform_scale_to_keeps_anchor() {
        let t = ZoomTransform::new(2.0, -100.0);
        let anchor = 300.0;
        let before = t.invert(anchor);
        let zoomed = t.scale_to(5.0, anchor);
        assert!((zoomed.invert(anchor) - before).abs() < 1e-9);
        assert_eq!(zoomed.k, 5.0);
    }

    #[test]
    fn test_time_domain_padding() {
        let scales = build(&sample(), LayoutMode::Stacked);
        let (start, end) = scales.time_domain();
        assert_eq!(start, parse_timestamp("2024-05-31 12:00:00+0000").unwrap());
        assert_eq!(end, parse_timestamp("2024-06-06 12:00:00+0000").unwrap());
        assert_eq!(scales.slot_count(), 6);
        assert_eq!(scales.reference_x().range, (40.0, 790.0));
    }

    #[test]
    fn test_value_domain_per_mode() {
        let mut scales = build(&sample(), LayoutMode::Stacked);
        assert!((scales.live_y().domain.1 - 3.3).abs() < 1e-9);
        scales.set_mode(LayoutMode::Grouped);
        assert!((scales.live_y().domain.1 - 2.2).abs() < 1e-9);
        assert_eq!(scales.live_y().range, (280.0, 10.0));
    }

    #[test]
    fn test_degenerate_domains() {
        let single = vec![ev("2024-06-01 21:00:00+0000", "A")];
        let scales = build(&single, LayoutMode::Stacked);
        let (start, end) = scales.time_domain();
        assert!(end > start);
        assert_eq!(scales.slot_count(), 3);

        let empty = build(&[], LayoutMode::Stacked);
        assert!(empty.time_domain().1 > empty.time_domain().0);
        assert_eq!(empty.live_y().domain, (0.0, 1.0));
        assert!(empty.band_width() > 0.0);
    }

    #[test]
    fn test_zoom_round_trip_restores_reference() {
        let mut scales = build(&sample(), LayoutMode::Stacked);
        let original_x = scales.live_x();
        let original_y = scales.live_y();

        scales.apply_zoom(Axis::X, ZoomTransform::IDENTITY.scale_to(3.0, 400.0));
        scales.apply_zoom(Axis::Y, ZoomTransform::IDENTITY.scale_to(2.0, 100.0));
        assert_ne!(scales.live_x(), original_x);

        scales.apply_zoom(Axis::X, ZoomTransform::IDENTITY);
        scales.apply_zoom(Axis::Y, ZoomTransform::IDENTITY);
        assert_eq!(scales.live_x(), original_x);
        assert_eq!(scales.live_y(), original_y);
        assert_eq!(*scales.reference_x(), original_x);
    }

    #[test]
    fn test_scale_extent_clamped_to_slot_count() {
        let mut scales = build(&sample(), LayoutMode::Stacked);
        let stored = scales.apply_zoom(Axis::X, ZoomTransform::new(100.0, 0.0));
        assert_eq!(stored.k, 6.0);
        let stored = scales.apply_zoom(Axis::X, ZoomTransform::new(0.2, 0.0));
        assert_eq!(stored.k, 1.0);
    }

    #[test]
    fn test_translate_clamped_to_domain_edges() {
        let mut scales = build(&sample(), LayoutMode::Stacked);

        // Unzoomed, no panning is possible at all
        let stored = scales.apply_zoom(Axis::X, ZoomTransform::new(1.0, 250.0));
        assert_eq!(stored.t, 0.0);

        let stored = scales.apply_zoom(Axis::X, ZoomTransform::new(2.0, 10_000.0));
        let live = scales.live_x();
        assert!(live.range.0 <= 40.0 + 1e-9);
        assert!(live.range.1 >= 790.0 - 1e-9);
        assert_eq!(stored.t, 40.0 - 2.0 * 40.0);

        scales.apply_zoom(Axis::X, ZoomTransform::new(2.0, -10_000.0));
        let live = scales.live_x();
        assert!((live.range.1 - 790.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_width_follows_live_scale() {
        let mut scales = build(&sample(), LayoutMode::Stacked);
        let base = scales.band_width();
        assert!((base - 750.0 / 6.0 * 0.9).abs() < 1e-9);
        scales.apply_zoom(Axis::X, ZoomTransform::IDENTITY.scale_to(2.0, 400.0));
        assert!((scales.band_width() - 2.0 * base).abs() < 1e-9);
    }

    #[test]
    fn test_mode_switch_keeps_zoom() {
        let mut scales = build(&sample(), LayoutMode::Stacked);
        let x = scales.apply_zoom(Axis::X, ZoomTransform::IDENTITY.scale_to(2.0, 300.0));
        let y = scales.apply_zoom(Axis::Y, ZoomTransform::IDENTITY.scale_to(1.5, 200.0));
        let live_x = scales.live_x();
        scales.set_mode(LayoutMode::Grouped);
        assert_eq!(scales.transform(Axis::X), x);
        assert_eq!(scales.transform(Axis::Y), y);
        assert_eq!(scales.live_x(), live_x);
    }
}
