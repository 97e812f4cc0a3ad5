// A built chart: aggregated series, scales, interaction state and the
// geometry of the latest redraw

use crate::binner::{self, Bucket, Resolution};
use crate::compiler;
use crate::config::ChartConfig;
use crate::event::Event;
use crate::interaction::{
    Gesture, InteractionController, ModeRequest, Modifiers, Pointer, ViewState,
};
use crate::ir::SceneGraph;
use crate::layout::{self, BarRect, LayoutMode};
use crate::palette::ColorMapping;
use crate::scale::{Axis, LinearScale, ScaleManager, ZoomTransform};
use crate::stacker::{self, StackedLayer};
use crate::ticks::{self, Tick};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::time::Duration;
use tracing::{debug, info};

/// Pixels per x tick and per y tick when choosing tick counts
const X_TICK_SPACING: f64 = 80.0;
const Y_TICK_SPACING: f64 = 50.0;

/// Tooltip placement relative to the pointer
const TOOLTIP_OFFSET: (f64, f64) = (10.0, -10.0);

/// Geometry of one redraw
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// Bars as they sit in stacked mode under the live scales
    pub stacked: Vec<BarRect>,
    /// Bars as they sit in grouped mode under the live scales
    pub grouped: Vec<BarRect>,
    /// What is on screen: one of the above, or a blend while transitioning
    pub visible: Vec<BarRect>,
    pub band_width: f64,
    /// Live time scale the ticks were placed with
    pub x_scale: LinearScale,
    /// Live value scale of the active mode
    pub y_scale: LinearScale,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub category: String,
}

pub struct ChartInstance {
    config: ChartConfig,
    buckets: Vec<Bucket>,
    categories: Vec<String>,
    series: Vec<StackedLayer>,
    colors: ColorMapping,
    scales: ScaleManager,
    controller: InteractionController,
    clock: Duration,
    frame: Frame,
    tooltip: Option<Tooltip>,
}

impl ChartInstance {
    /// Bin and stack `events`, then lay out the first frame
    pub fn build(
        events: Vec<Event>,
        resolution: Resolution,
        mode: LayoutMode,
        config: ChartConfig,
    ) -> Result<Self> {
        let buckets = binner::bin(&events, resolution, config.utc_offset);
        let categories = binner::categories(&buckets);
        let series = stacker::stack(&buckets, &categories);
        let scales = ScaleManager::build(&buckets, &series, resolution, mode, &config)
            .context("Failed to build chart scales")?;
        let colors = ColorMapping::for_categories(config.palette, &categories);
        let controller = InteractionController::new(
            ViewState::new(resolution, mode),
            config.plot_area(),
            config.transition,
            categories.len(),
        );

        info!(
            events = events.len(),
            buckets = buckets.len(),
            categories = categories.len(),
            resolution = %resolution,
            "Built chart"
        );

        let mut chart = ChartInstance {
            config,
            buckets,
            categories,
            series,
            colors,
            scales,
            controller,
            clock: Duration::ZERO,
            frame: Frame::default(),
            tooltip: None,
        };
        chart.redraw();
        Ok(chart)
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn resolution(&self) -> Resolution {
        self.controller.view().resolution
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.controller.view().layout_mode
    }

    /// Layout the chart settles in once running and queued toggles finish
    pub fn target_layout(&self) -> LayoutMode {
        self.controller.target_mode()
    }

    pub fn view(&self) -> &ViewState {
        self.controller.view()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn series(&self) -> &[StackedLayer] {
        &self.series
    }

    pub fn colors(&self) -> &ColorMapping {
        &self.colors
    }

    pub fn scales(&self) -> &ScaleManager {
        &self.scales
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.controller.is_transitioning()
    }

    /// Request a stacked/grouped layout at `now`
    pub fn update(&mut self, mode: LayoutMode, now: Duration) -> ModeRequest {
        self.clock = self.clock.max(now);
        let request = self.controller.request_mode(mode, self.clock, &mut self.scales);
        self.redraw();
        request
    }

    /// Advance animation time; returns true while a transition is running
    pub fn tick(&mut self, now: Duration) -> bool {
        self.clock = self.clock.max(now);
        let animating = self.controller.advance(self.clock, &mut self.scales);
        self.redraw();
        animating
    }

    pub fn handle_gesture(&mut self, gesture: Gesture) -> &Frame {
        if self.controller.handle(gesture, &mut self.scales) {
            self.tooltip = None;
            self.redraw();
        }
        &self.frame
    }

    /// A single wheel or pinch step around `pointer`
    pub fn wheel(&mut self, pointer: Pointer, factor: f64, shift: bool) -> &Frame {
        self.handle_gesture(Gesture::Start { pointer });
        self.handle_gesture(Gesture::Update {
            pointer,
            delta: (0.0, 0.0),
            scale: factor,
            modifiers: Modifiers { shift },
        });
        self.handle_gesture(Gesture::End)
    }

    /// A complete drag from `pointer` by `delta` pixels
    pub fn drag(&mut self, pointer: Pointer, delta: (f64, f64)) -> &Frame {
        self.handle_gesture(Gesture::Start { pointer });
        self.handle_gesture(Gesture::Update {
            pointer: Pointer::new(pointer.x + delta.0, pointer.y + delta.1),
            delta,
            scale: 1.0,
            modifiers: Modifiers::default(),
        });
        self.handle_gesture(Gesture::End)
    }

    pub fn reset_zoom(&mut self) -> &Frame {
        self.controller.reset_zoom(&mut self.scales);
        self.redraw()
    }

    pub fn transform(&self, axis: Axis) -> ZoomTransform {
        self.scales.transform(axis)
    }

    /// Recompute every bar and tick from the current scales
    pub fn redraw(&mut self) -> &Frame {
        let x = self.scales.live_x();
        let band_width = self.scales.band_width();
        let stacked_y = self.scales.live_y_for(LayoutMode::Stacked);
        let grouped_y = self.scales.live_y_for(LayoutMode::Grouped);

        let stacked = layout::layout(&self.series, LayoutMode::Stacked, &x, &stacked_y, band_width);
        let grouped = layout::layout(&self.series, LayoutMode::Grouped, &x, &grouped_y, band_width);

        let visible = match self.controller.transition() {
            Some(transition) => {
                let (from, to) = match transition.to {
                    LayoutMode::Grouped => (&stacked, &grouped),
                    LayoutMode::Stacked => (&grouped, &stacked),
                };
                transition.interpolate(from, to, self.clock)
            }
            None => match self.layout_mode() {
                LayoutMode::Stacked => stacked.clone(),
                LayoutMode::Grouped => grouped.clone(),
            },
        };

        let plot = self.config.plot_area();
        let (t0, t1) = self.scales.visible_time();
        let x_count = (plot.width() / X_TICK_SPACING).round().max(2.0) as usize;
        let x_ticks = ticks::time_ticks(t0, t1, x_count, &self.config.utc_offset);

        let y = self.scales.live_y();
        let (v0, v1) = (y.invert(plot.bottom), y.invert(plot.top));
        let y_count = ((plot.bottom - plot.top) / Y_TICK_SPACING).round().max(2.0) as usize;
        let y_ticks = ticks::value_ticks(v0.max(0.0), v1, y_count);

        debug!(bars = visible.len(), band_width, "Redraw");

        self.frame = Frame {
            stacked,
            grouped,
            visible,
            band_width,
            x_scale: x,
            y_scale: y,
            x_ticks,
            y_ticks,
        };
        &self.frame
    }

    /// Hit-test the visible bars; the hovered category gets highlighted
    pub fn hover(&mut self, pointer: Pointer) -> Option<&Tooltip> {
        self.tooltip = None;
        if !self.config.plot_area().contains(pointer.x, pointer.y) {
            return None;
        }

        let hit = self
            .frame
            .visible
            .iter()
            .rev()
            .find(|bar| bar.count > 0 && bar.contains(pointer.x, pointer.y))?;

        let text = format!(
            "{}: {}x {}",
            self.bucket_range_label(&hit.bucket_start),
            hit.count,
            hit.category
        );
        self.tooltip = Some(Tooltip {
            text,
            x: pointer.x + TOOLTIP_OFFSET.0,
            y: pointer.y + TOOLTIP_OFFSET.1,
            category: hit.category.clone(),
        });
        self.tooltip.as_ref()
    }

    fn bucket_range_label(&self, start: &DateTime<FixedOffset>) -> String {
        let resolution = self.resolution();
        let format = match resolution {
            Resolution::Month => "%d.%m.%Y",
            Resolution::Hour | Resolution::Day => "%d.%m.%Y %H:%M",
        };
        let local = start.with_timezone(&self.config.utc_offset);
        match resolution.offset(&local, 1) {
            Ok(end) => format!("{} - {}", local.format(format), end.format(format)),
            Err(_) => local.format(format).to_string(),
        }
    }

    /// Drawing commands for the current frame
    pub fn scene(&self) -> SceneGraph {
        compiler::compile_scene(
            &self.config,
            &self.colors,
            &self.categories,
            &self.frame,
            self.tooltip.as_ref(),
        )
    }
}
