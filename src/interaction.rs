// Pan/zoom gesture handling and the layout transition state machine

use crate::binner::Resolution;
use crate::config::{PlotArea, TransitionTiming};
use crate::layout::{LayoutMode, Transition};
use crate::scale::{Axis, ScaleManager, ZoomTransform};
use std::time::Duration;
use tracing::debug;

/// Pointer position in chart pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub fn new(x: f64, y: f64) -> Self {
        Pointer { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
}

/// One step of a pan/zoom gesture.
///
/// `delta` and `scale` are cumulative since `Start`. Axis eligibility and
/// the zoom anchor come from the pointer recorded at `Start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Start {
        pointer: Pointer,
    },
    Update {
        pointer: Pointer,
        delta: (f64, f64),
        scale: f64,
        modifiers: Modifiers,
    },
    End,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    Transitioning,
}

/// Outcome of a layout toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Started,
    Queued,
    Ignored,
}

/// What the user currently looks at
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub resolution: Resolution,
    pub layout_mode: LayoutMode,
    pub x_zoom: ZoomTransform,
    pub y_zoom: ZoomTransform,
}

impl ViewState {
    pub fn new(resolution: Resolution, layout_mode: LayoutMode) -> Self {
        ViewState {
            resolution,
            layout_mode,
            x_zoom: ZoomTransform::IDENTITY,
            y_zoom: ZoomTransform::IDENTITY,
        }
    }
}

/// Transforms and pointer captured when a gesture starts
#[derive(Debug, Clone, Copy, PartialEq)]
struct Baseline {
    origin: Pointer,
    x: ZoomTransform,
    y: ZoomTransform,
}

pub struct InteractionController {
    view: ViewState,
    plot: PlotArea,
    timing: TransitionTiming,
    category_count: usize,
    baseline: Option<Baseline>,
    transition: Option<Transition>,
    pending: Option<LayoutMode>,
}

impl InteractionController {
    pub fn new(
        view: ViewState,
        plot: PlotArea,
        timing: TransitionTiming,
        category_count: usize,
    ) -> Self {
        InteractionController {
            view,
            plot,
            timing,
            category_count,
            baseline: None,
            transition: None,
            pending: None,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn pending(&self) -> Option<LayoutMode> {
        self.pending
    }

    pub fn state(&self) -> InteractionState {
        if self.baseline.is_some() {
            InteractionState::Dragging
        } else if self.transition.is_some() {
            InteractionState::Transitioning
        } else {
            InteractionState::Idle
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// The mode the chart settles in once running and queued toggles finish
    pub fn target_mode(&self) -> LayoutMode {
        self.pending
            .or_else(|| self.transition.as_ref().map(|t| t.to))
            .unwrap_or(self.view.layout_mode)
    }

    /// Drop both zoom transforms back to identity
    pub fn reset_zoom(&mut self, scales: &mut ScaleManager) {
        scales.reset_zoom();
        self.baseline = None;
        self.view.x_zoom = ZoomTransform::IDENTITY;
        self.view.y_zoom = ZoomTransform::IDENTITY;
    }

    /// Feed one gesture step; returns true when the view changed
    pub fn handle(&mut self, gesture: Gesture, scales: &mut ScaleManager) -> bool {
        match gesture {
            Gesture::Start { pointer } => {
                self.baseline = Some(Baseline {
                    origin: pointer,
                    x: scales.transform(Axis::X),
                    y: scales.transform(Axis::Y),
                });
                false
            }
            Gesture::Update {
                pointer,
                delta,
                scale,
                modifiers,
            } => {
                let baseline = match self.baseline {
                    Some(baseline) => baseline,
                    None => {
                        debug!("Gesture update without start, using current transforms");
                        let current = Baseline {
                            origin: Pointer::new(pointer.x - delta.0, pointer.y - delta.1),
                            x: scales.transform(Axis::X),
                            y: scales.transform(Axis::Y),
                        };
                        self.baseline = Some(current);
                        current
                    }
                };
                self.update(baseline, delta, scale, modifiers, scales);
                true
            }
            Gesture::End => {
                self.baseline = None;
                false
            }
            Gesture::Cancel => match self.baseline.take() {
                Some(baseline) => {
                    self.view.x_zoom = scales.apply_zoom(Axis::X, baseline.x);
                    self.view.y_zoom = scales.apply_zoom(Axis::Y, baseline.y);
                    true
                }
                None => false,
            },
        }
    }

    fn update(
        &mut self,
        baseline: Baseline,
        (dx, dy): (f64, f64),
        scale: f64,
        modifiers: Modifiers,
        scales: &mut ScaleManager,
    ) {
        let Baseline { origin, x: base_x, y: base_y } = baseline;
        let x_eligible = origin.x >= self.plot.left;
        let y_eligible = origin.y <= self.plot.bottom;
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };

        if modifiers.shift {
            // Horizontal zoom only
            if x_eligible {
                let next = zoom_about(scales, Axis::X, base_x, scale, origin.x, 0.0);
                self.view.x_zoom = scales.apply_zoom(Axis::X, next);
            }
            return;
        }

        if scale == 1.0 {
            if x_eligible {
                self.view.x_zoom = scales.apply_zoom(Axis::X, base_x.translate_by(dx / base_x.k));
            }
            if y_eligible {
                self.view.y_zoom = scales.apply_zoom(Axis::Y, base_y.translate_by(dy / base_y.k));
            }
            return;
        }

        if x_eligible {
            let next = zoom_about(scales, Axis::X, base_x, scale, origin.x, dx);
            self.view.x_zoom = scales.apply_zoom(Axis::X, next);
        }
        if y_eligible {
            let next = zoom_about(scales, Axis::Y, base_y, scale, origin.y, dy);
            self.view.y_zoom = scales.apply_zoom(Axis::Y, next);
        }
    }

    /// Ask for a layout mode; a running transition is never interrupted
    pub fn request_mode(
        &mut self,
        mode: LayoutMode,
        now: Duration,
        scales: &mut ScaleManager,
    ) -> ModeRequest {
        self.advance(now, scales);

        if let Some(running) = &self.transition {
            if mode == running.to {
                self.pending = None;
                return ModeRequest::Ignored;
            }
            debug!(requested = %mode, running = %running.to, "Queued layout toggle");
            self.pending = Some(mode);
            return ModeRequest::Queued;
        }

        if mode == self.view.layout_mode {
            return ModeRequest::Ignored;
        }

        self.start_transition(mode, now, scales);
        ModeRequest::Started
    }

    /// Move the clock forward; finishes transitions and starts queued ones.
    /// Returns true while geometry is animating.
    pub fn advance(&mut self, now: Duration, scales: &mut ScaleManager) -> bool {
        let finished = self
            .transition
            .as_ref()
            .is_some_and(|t| t.is_finished(now));
        if finished {
            self.transition = None;
            if let Some(next) = self.pending.take() {
                if next != self.view.layout_mode {
                    self.start_transition(next, now, scales);
                }
            }
        }
        self.transition.is_some()
    }

    fn start_transition(&mut self, mode: LayoutMode, now: Duration, scales: &mut ScaleManager) {
        let from = self.view.layout_mode;
        debug!(from = %from, to = %mode, "Starting layout transition");
        self.transition = Some(Transition::new(from, mode, now, self.timing, self.category_count));
        self.view.layout_mode = mode;
        scales.set_mode(mode);
    }
}

/// Zoom `base` by `factor` keeping `anchor` fixed, then shift by `shift` pixels
fn zoom_about(
    scales: &ScaleManager,
    axis: Axis,
    base: ZoomTransform,
    factor: f64,
    anchor: f64,
    shift: f64,
) -> ZoomTransform {
    let (min_k, max_k) = scales.axis(axis).scale_extent();
    let k = (base.k * factor).clamp(min_k, max_k);
    let zoomed = base.scale_to(k, anchor);
    ZoomTransform::new(zoomed.k, zoomed.t + shift)
}
