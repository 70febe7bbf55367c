//! Hover state machine and the shared tooltip it drives.
//!
//! The controller only consumes hit-test results and timestamps, so any host
//! that can report "pointer is over region i" can drive it.

use crate::bind::Region;
use std::time::{Duration, Instant};

/// Timed opacity transition with cubic in-out easing.
///
/// The displayed value is a pure function of the clock, so a fade that is
/// superseded simply stops being evaluated.
#[derive(Clone, Copy, Debug)]
pub struct Fade {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
}

impl Fade {
    pub fn new(from: f64, to: f64, start: Instant, duration: Duration) -> Self {
        Self { from, to, start, duration }
    }

    /// A fade that has already finished at `value`
    pub fn settled(value: f64, now: Instant) -> Self {
        Self::new(value, value, now, Duration::ZERO)
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.start);
        let t = (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0);
        self.from + (self.to - self.from) * cubic_in_out(t)
    }

    pub fn is_running(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) < self.duration
    }
}

fn cubic_in_out(t: f64) -> f64 {
    let t = t * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// The single tooltip overlay; content and anchor go stale while hidden
#[derive(Clone, Debug)]
pub struct TooltipController {
    content: String,
    anchor: (i32, i32),
    metric: Option<f64>,
    fade: Fade,
    visible_opacity: f64,
    fade_in: Duration,
    fade_out: Duration,
}

impl TooltipController {
    pub fn new(visible_opacity: f64, fade_in: Duration, fade_out: Duration, now: Instant) -> Self {
        Self {
            content: String::new(),
            anchor: (0, 0),
            metric: None,
            fade: Fade::settled(0.0, now),
            visible_opacity,
            fade_in,
            fade_out,
        }
    }

    pub fn show(&mut self, content: String, anchor: (i32, i32), metric: f64, now: Instant) {
        self.content = content;
        self.anchor = anchor;
        self.metric = Some(metric);
        self.fade = Fade::new(self.opacity(now), self.visible_opacity, now, self.fade_in);
    }

    pub fn hide(&mut self, now: Instant) {
        self.fade = Fade::new(self.opacity(now), 0.0, now, self.fade_out);
    }

    pub fn opacity(&self, now: Instant) -> f64 {
        self.fade.value_at(now)
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.fade.is_running(now)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn anchor(&self) -> (i32, i32) {
        self.anchor
    }

    /// Metric of the last region shown
    pub fn metric(&self) -> Option<f64> {
        self.metric
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverState {
    Idle,
    Hovered(usize),
}

/// Tooltip text for a region, e.g. `Autauga, AL: 24.5%`
pub fn tooltip_text(region: &Region) -> String {
    format!("{}, {}: {}%", region.name, region.group, region.metric)
}

pub struct InteractionController {
    hover: HoverState,
    tooltip: TooltipController,
    offset: (i32, i32),
}

impl InteractionController {
    pub fn new(tooltip: TooltipController, offset: (i32, i32)) -> Self {
        Self {
            hover: HoverState::Idle,
            tooltip,
            offset,
        }
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn tooltip(&self) -> &TooltipController {
        &self.tooltip
    }

    /// Idle -> Hovered
    pub fn pointer_enter(&mut self, index: usize, region: &Region, pointer: (i32, i32), now: Instant) {
        let anchor = (pointer.0 + self.offset.0, pointer.1 + self.offset.1);
        self.tooltip.show(tooltip_text(region), anchor, region.metric, now);
        self.hover = HoverState::Hovered(index);
    }

    /// Hovered -> Idle
    pub fn pointer_leave(&mut self, now: Instant) {
        if self.hover != HoverState::Idle {
            self.tooltip.hide(now);
            self.hover = HoverState::Idle;
        }
    }

    /// Dispatch enter/leave from the region currently under the pointer.
    /// Crossing straight from one region into another is leave then enter.
    pub fn pointer_move(&mut self, hit: Option<usize>, regions: &[Region], pointer: (i32, i32), now: Instant) {
        match (self.hover, hit) {
            (HoverState::Hovered(current), Some(next)) if current == next => {}
            (_, Some(next)) => {
                self.pointer_leave(now);
                if let Some(region) = regions.get(next) {
                    self.pointer_enter(next, region, pointer, now);
                }
            }
            (HoverState::Hovered(_), None) => self.pointer_leave(now),
            (HoverState::Idle, None) => {}
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.tooltip.is_animating(now)
    }
}
