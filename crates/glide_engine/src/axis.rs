//! Per-axis scroll model
//!
//! One `Axis` tracks position, velocity, overscroll and the axis-lock flag
//! for a single scroll direction; a controller owns two. All displacement
//! clamping against the scroll range happens here, in one place.
//!
//! Overscroll is accumulated raw (the full remainder routed into it), so
//! that no displacement is ever silently lost; the rubber-band resistance
//! is applied when converting the raw amount to a visual stretch, which
//! grows sub-linearly and asymptotes at the configured maximum.

use glide_core::geometry::COORD_EPSILON;
use glide_core::GlideConfig;

use crate::velocity::{ExponentialTracker, VelocityTracker};

/// Result of routing a displacement through an axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Adjustment {
    /// Portion absorbed by the axis (in-range movement plus overscroll
    /// relief).
    pub consumed: f32,
    /// Portion the axis could not absorb; a candidate for handoff or
    /// overscroll.
    pub overscroll: f32,
}

/// One-dimensional scroll state.
#[derive(Debug)]
pub struct Axis {
    /// Scroll position in content units; always within `[min, max]`.
    position: f32,
    min: f32,
    max: f32,
    /// Velocity estimate in px/ms. Positive scrolls toward `max`.
    velocity: f32,
    /// Raw accumulated overscroll. Sign: negative past `min`, positive
    /// past `max`.
    overscroll: f32,
    locked: bool,
    /// Composition (viewport) length along this axis, for stretch scaling.
    composition_length: f32,
    /// Maximum visual stretch as a fraction of the composition length.
    max_stretch: f32,
    tracker: ExponentialTracker,
    /// Axis name for diagnostics.
    label: &'static str,
}

impl Axis {
    pub fn new(label: &'static str, config: &GlideConfig) -> Self {
        Self {
            position: 0.0,
            min: 0.0,
            max: 0.0,
            velocity: 0.0,
            overscroll: 0.0,
            locked: false,
            composition_length: 0.0,
            max_stretch: config.overscroll_max_stretch,
            tracker: ExponentialTracker::new(config),
            label,
        }
    }

    pub fn apply_config(&mut self, config: &GlideConfig) {
        self.max_stretch = config.overscroll_max_stretch;
        self.tracker.apply_config(config);
    }

    /// Install an updated scroll range and composition length, re-clamping
    /// the position into it.
    pub fn set_range(&mut self, min: f32, max: f32, composition_length: f32) {
        self.min = min;
        self.max = max.max(min);
        self.composition_length = composition_length.max(0.0);
        self.position = self.position.clamp(self.min, self.max);
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    /// Place the position directly (authoritative updates from content).
    pub fn set_position(&mut self, position: f32) {
        self.position = position.clamp(self.min, self.max);
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        if !velocity.is_finite() {
            tracing::warn!(axis = self.label, "rejecting non-finite velocity");
            return;
        }
        self.velocity = velocity;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    // ------------------------------------------------------------------
    // Gesture velocity tracking
    // ------------------------------------------------------------------

    /// Begin tracking a gesture at the given tracked coordinate.
    pub fn start_touch(&mut self, tracked: f32, time: f64) {
        self.tracker.start(tracked, time);
        self.velocity = 0.0;
    }

    /// Feed a movement sample to the velocity tracker.
    pub fn update_with_sample(&mut self, tracked: f32, time: f64) {
        self.tracker.add(tracked, time);
        self.velocity = self.tracker.velocity();
    }

    /// Most recent tracked coordinate, for synthesizing follow-up samples.
    pub fn tracked_position(&self) -> f32 {
        self.tracker.position()
    }

    /// Gesture release at `time`. Keeps the velocity estimate for fling
    /// computation; the axis lock optionally survives into a momentum phase.
    pub fn end_touch(&mut self, clear_lock: bool, time: f64) {
        self.tracker.end(time);
        self.velocity = self.tracker.velocity();
        if clear_lock {
            self.locked = false;
        }
    }

    /// Abandon the gesture entirely: zero velocity, drop lock and history.
    pub fn cancel_gesture(&mut self) {
        self.tracker.reset();
        self.velocity = 0.0;
        self.locked = false;
    }

    // ------------------------------------------------------------------
    // Displacement
    // ------------------------------------------------------------------

    /// Route a displacement through the axis: relieve existing overscroll
    /// first, then move within the scroll range; the remainder is returned
    /// for handoff or overscroll accumulation.
    ///
    /// A zero delta never changes state. A locked axis absorbs nothing.
    pub fn adjust_displacement(&mut self, delta: f32) -> Adjustment {
        if delta == 0.0 || !delta.is_finite() {
            return Adjustment::default();
        }
        if self.locked {
            return Adjustment {
                consumed: 0.0,
                overscroll: 0.0,
            };
        }
        if !self.can_scroll() {
            return Adjustment {
                consumed: 0.0,
                overscroll: delta,
            };
        }

        let mut remaining = delta;
        let mut consumed = 0.0;

        // Pulling back against existing overscroll relieves it before any
        // in-range movement happens.
        if self.overscroll != 0.0 && remaining.signum() != self.overscroll.signum() {
            let relief = remaining.abs().min(self.overscroll.abs()) * remaining.signum();
            self.overscroll += relief;
            consumed += relief;
            remaining -= relief;
        }

        let target = self.position + remaining;
        let clamped = target.clamp(self.min, self.max);
        let moved = clamped - self.position;
        self.position = clamped;
        consumed += moved;
        remaining -= moved;

        // `(position + remaining) - position` loses low bits, so a fully
        // in-range move can leave a tiny residue. That residue is rounding,
        // not overscroll; fold it into the consumed portion.
        if remaining.abs() < COORD_EPSILON {
            consumed += remaining;
            remaining = 0.0;
        }

        Adjustment {
            consumed,
            overscroll: remaining,
        }
    }

    /// How much of `delta` would land beyond the scroll range.
    pub fn displacement_will_overscroll_amount(&self, delta: f32) -> f32 {
        let target = self.position + delta;
        target - target.clamp(self.min, self.max)
    }

    /// How far scaling by `ratio` about `focus` (content units) would push
    /// the position beyond the current scroll range. Degenerate ratios
    /// report zero.
    pub fn scale_will_overscroll_amount(&self, ratio: f32, focus: f32) -> f32 {
        if !ratio.is_finite() || ratio <= 0.0 {
            return 0.0;
        }
        let target = self.position + focus * (1.0 - 1.0 / ratio);
        target - target.clamp(self.min, self.max)
    }

    /// Whether the axis has any scrollable room at all.
    pub fn can_scroll(&self) -> bool {
        (self.max - self.min) > COORD_EPSILON
    }

    /// Whether `delta` would produce any in-range movement or overscroll
    /// relief.
    pub fn can_scroll_delta(&self, delta: f32) -> bool {
        if self.locked || delta == 0.0 || !self.can_scroll() {
            return false;
        }
        if self.overscroll != 0.0 && delta.signum() != self.overscroll.signum() {
            return true;
        }
        (delta < 0.0 && self.position > self.min + COORD_EPSILON)
            || (delta > 0.0 && self.position < self.max - COORD_EPSILON)
    }

    // ------------------------------------------------------------------
    // Overscroll
    // ------------------------------------------------------------------

    /// Accumulate overscroll. The position is left untouched:
    /// `adjust_displacement` already clamped it to the boundary before
    /// producing the remainder, and a disregarded direction overscrolls
    /// from wherever it sits.
    pub fn overscroll_by(&mut self, amount: f32) {
        if amount == 0.0 || !amount.is_finite() {
            return;
        }
        self.overscroll += amount;
    }

    pub fn overscroll(&self) -> f32 {
        self.overscroll
    }

    pub fn is_overscrolled(&self) -> bool {
        self.overscroll != 0.0
    }

    pub fn clear_overscroll(&mut self) {
        self.overscroll = 0.0;
    }

    /// Visual rubber-band stretch for the current raw overscroll:
    /// sub-linear, asymptoting at `max_stretch * composition_length`.
    pub fn stretch(&self) -> f32 {
        if self.overscroll == 0.0 {
            return 0.0;
        }
        let limit = self.max_stretch * self.composition_length;
        if limit <= 0.0 {
            return 0.0;
        }
        let magnitude = limit * (1.0 - (-self.overscroll.abs() / limit).exp());
        magnitude.copysign(self.overscroll)
    }

    /// Directly set the raw overscroll (used by the snap-back animation as
    /// the spring relieves it).
    pub fn set_overscroll(&mut self, overscroll: f32) {
        if !overscroll.is_finite() {
            tracing::warn!(axis = self.label, "rejecting non-finite overscroll");
            return;
        }
        self.overscroll = overscroll;
    }
}
