//! Pan/zoom controller
//!
//! One controller owns the gesture state machine, axes and animation slot
//! for a single scrollable region. All state lives behind one
//! non-reentrant mutex; every public method locks it exactly once,
//! records outward notifications while locked, and dispatches them to the
//! observer after releasing the lock. Work that needs to touch *other*
//! controllers is returned as [`DeferredTask`]s for the tree to run.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

use glide_animation::{Easing, FlingDecay};
use glide_core::geometry::{is_close_to_horizontal, is_close_to_vertical, SideBits, COORD_EPSILON};
use glide_core::{
    AxisLockMode, EventStatus, GlideConfig, InputEvent, PinchLockMode, Point, ScrollUnit, TapKind,
    Vector, WheelDeliveryMode,
};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::animation::{
    Animation, AnimationContext, AutoscrollAnimation, EasedScrollAnimation, FlingAnimation,
    MsdScrollAnimation, OverscrollAnimation, SampleResult, ZoomAnimation,
};
use crate::axis::Axis;
use crate::metadata::{MetadataError, ScrollDirection, ScrollMetadata, SnapFlags, SnapTargetIds};
use crate::observer::{
    ControllerObserver, DeferredTask, Notification, RepaintReason, RepaintRequest,
};
use crate::sampled::{FrameState, FrameTransform, SampledState};
use crate::ControllerId;

/// Gesture state machine. At most one state is active per controller.
///
/// For the axis-locked pan states the name carries the *locked* axis:
/// `PanningLockedX` means the X axis is locked and the pan is vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanZoomState {
    Idle,
    /// A finger is down but has not yet moved past the start tolerance.
    Touching,
    Panning,
    PanningLockedX,
    PanningLockedY,
    /// Platform-driven momentum phase of a trackpad pan.
    PanMomentum,
    Pinching,
    Fling,
    AnimatingZoom,
    OverscrollAnimation,
    SmoothScroll,
    SmoothMsdScroll,
    WheelScroll,
    KeyboardScroll,
    Autoscroll,
    ScrollbarDrag,
}

impl PanZoomState {
    /// Whether the visual transform may change every frame in this state.
    /// Everything except rest and an undecided touch is transforming.
    pub fn is_transforming(&self) -> bool {
        !matches!(self, PanZoomState::Idle | PanZoomState::Touching)
    }

    pub fn is_panning(&self) -> bool {
        matches!(
            self,
            PanZoomState::Panning | PanZoomState::PanningLockedX | PanZoomState::PanningLockedY
        )
    }
}

/// Result of feeding one input event to a controller.
#[derive(Debug)]
pub struct HandleResult {
    pub status: EventStatus,
    /// Displacement (content units) the controller could not consume and
    /// that may be handed to the next controller in the chain.
    pub unconsumed: Vector,
    /// Off-lock work for the tree.
    pub deferred: Vec<DeferredTask>,
}

impl HandleResult {
    fn new(status: EventStatus, unconsumed: Vector, deferred: Vec<DeferredTask>) -> Self {
        Self {
            status,
            unconsumed,
            deferred,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PinchSample {
    time: f64,
    span: f32,
    focus: Point,
}

struct ControllerState {
    id: ControllerId,
    config: GlideConfig,
    state: PanZoomState,
    metadata: ScrollMetadata,
    x: Axis,
    y: Axis,
    animation: Option<Animation>,
    sampled: SampledState,
    last_sample_time: Option<f64>,

    // Active gesture bookkeeping.
    touch_start: Point,
    last_touch: Point,
    /// Absolute content-unit distance panned per axis since the gesture
    /// began. Gates which axes may enter overscroll.
    pan_distance: Vector,
    gesture_chain: Vec<ControllerId>,
    chain_index: usize,
    scrollbar_vertical: bool,

    // Pinch lock evaluation over a short sliding window of samples.
    pinch_buffer: SmallVec<[PinchSample; 8]>,
    pinch_decided: bool,
    pinch_allow_zoom: bool,
    last_pinch_focus: Point,

    // Notification batching: while `batch_depth > 0` individual state
    // changes are withheld and only the net transition is emitted.
    batch_depth: u32,
    batch_initial: PanZoomState,
    notifications: Vec<Notification>,
    deferred: Vec<DeferredTask>,
    transforming: bool,
    pending_transform_end: Option<f64>,

    /// Content-side scroll offset at the last metadata update, the baseline
    /// for relative updates.
    last_content_offset: Point,
    pending_snap: Option<SnapTargetIds>,
}

impl ControllerState {
    fn new(id: ControllerId, config: GlideConfig) -> Self {
        let x = Axis::new("x", &config);
        let y = Axis::new("y", &config);
        Self {
            id,
            config,
            state: PanZoomState::Idle,
            metadata: ScrollMetadata::default(),
            x,
            y,
            animation: None,
            sampled: SampledState::default(),
            last_sample_time: None,
            touch_start: Point::ZERO,
            last_touch: Point::ZERO,
            pan_distance: Vector::ZERO,
            gesture_chain: Vec::new(),
            chain_index: 0,
            scrollbar_vertical: true,
            pinch_buffer: SmallVec::new(),
            pinch_decided: false,
            pinch_allow_zoom: false,
            last_pinch_focus: Point::ZERO,
            batch_depth: 0,
            batch_initial: PanZoomState::Idle,
            notifications: Vec::new(),
            deferred: Vec::new(),
            transforming: false,
            pending_transform_end: None,
            last_content_offset: Point::ZERO,
            pending_snap: None,
        }
    }

    // ------------------------------------------------------------------
    // State transitions & notifications
    // ------------------------------------------------------------------

    fn set_state(&mut self, new: PanZoomState, now: f64) {
        if new == self.state {
            return;
        }
        let old = mem::replace(&mut self.state, new);
        trace!(controller = ?self.id, ?old, ?new, "state change");
        if self.batch_depth == 0 {
            self.notifications
                .push(Notification::StateChange { old, new });
        }
        if new.is_transforming() {
            self.pending_transform_end = None;
            if !self.transforming {
                self.transforming = true;
                self.notifications.push(Notification::TransformBegin);
            }
        } else if self.transforming && self.pending_transform_end.is_none() {
            // Leave a short grace window: a momentum phase or a follow-up
            // gesture arriving right after the pan end keeps the transform
            // alive instead of producing an end/begin pair.
            let deadline = now + self.config.scrollend_grace_ms;
            self.pending_transform_end = Some(deadline);
            self.deferred.push(DeferredTask::TransformEnd {
                id: self.id,
                deadline,
            });
        }
    }

    fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_initial = self.state;
        }
        self.batch_depth += 1;
    }

    fn end_batch(&mut self) {
        debug_assert!(self.batch_depth > 0);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && self.state != self.batch_initial {
            self.notifications.push(Notification::StateChange {
                old: self.batch_initial,
                new: self.state,
            });
        }
    }

    fn maybe_fire_transform_end(&mut self, now: f64) {
        if let Some(deadline) = self.pending_transform_end {
            if now >= deadline && !self.state.is_transforming() {
                self.pending_transform_end = None;
                self.transforming = false;
                self.notifications.push(Notification::TransformEnd);
            }
        }
    }

    fn request_repaint(&mut self, reason: RepaintReason) {
        self.notifications
            .push(Notification::Repaint(RepaintRequest {
                id: self.id,
                scroll_offset: self.metadata.scroll_offset,
                zoom: self.metadata.zoom,
                velocity: Vector::new(self.x.velocity(), self.y.velocity()),
                reason,
            }));
    }

    fn with_ctx<R>(&mut self, now: f64, f: impl FnOnce(&mut AnimationContext) -> R) -> R {
        let id = self.id;
        let ControllerState {
            metadata,
            x,
            y,
            config,
            deferred,
            ..
        } = self;
        let mut ctx = AnimationContext {
            id,
            metadata,
            x,
            y,
            config,
            deferred,
            now,
        };
        f(&mut ctx)
    }

    fn refresh_ranges(&mut self) {
        // `now` is unused by refresh; any value works.
        self.with_ctx(0.0, |ctx| ctx.refresh_ranges());
    }

    fn offset(&self) -> Point {
        self.metadata.scroll_offset
    }

    fn is_overscrolled(&self) -> bool {
        self.x.is_overscrolled() || self.y.is_overscrolled()
    }

    /// Composition edges the current overscroll hangs off. Negative
    /// overscroll pulls past the start of the axis (top/left edge).
    fn overscroll_sides(&self) -> SideBits {
        let mut sides = SideBits::NONE;
        if self.x.overscroll() < 0.0 {
            sides = sides.union(SideBits::LEFT);
        } else if self.x.overscroll() > 0.0 {
            sides = sides.union(SideBits::RIGHT);
        }
        if self.y.overscroll() < 0.0 {
            sides = sides.union(SideBits::TOP);
        } else if self.y.overscroll() > 0.0 {
            sides = sides.union(SideBits::BOTTOM);
        }
        sides
    }

    /// A gesture continuation arrived with no matching gesture open.
    /// Dropping it is correct, but it points at a confused event source,
    /// so leave a trace in the log.
    fn drop_mismatched(&self, event: &'static str) -> EventStatus {
        warn!(
            controller = ?self.id,
            state = ?self.state,
            event,
            "dropping event that does not match the gesture state"
        );
        EventStatus::Ignored
    }

    fn push_sample(&mut self, now: f64) {
        let frame = FrameState {
            scroll_offset: self.metadata.scroll_offset,
            zoom: self.metadata.zoom,
            generation: self.metadata.generation,
            sample_time: now,
        };
        // An unchanged visual state queues nothing, so an idle controller
        // stops asking for frames once the compositor drains the queue.
        if let Some(back) = self.sampled.back() {
            if back.scroll_offset == frame.scroll_offset
                && back.zoom == frame.zoom
                && back.generation == frame.generation
            {
                return;
            }
        }
        self.sampled.push(frame);
    }

    // ------------------------------------------------------------------
    // Pan handling
    // ------------------------------------------------------------------

    /// Decide the pan state and axis locks from the initial direction.
    fn start_panning(&mut self, direction: Vector, now: f64) {
        let angle = direction.angle();
        let state = match self.config.axis_lock_mode {
            AxisLockMode::Free => PanZoomState::Panning,
            _ => {
                if is_close_to_vertical(angle, self.config.axis_lock_angle) {
                    self.x.set_locked(true);
                    PanZoomState::PanningLockedX
                } else if is_close_to_horizontal(angle, self.config.axis_lock_angle) {
                    self.y.set_locked(true);
                    PanZoomState::PanningLockedY
                } else {
                    PanZoomState::Panning
                }
            }
        };
        self.set_state(state, now);
    }

    /// Re-evaluate an existing axis lock against the latest movement.
    fn handle_panning_update(&mut self, delta: Vector, now: f64) {
        if delta.length() < self.config.axis_breakout_threshold {
            return;
        }
        let angle = delta.angle();
        match self.config.axis_lock_mode {
            AxisLockMode::Free | AxisLockMode::Standard => {}
            AxisLockMode::Sticky => match self.state {
                // The lock may migrate to the other axis, never to free.
                PanZoomState::PanningLockedX
                    if is_close_to_horizontal(angle, self.config.axis_breakout_angle) =>
                {
                    self.x.set_locked(false);
                    self.y.set_locked(true);
                    self.set_state(PanZoomState::PanningLockedY, now);
                }
                PanZoomState::PanningLockedY
                    if is_close_to_vertical(angle, self.config.axis_breakout_angle) =>
                {
                    self.y.set_locked(false);
                    self.x.set_locked(true);
                    self.set_state(PanZoomState::PanningLockedX, now);
                }
                _ => {}
            },
            AxisLockMode::Breakable => {
                let broke = match self.state {
                    PanZoomState::PanningLockedX => {
                        is_close_to_horizontal(angle, self.config.axis_breakout_angle)
                    }
                    PanZoomState::PanningLockedY => {
                        is_close_to_vertical(angle, self.config.axis_breakout_angle)
                    }
                    _ => false,
                };
                if broke {
                    self.x.set_locked(false);
                    self.y.set_locked(false);
                    self.set_state(PanZoomState::Panning, now);
                }
            }
        }
    }

    /// Apply a scroll-direction displacement (screen units) during a pan.
    /// Returns the content-unit remainder eligible for handoff.
    fn apply_pan_displacement(&mut self, screen_delta: Vector, now: f64) -> Vector {
        let mut content = self.metadata.screen_to_content(screen_delta);
        // A locked axis drops its component outright; locked movement is
        // not handed to ancestors.
        if self.x.is_locked() {
            content.x = 0.0;
        }
        if self.y.is_locked() {
            content.y = 0.0;
        }
        self.pan_distance.x += content.x.abs();
        self.pan_distance.y += content.y.abs();
        // Movement along a disregarded direction (single-line text inputs)
        // becomes overscroll immediately, never scrolling or handoff.
        match self.metadata.disregarded_direction {
            Some(ScrollDirection::Horizontal) if content.x != 0.0 => {
                if self.config.allow_overscroll
                    && self.metadata.overscroll_behavior_x.allows_overscroll_effect()
                {
                    self.x.overscroll_by(content.x);
                }
                content.x = 0.0;
            }
            Some(ScrollDirection::Vertical) if content.y != 0.0 => {
                if self.config.allow_overscroll
                    && self.metadata.overscroll_behavior_y.allows_overscroll_effect()
                {
                    self.y.overscroll_by(content.y);
                }
                content.y = 0.0;
            }
            _ => {}
        }
        let (_, over) = self.with_ctx(now, |ctx| ctx.scroll_by(content));
        self.request_repaint(RepaintReason::UserInput);

        let mut unconsumed = Vector::ZERO;
        if over.x != 0.0 {
            if self.metadata.overscroll_behavior_x.allows_handoff() {
                unconsumed.x = over.x;
            } else if self.config.allow_overscroll
                && self.metadata.overscroll_behavior_x.allows_overscroll_effect()
                && self.pan_dominates_x()
            {
                self.x.overscroll_by(over.x);
            }
        }
        if over.y != 0.0 {
            if self.metadata.overscroll_behavior_y.allows_handoff() {
                unconsumed.y = over.y;
            } else if self.config.allow_overscroll
                && self.metadata.overscroll_behavior_y.allows_overscroll_effect()
                && self.pan_dominates_y()
            {
                self.y.overscroll_by(over.y);
            }
        }
        unconsumed
    }

    // An axis only enters overscroll when the gesture mostly moved along
    // it; sideways drift in a committed pan stays out of the stretch.
    fn pan_dominates_x(&self) -> bool {
        self.pan_distance.x >= self.pan_distance.y * self.config.overscroll_min_pan_distance_ratio
    }

    fn pan_dominates_y(&self) -> bool {
        self.pan_distance.y >= self.pan_distance.x * self.config.overscroll_min_pan_distance_ratio
    }

    /// Fling velocity in content units from the gesture trackers. Tracker
    /// velocity follows the finger; scrolling moves the opposite way.
    fn release_velocity(&mut self, now: f64) -> Vector {
        self.x.end_touch(true, now);
        self.y.end_touch(true, now);
        let zoom = self.metadata.zoom;
        let velocity = Vector::new(-self.x.velocity(), -self.y.velocity()) / zoom;
        self.x.set_velocity(velocity.x);
        self.y.set_velocity(velocity.y);
        velocity
    }

    /// Common end-of-pan logic: overscroll snap-back, fling, snap, or rest.
    fn handle_end_of_pan(&mut self, velocity: Vector, now: f64) {
        self.begin_batch();
        if self.is_overscrolled() {
            self.start_overscroll_animation(now);
        } else if velocity.length() > self.config.fling_min_velocity {
            let decay = FlingDecay::new(
                self.config.fling_friction,
                self.config.fling_stopped_threshold,
            );
            let predicted = self.offset()
                + Vector::new(
                    decay.predicted_distance(velocity.x),
                    decay.predicted_distance(velocity.y),
                );
            if let Some((dest, ids)) = self.metadata.snap.adjust_destination(
                self.offset(),
                predicted,
                SnapFlags::IntendedEndPosition,
            ) {
                self.start_msd_scroll(dest, velocity, Some(ids), now);
            } else {
                debug!(controller = ?self.id, ?velocity, "starting fling");
                self.animation = Some(Animation::Fling(FlingAnimation::new(
                    &self.config,
                    self.gesture_chain.clone(),
                    self.chain_index,
                )));
                self.set_state(PanZoomState::Fling, now);
            }
        } else {
            self.x.set_velocity(0.0);
            self.y.set_velocity(0.0);
            self.snap_at_rest_or_idle(now);
        }
        self.end_batch();
        self.request_repaint(RepaintReason::UserInput);
    }

    fn start_msd_scroll(
        &mut self,
        destination: Point,
        velocity: Vector,
        snap: Option<SnapTargetIds>,
        now: f64,
    ) {
        let (min_x, max_x) = self.metadata.scroll_range_x();
        let (min_y, max_y) = self.metadata.scroll_range_y();
        let destination =
            destination.clamp(Point::new(min_x, min_y), Point::new(max_x, max_y));
        self.pending_snap = snap;
        self.animation = Some(Animation::SmoothMsdScroll(MsdScrollAnimation::new(
            &self.config,
            self.offset(),
            velocity,
            destination,
        )));
        self.set_state(PanZoomState::SmoothMsdScroll, now);
    }

    fn start_overscroll_animation(&mut self, now: f64) {
        let animation = self.with_ctx(now, |ctx| OverscrollAnimation::from_context(ctx));
        self.animation = Some(Animation::Overscroll(animation));
        self.set_state(PanZoomState::OverscrollAnimation, now);
    }

    /// At rest with no momentum: land on a snap point if one applies,
    /// otherwise go idle.
    fn snap_at_rest_or_idle(&mut self, now: f64) {
        let offset = self.offset();
        if let Some((dest, ids)) = self.metadata.snap.adjust_destination(
            offset,
            offset,
            SnapFlags::IntendedEndPosition,
        ) {
            if (dest - offset).length() > COORD_EPSILON {
                self.start_msd_scroll(dest, Vector::ZERO, Some(ids), now);
                return;
            }
        }
        self.set_state(PanZoomState::Idle, now);
    }

    // ------------------------------------------------------------------
    // Pinch handling
    // ------------------------------------------------------------------

    fn pinch_span_travel(&self) -> f32 {
        match (self.pinch_buffer.first(), self.pinch_buffer.last()) {
            (Some(first), Some(last)) => (last.span - first.span).abs(),
            _ => 0.0,
        }
    }

    fn pinch_focus_travel(&self) -> f32 {
        match (self.pinch_buffer.first(), self.pinch_buffer.last()) {
            (Some(first), Some(last)) => (last.focus - first.focus).length(),
            _ => 0.0,
        }
    }

    fn buffer_pinch_sample(&mut self, sample: PinchSample) {
        let cutoff = sample.time - self.config.pinch_buffer_max_age_ms;
        self.pinch_buffer.retain(|s| s.time >= cutoff);
        self.pinch_buffer.push(sample);
    }

    /// Sliding-window pinch lock: whichever of span change and focus
    /// travel crosses its threshold first decides whether this gesture
    /// may zoom. Sticky mode can still break a scroll decision later with
    /// a large enough span change.
    fn evaluate_pinch_lock(&mut self) {
        if !self.pinch_decided {
            if self.pinch_span_travel() >= self.config.pinch_lock_span_threshold {
                self.pinch_decided = true;
                self.pinch_allow_zoom = true;
            } else if self.pinch_focus_travel() >= self.config.pinch_lock_scroll_threshold {
                self.pinch_decided = true;
                self.pinch_allow_zoom = false;
                trace!(controller = ?self.id, "pinch locked to scrolling");
            }
        } else if !self.pinch_allow_zoom
            && self.config.pinch_lock_mode == PinchLockMode::Sticky
            && self.pinch_span_travel() >= self.config.pinch_span_breakout_threshold
        {
            self.pinch_allow_zoom = true;
            trace!(controller = ?self.id, "pinch lock broken by span");
        }
    }

    /// Apply the zoom part of a pinch update about the screen-space focus.
    fn apply_pinch_zoom(&mut self, ratio: f32, focus: Point) {
        if !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        let zoom = self.metadata.zoom;
        let target = (zoom * ratio).clamp(self.config.min_zoom, self.config.max_zoom);
        let effective = target / zoom;
        if (effective - 1.0).abs() < f32::EPSILON {
            return;
        }
        let focus_content = self.metadata.scroll_offset + focus / zoom;
        self.metadata.scale_with_focus(effective, focus_content);
        self.refresh_ranges();
    }

    // ------------------------------------------------------------------
    // Wheel & keyboard scrolling
    // ------------------------------------------------------------------

    /// Clamp a destination to the scroll range, returning the clamped
    /// point and the remainder that fell outside it.
    fn clamp_destination(&self, destination: Point) -> (Point, Vector) {
        let (min_x, max_x) = self.metadata.scroll_range_x();
        let (min_y, max_y) = self.metadata.scroll_range_y();
        let clamped = destination.clamp(Point::new(min_x, min_y), Point::new(max_x, max_y));
        (clamped, destination - clamped)
    }

    fn handle_wheel(
        &mut self,
        delta: Vector,
        mode: WheelDeliveryMode,
        now: f64,
    ) -> Vector {
        let content_delta = self.metadata.screen_to_content(delta);
        // Successive wheel ticks extend an in-flight wheel animation from
        // its destination rather than from the current offset, so rapid
        // ticks accumulate instead of restarting.
        let base = match &self.animation {
            Some(Animation::WheelScroll(a)) => a.destination(),
            Some(Animation::SmoothMsdScroll(a))
                if self.state == PanZoomState::SmoothMsdScroll && self.pending_snap.is_some() =>
            {
                a.destination()
            }
            _ => self.offset(),
        };
        let (clamped, unconsumed) = self.clamp_destination(base + content_delta);
        let snap = self.metadata.snap.adjust_destination(
            self.offset(),
            clamped,
            SnapFlags::IntendedDirection,
        );

        match (mode, snap) {
            (_, Some((dest, ids))) => {
                // A snapping wheel always animates so it cannot jump past
                // its snap point, even in instant delivery mode.
                match &mut self.animation {
                    Some(Animation::SmoothMsdScroll(a))
                        if self.state == PanZoomState::SmoothMsdScroll =>
                    {
                        a.update_destination(dest);
                        self.pending_snap = Some(ids);
                    }
                    _ => {
                        let velocity = Vector::new(self.x.velocity(), self.y.velocity());
                        self.start_msd_scroll(dest, velocity, Some(ids), now);
                    }
                }
            }
            (WheelDeliveryMode::Instant, None) => {
                self.set_state(PanZoomState::WheelScroll, now);
                self.with_ctx(now, |ctx| ctx.set_offset(clamped));
                self.set_state(PanZoomState::Idle, now);
            }
            (WheelDeliveryMode::Smooth, None) => match &mut self.animation {
                Some(Animation::WheelScroll(a)) => {
                    let current = self.metadata.scroll_offset;
                    a.update_destination(current, clamped, now);
                }
                _ => {
                    self.animation = Some(Animation::WheelScroll(EasedScrollAnimation::new(
                        self.offset(),
                        clamped,
                        now,
                        self.config.wheel_scroll_duration_ms,
                        Easing::scroll(),
                    )));
                    self.set_state(PanZoomState::WheelScroll, now);
                }
            },
        }
        self.request_repaint(RepaintReason::UserInput);

        let mut handoff = Vector::ZERO;
        if unconsumed.x != 0.0 && self.metadata.overscroll_behavior_x.allows_handoff() {
            handoff.x = unconsumed.x;
        }
        if unconsumed.y != 0.0 && self.metadata.overscroll_behavior_y.allows_handoff() {
            handoff.y = unconsumed.y;
        }
        handoff
    }

    fn keyboard_destination(&self, action: glide_core::KeyboardScrollAction) -> Point {
        let offset = self.offset();
        let comp = self.metadata.composition_size_in_content();
        let (min_x, max_x) = self.metadata.scroll_range_x();
        let (min_y, max_y) = self.metadata.scroll_range_y();
        let sign = if action.forward { 1.0 } else { -1.0 };
        match action.unit {
            ScrollUnit::Line => {
                let step = self.config.line_scroll_distance / self.metadata.zoom * sign;
                if action.horizontal {
                    Point::new(offset.x + step, offset.y)
                } else {
                    Point::new(offset.x, offset.y + step)
                }
            }
            ScrollUnit::Page => {
                if action.horizontal {
                    Point::new(
                        offset.x + comp.x * self.config.page_scroll_fraction * sign,
                        offset.y,
                    )
                } else {
                    Point::new(
                        offset.x,
                        offset.y + comp.y * self.config.page_scroll_fraction * sign,
                    )
                }
            }
            ScrollUnit::Whole => {
                if action.horizontal {
                    Point::new(if action.forward { max_x } else { min_x }, offset.y)
                } else {
                    Point::new(offset.x, if action.forward { max_y } else { min_y })
                }
            }
        }
    }

    fn handle_keyboard_scroll(
        &mut self,
        action: glide_core::KeyboardScrollAction,
        now: f64,
    ) -> Vector {
        let (clamped, unconsumed) = self.clamp_destination(self.keyboard_destination(action));
        let flags = match action.unit {
            ScrollUnit::Whole => SnapFlags::IntendedEndPosition,
            _ => SnapFlags::IntendedDirection,
        };
        if let Some((dest, ids)) =
            self.metadata
                .snap
                .adjust_destination(self.offset(), clamped, flags)
        {
            let velocity = Vector::new(self.x.velocity(), self.y.velocity());
            self.start_msd_scroll(dest, velocity, Some(ids), now);
        } else {
            match &mut self.animation {
                Some(Animation::SmoothScroll(a))
                    if self.state == PanZoomState::KeyboardScroll =>
                {
                    let current = self.metadata.scroll_offset;
                    a.update_destination(current, clamped, now);
                }
                _ => {
                    self.animation = Some(Animation::SmoothScroll(EasedScrollAnimation::new(
                        self.offset(),
                        clamped,
                        now,
                        self.config.smooth_scroll_duration_ms,
                        Easing::scroll(),
                    )));
                    self.set_state(PanZoomState::KeyboardScroll, now);
                }
            }
        }
        self.request_repaint(RepaintReason::UserInput);

        let mut handoff = Vector::ZERO;
        if unconsumed.x != 0.0 && self.metadata.overscroll_behavior_x.allows_handoff() {
            handoff.x = unconsumed.x;
        }
        if unconsumed.y != 0.0 && self.metadata.overscroll_behavior_y.allows_handoff() {
            handoff.y = unconsumed.y;
        }
        handoff
    }

    // ------------------------------------------------------------------
    // Animation completion
    // ------------------------------------------------------------------

    fn on_animation_finished(&mut self, animation: Animation, now: f64) {
        trace!(controller = ?self.id, kind = animation.kind(), "animation finished");
        self.begin_batch();
        match animation {
            Animation::Fling(_) => {
                if self.is_overscrolled() {
                    self.start_overscroll_animation(now);
                } else {
                    self.snap_at_rest_or_idle(now);
                }
            }
            Animation::Overscroll(_) => {
                self.set_state(PanZoomState::Idle, now);
            }
            Animation::SmoothMsdScroll(_)
            | Animation::SmoothScroll(_)
            | Animation::WheelScroll(_) => {
                if let Some(ids) = self.pending_snap.take() {
                    self.notifications.push(Notification::SnapTargets(ids));
                }
                // Handed-off wheel or keyboard overscroll may have landed
                // here while the animation ran; spring it back now.
                if self.is_overscrolled() {
                    self.start_overscroll_animation(now);
                } else {
                    self.set_state(PanZoomState::Idle, now);
                }
            }
            Animation::Zoom(_) => {
                // A settled zoom wants a full-resolution repaint right away.
                self.deferred.push(DeferredTask::DelayedRepaint {
                    id: self.id,
                    deadline: now,
                });
                self.set_state(PanZoomState::Idle, now);
            }
            Animation::Autoscroll(_) => {
                self.set_state(PanZoomState::Idle, now);
            }
        }
        self.end_batch();
        self.request_repaint(RepaintReason::AnimationFrame);
    }
}

/// Shared handle to one controller. Clone the `Arc` freely; every method
/// is safe to call from any thread.
pub struct ControllerShared {
    id: ControllerId,
    state: Mutex<ControllerState>,
    observer: Arc<dyn ControllerObserver>,
}

impl ControllerShared {
    pub fn new(id: ControllerId, config: GlideConfig, observer: Arc<dyn ControllerObserver>) -> Self {
        Self {
            id,
            state: Mutex::new(ControllerState::new(id, config)),
            observer,
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap()
    }

    /// Release the lock, then dispatch recorded notifications in order.
    /// Returns the deferred tasks for the caller to run off-lock.
    fn finish(&self, mut guard: MutexGuard<'_, ControllerState>) -> Vec<DeferredTask> {
        let notifications = mem::take(&mut guard.notifications);
        let deferred = mem::take(&mut guard.deferred);
        drop(guard);
        for notification in notifications {
            match notification {
                Notification::TransformBegin => self.observer.on_transform_begin(self.id),
                Notification::TransformEnd => self.observer.on_transform_end(self.id),
                Notification::StateChange { old, new } => {
                    self.observer.on_state_change(self.id, old, new)
                }
                Notification::SnapTargets(ids) => self.observer.on_snap_targets(self.id, ids),
                Notification::Repaint(request) => self.observer.request_repaint(&request),
            }
        }
        deferred
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Feed one input event. `chain` is the handoff chain for the gesture,
    /// origin first; a standalone controller passes its own id only.
    pub fn handle_event(&self, event: &InputEvent, chain: &[ControllerId]) -> HandleResult {
        let now = event.time();
        let mut guard = self.lock();
        let mut unconsumed = Vector::ZERO;
        let status = match event {
            InputEvent::TouchStart { position, .. } => {
                if guard.state == PanZoomState::Pinching {
                    EventStatus::Ignored
                } else {
                    // Touching down catches any running animation; held
                    // overscroll is kept and released on touch end.
                    guard.animation = None;
                    guard.touch_start = *position;
                    guard.last_touch = *position;
                    guard.pan_distance = Vector::ZERO;
                    guard.gesture_chain = chain.to_vec();
                    guard.chain_index =
                        chain.iter().position(|&c| c == self.id).unwrap_or(0);
                    guard.x.start_touch(position.x, now);
                    guard.y.start_touch(position.y, now);
                    guard.set_state(PanZoomState::Touching, now);
                    EventStatus::Consumed
                }
            }
            InputEvent::TouchMove {
                position,
                historical,
                ..
            } => match guard.state {
                PanZoomState::Touching => {
                    for sample in historical {
                        guard.x.update_with_sample(sample.position.x, sample.time);
                        guard.y.update_with_sample(sample.position.y, sample.time);
                    }
                    guard.x.update_with_sample(position.x, now);
                    guard.y.update_with_sample(position.y, now);
                    let moved = *position - guard.touch_start;
                    if moved.length() > guard.config.touch_start_tolerance {
                        let displacement = guard.touch_start - *position;
                        guard.start_panning(displacement, now);
                        unconsumed = guard.apply_pan_displacement(displacement, now);
                        guard.last_touch = *position;
                        EventStatus::Consumed
                    } else {
                        EventStatus::Ignored
                    }
                }
                s if s.is_panning() => {
                    for sample in historical {
                        guard.x.update_with_sample(sample.position.x, sample.time);
                        guard.y.update_with_sample(sample.position.y, sample.time);
                    }
                    guard.x.update_with_sample(position.x, now);
                    guard.y.update_with_sample(position.y, now);
                    let displacement = guard.last_touch - *position;
                    guard.handle_panning_update(displacement, now);
                    unconsumed = guard.apply_pan_displacement(displacement, now);
                    guard.last_touch = *position;
                    EventStatus::Consumed
                }
                _ => guard.drop_mismatched("touch move"),
            },
            InputEvent::TouchEnd { .. } => match guard.state {
                PanZoomState::Touching => {
                    guard.x.cancel_gesture();
                    guard.y.cancel_gesture();
                    if guard.is_overscrolled() {
                        // The touch was holding caught overscroll.
                        guard.start_overscroll_animation(now);
                    } else {
                        guard.set_state(PanZoomState::Idle, now);
                    }
                    EventStatus::Consumed
                }
                s if s.is_panning() => {
                    let velocity = guard.release_velocity(now);
                    guard.handle_end_of_pan(velocity, now);
                    EventStatus::Consumed
                }
                _ => guard.drop_mismatched("touch end"),
            },
            InputEvent::TouchCancel { .. } => {
                guard.x.cancel_gesture();
                guard.y.cancel_gesture();
                guard.animation = None;
                if guard.is_overscrolled() {
                    guard.start_overscroll_animation(now);
                } else {
                    guard.set_state(PanZoomState::Idle, now);
                }
                EventStatus::Consumed
            }

            InputEvent::PanBegin { position, .. } => {
                guard.animation = None;
                guard.touch_start = *position;
                guard.last_touch = *position;
                guard.pan_distance = Vector::ZERO;
                guard.gesture_chain = chain.to_vec();
                guard.chain_index = chain.iter().position(|&c| c == self.id).unwrap_or(0);
                guard.x.start_touch(position.x, now);
                guard.y.start_touch(position.y, now);
                guard.set_state(PanZoomState::Touching, now);
                EventStatus::Consumed
            }
            InputEvent::PanUpdate { displacement, .. } => match guard.state {
                PanZoomState::Touching => {
                    guard.start_panning(*displacement, now);
                    let fx = guard.x.tracked_position() - displacement.x;
                    let fy = guard.y.tracked_position() - displacement.y;
                    guard.x.update_with_sample(fx, now);
                    guard.y.update_with_sample(fy, now);
                    unconsumed = guard.apply_pan_displacement(*displacement, now);
                    EventStatus::Consumed
                }
                s if s.is_panning() => {
                    // Synthesize finger positions so the release velocity
                    // comes out of the same tracker path as touch pans.
                    let fx = guard.x.tracked_position() - displacement.x;
                    let fy = guard.y.tracked_position() - displacement.y;
                    guard.x.update_with_sample(fx, now);
                    guard.y.update_with_sample(fy, now);
                    guard.handle_panning_update(*displacement, now);
                    unconsumed = guard.apply_pan_displacement(*displacement, now);
                    EventStatus::Consumed
                }
                _ => guard.drop_mismatched("pan update"),
            },
            InputEvent::PanEnd {
                simulate_momentum, ..
            } => match guard.state {
                PanZoomState::Touching => {
                    guard.x.cancel_gesture();
                    guard.y.cancel_gesture();
                    guard.set_state(PanZoomState::Idle, now);
                    EventStatus::Consumed
                }
                s if s.is_panning() => {
                    if *simulate_momentum {
                        let velocity = guard.release_velocity(now);
                        guard.handle_end_of_pan(velocity, now);
                    } else {
                        // Platform momentum events follow; the transform-end
                        // grace keeps the transform alive across the gap.
                        guard.x.end_touch(true, now);
                        guard.y.end_touch(true, now);
                        guard.x.set_velocity(0.0);
                        guard.y.set_velocity(0.0);
                        if guard.is_overscrolled() {
                            guard.start_overscroll_animation(now);
                        } else {
                            guard.set_state(PanZoomState::Idle, now);
                        }
                    }
                    EventStatus::Consumed
                }
                _ => guard.drop_mismatched("pan end"),
            },
            InputEvent::PanMomentumStart { .. } => {
                if guard.state == PanZoomState::Idle
                    || guard.state == PanZoomState::OverscrollAnimation
                {
                    guard.animation = None;
                    guard.set_state(PanZoomState::PanMomentum, now);
                    EventStatus::Consumed
                } else {
                    EventStatus::Ignored
                }
            }
            InputEvent::PanMomentumUpdate { displacement, .. } => {
                if guard.state == PanZoomState::PanMomentum {
                    unconsumed = guard.apply_pan_displacement(*displacement, now);
                    EventStatus::Consumed
                } else {
                    guard.drop_mismatched("pan momentum update")
                }
            }
            InputEvent::PanMomentumEnd { .. } => {
                if guard.state == PanZoomState::PanMomentum {
                    guard.begin_batch();
                    if guard.is_overscrolled() {
                        guard.start_overscroll_animation(now);
                    } else {
                        guard.snap_at_rest_or_idle(now);
                    }
                    guard.end_batch();
                    EventStatus::Consumed
                } else {
                    guard.drop_mismatched("pan momentum end")
                }
            }

            InputEvent::PinchStart { focus, .. } => {
                guard.animation = None;
                guard.pan_distance = Vector::ZERO;
                guard.gesture_chain = chain.to_vec();
                guard.chain_index = chain.iter().position(|&c| c == self.id).unwrap_or(0);
                guard.pinch_buffer.clear();
                guard.pinch_decided = guard.config.pinch_lock_mode == PinchLockMode::Free;
                guard.pinch_allow_zoom = guard.pinch_decided;
                guard.last_pinch_focus = *focus;
                guard.buffer_pinch_sample(PinchSample {
                    time: now,
                    span: 0.0,
                    focus: *focus,
                });
                guard.set_state(PanZoomState::Pinching, now);
                EventStatus::Consumed
            }
            InputEvent::PinchUpdate {
                focus,
                current_span,
                previous_span,
                ..
            } => {
                if guard.state != PanZoomState::Pinching {
                    guard.drop_mismatched("pinch update")
                } else {
                    // The very first sample has a placeholder span; fix it
                    // up so span travel measures real change only.
                    if guard.pinch_buffer.len() == 1 && guard.pinch_buffer[0].span == 0.0 {
                        guard.pinch_buffer[0].span = *previous_span;
                    }
                    guard.buffer_pinch_sample(PinchSample {
                        time: now,
                        span: *current_span,
                        focus: *focus,
                    });
                    guard.evaluate_pinch_lock();

                    if guard.pinch_allow_zoom
                        && guard.config.allow_zoom
                        && *previous_span > COORD_EPSILON
                    {
                        let ratio = current_span / previous_span;
                        guard.apply_pinch_zoom(ratio, *focus);
                    }

                    // The focus delta always scrolls, even at span ratio 1.
                    let focus_delta = guard.last_pinch_focus - *focus;
                    guard.last_pinch_focus = *focus;
                    unconsumed = guard.apply_pan_displacement(focus_delta, now);
                    EventStatus::Consumed
                }
            }
            InputEvent::PinchEnd {
                finger_lifted,
                focus,
                ..
            } => {
                if guard.state != PanZoomState::Pinching {
                    guard.drop_mismatched("pinch end")
                } else {
                    let deadline = now + guard.config.pinch_repaint_delay_ms;
                    guard.deferred.push(DeferredTask::DelayedRepaint {
                        id: self.id,
                        deadline,
                    });
                    if *finger_lifted {
                        // One finger remains; the gesture degrades to touch.
                        guard.touch_start = *focus;
                        guard.last_touch = *focus;
                        guard.x.start_touch(focus.x, now);
                        guard.y.start_touch(focus.y, now);
                        guard.set_state(PanZoomState::Touching, now);
                    } else {
                        guard.begin_batch();
                        if guard.is_overscrolled() {
                            guard.start_overscroll_animation(now);
                        } else {
                            guard.snap_at_rest_or_idle(now);
                        }
                        guard.end_batch();
                    }
                    EventStatus::Consumed
                }
            }

            InputEvent::Tap { kind, position, .. } => match kind {
                TapKind::Double if guard.config.allow_zoom => {
                    let zoom = guard.metadata.zoom;
                    // Toggle: an already zoomed-in region returns to base
                    // scale, otherwise double the scale about the tap point.
                    let target = if zoom > 1.01 {
                        1.0f32.clamp(guard.config.min_zoom, guard.config.max_zoom)
                    } else {
                        (zoom * 2.0).clamp(guard.config.min_zoom, guard.config.max_zoom)
                    };
                    let focus_content = guard.metadata.scroll_offset + *position / zoom;
                    let mut preview = guard.metadata.clone();
                    preview.scale_with_focus(target / zoom, focus_content);
                    guard.animation = Some(Animation::Zoom(ZoomAnimation::new(
                        &guard.config,
                        zoom,
                        target,
                        guard.metadata.scroll_offset,
                        preview.scroll_offset,
                        now,
                    )));
                    guard.set_state(PanZoomState::AnimatingZoom, now);
                    EventStatus::Consumed
                }
                _ => EventStatus::DefaultAction,
            },

            InputEvent::Wheel { delta, mode, .. } => {
                unconsumed = guard.handle_wheel(*delta, *mode, now);
                EventStatus::Consumed
            }
            InputEvent::KeyboardScroll { action, .. } => {
                unconsumed = guard.handle_keyboard_scroll(*action, now);
                EventStatus::Consumed
            }

            InputEvent::ScrollbarDragStart { vertical, .. } => {
                guard.animation = None;
                guard.scrollbar_vertical = *vertical;
                guard.set_state(PanZoomState::ScrollbarDrag, now);
                EventStatus::Consumed
            }
            InputEvent::ScrollbarDragUpdate { thumb_fraction, .. } => {
                if guard.state != PanZoomState::ScrollbarDrag {
                    guard.drop_mismatched("scrollbar drag update")
                } else {
                    let fraction = thumb_fraction.clamp(0.0, 1.0);
                    let mut target = guard.offset();
                    if guard.scrollbar_vertical {
                        let (min, max) = guard.metadata.scroll_range_y();
                        target.y = min + fraction * (max - min);
                    } else {
                        let (min, max) = guard.metadata.scroll_range_x();
                        target.x = min + fraction * (max - min);
                    }
                    guard.with_ctx(now, |ctx| ctx.set_offset(target));
                    guard.request_repaint(RepaintReason::UserInput);
                    EventStatus::Consumed
                }
            }
            InputEvent::ScrollbarDragEnd { .. } => {
                if guard.state != PanZoomState::ScrollbarDrag {
                    guard.drop_mismatched("scrollbar drag end")
                } else {
                    guard.begin_batch();
                    guard.snap_at_rest_or_idle(now);
                    guard.end_batch();
                    EventStatus::Consumed
                }
            }

            InputEvent::AutoscrollStart { anchor, .. } => {
                guard.animation = Some(Animation::Autoscroll(AutoscrollAnimation::new(*anchor)));
                guard.set_state(PanZoomState::Autoscroll, now);
                EventStatus::Consumed
            }
            InputEvent::AutoscrollUpdate { position, .. } => {
                if let Some(Animation::Autoscroll(a)) = &mut guard.animation {
                    a.set_pointer(*position);
                    EventStatus::Consumed
                } else {
                    guard.drop_mismatched("autoscroll update")
                }
            }
            InputEvent::AutoscrollStop { .. } => {
                if guard.state == PanZoomState::Autoscroll {
                    guard.animation = None;
                    guard.begin_batch();
                    guard.snap_at_rest_or_idle(now);
                    guard.end_batch();
                    EventStatus::Consumed
                } else {
                    guard.drop_mismatched("autoscroll stop")
                }
            }
        };
        let deferred = self.finish(guard);
        HandleResult::new(status, unconsumed, deferred)
    }

    // ------------------------------------------------------------------
    // Handoff entry points (called by the tree, one lock at a time)
    // ------------------------------------------------------------------

    /// Consume as much of `delta` (content units) as the scroll range
    /// allows. Returns the remainder plus any deferred work.
    pub fn consume_scroll(&self, delta: Vector, now: f64) -> (Vector, Vec<DeferredTask>) {
        let mut guard = self.lock();
        let (consumed, over) = guard.with_ctx(now, |ctx| ctx.scroll_by(delta));
        if !consumed.is_zero() {
            guard.request_repaint(RepaintReason::UserInput);
        }
        let mut remainder = Vector::ZERO;
        if over.x != 0.0 && guard.metadata.overscroll_behavior_x.allows_handoff() {
            remainder.x = over.x;
        }
        if over.y != 0.0 && guard.metadata.overscroll_behavior_y.allows_handoff() {
            remainder.y = over.y;
        }
        let deferred = self.finish(guard);
        (remainder, deferred)
    }

    /// Accumulate gesture overscroll that nothing in the chain consumed.
    pub fn apply_gesture_overscroll(&self, delta: Vector, _now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        if guard.config.allow_overscroll {
            if delta.x != 0.0 && guard.metadata.overscroll_behavior_x.allows_overscroll_effect() {
                guard.x.overscroll_by(delta.x);
            }
            if delta.y != 0.0 && guard.metadata.overscroll_behavior_y.allows_overscroll_effect() {
                guard.y.overscroll_by(delta.y);
            }
            guard.request_repaint(RepaintReason::UserInput);
        }
        self.finish(guard)
    }

    /// Take over a fling arriving through handoff. Axis components the
    /// controller cannot use are returned as residual velocity.
    pub fn accept_fling(
        &self,
        velocity: Vector,
        chain: &[ControllerId],
        index: usize,
        now: f64,
    ) -> (Vector, Vec<DeferredTask>) {
        let mut guard = self.lock();
        let mut accepted = Vector::ZERO;
        let mut residual = Vector::ZERO;
        if guard.x.can_scroll_delta(velocity.x) {
            accepted.x = velocity.x;
        } else {
            residual.x = velocity.x;
        }
        if guard.y.can_scroll_delta(velocity.y) {
            accepted.y = velocity.y;
        } else {
            residual.y = velocity.y;
        }
        if !accepted.is_zero() {
            debug!(controller = ?self.id, ?accepted, "accepting handed-off fling");
            guard.x.set_velocity(accepted.x);
            guard.y.set_velocity(accepted.y);
            guard.gesture_chain = chain.to_vec();
            guard.chain_index = index;
            guard.animation = Some(Animation::Fling(FlingAnimation::new(
                &guard.config,
                chain.to_vec(),
                index,
            )));
            guard.set_state(PanZoomState::Fling, now);
        }
        let deferred = self.finish(guard);
        (residual, deferred)
    }

    /// Convert residual fling velocity that exhausted the handoff chain
    /// into a held-then-released overscroll spring.
    pub fn overscroll_from_fling(&self, velocity: Vector, now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        if !guard.config.allow_overscroll {
            return self.finish(guard);
        }
        let mut v = Vector::ZERO;
        if guard.metadata.overscroll_behavior_x.allows_overscroll_effect() {
            v.x = velocity.x;
        }
        if guard.metadata.overscroll_behavior_y.allows_overscroll_effect() {
            v.y = velocity.y;
        }
        if !v.is_zero() {
            guard.x.set_velocity(v.x);
            guard.y.set_velocity(v.y);
            guard.start_overscroll_animation(now);
        }
        self.finish(guard)
    }

    /// Start the snap-back spring if the controller is resting while
    /// overscrolled, e.g. after receiving handed-off gesture overscroll.
    pub fn release_overscroll(&self, now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        if guard.is_overscrolled()
            && guard.animation.is_none()
            && matches!(guard.state, PanZoomState::Idle | PanZoomState::Touching)
        {
            guard.start_overscroll_animation(now);
        }
        self.finish(guard)
    }

    // ------------------------------------------------------------------
    // Frame driving
    // ------------------------------------------------------------------

    /// Advance the running animation to `now` and queue a compositing
    /// sample. Calling twice with the same timestamp replaces the queued
    /// sample instead of advancing again.
    pub fn update_animation(&self, now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        if guard.last_sample_time == Some(now) {
            guard.push_sample(now);
            return self.finish(guard);
        }
        let dt = guard
            .last_sample_time
            .map(|t| (now - t).max(0.0))
            .unwrap_or(0.0);
        guard.last_sample_time = Some(now);

        if let Some(mut animation) = guard.animation.take() {
            let result = guard.with_ctx(now, |ctx| animation.sample(ctx, dt));
            match result {
                SampleResult::Continue => {
                    guard.animation = Some(animation);
                    guard.request_repaint(RepaintReason::AnimationFrame);
                }
                SampleResult::Finished => guard.on_animation_finished(animation, now),
            }
        }
        guard.push_sample(now);
        self.finish(guard)
    }

    /// The transform the compositor should apply this frame, and whether
    /// another frame should be scheduled.
    pub fn sample_for_composite(&self) -> (FrameTransform, bool) {
        let mut guard = self.lock();
        let overscroll = Vector::new(guard.x.stretch(), guard.y.stretch());
        let overscroll_sides = guard.overscroll_sides();
        let transform = match guard.sampled.front() {
            Some(front) => FrameTransform {
                scroll_offset: front.scroll_offset,
                zoom: front.zoom,
                overscroll,
                overscroll_sides,
            },
            None => FrameTransform {
                scroll_offset: guard.metadata.scroll_offset,
                zoom: guard.metadata.zoom,
                overscroll,
                overscroll_sides,
            },
        };
        guard.sampled.advance();
        let wants_frame = guard.animation.is_some()
            || guard.sampled.has_pending()
            || guard.is_overscrolled();
        (transform, wants_frame)
    }

    /// Whether the next frame would change anything, without consuming a
    /// compositing sample.
    pub fn wants_frame(&self) -> bool {
        let guard = self.lock();
        guard.animation.is_some() || guard.sampled.has_pending() || guard.is_overscrolled()
    }

    // ------------------------------------------------------------------
    // Content synchronization
    // ------------------------------------------------------------------

    /// Adopt an authoritative metadata update from the content thread.
    ///
    /// `first_paint` clobbers everything including zoom and any running
    /// animation. Otherwise a `relative` update applies the content-side
    /// delta on top of the async offset and keeps animations running; an
    /// absolute update adopts the content offset outright (programmatic
    /// scroll) and cancels whatever was animating.
    pub fn notify_layers_updated(
        &self,
        new: ScrollMetadata,
        first_paint: bool,
        relative: bool,
        now: f64,
    ) -> Result<Vec<DeferredTask>, MetadataError> {
        new.validate()?;
        let mut guard = self.lock();
        if first_paint {
            guard.animation = None;
            guard.x.cancel_gesture();
            guard.y.cancel_gesture();
            guard.x.clear_overscroll();
            guard.y.clear_overscroll();
            guard.last_content_offset = new.scroll_offset;
            guard.metadata = new;
            guard.set_state(PanZoomState::Idle, now);
        } else {
            let zoom = guard.metadata.zoom;
            let offset = if relative {
                guard.metadata.scroll_offset + (new.scroll_offset - guard.last_content_offset)
            } else {
                guard.animation = None;
                new.scroll_offset
            };
            guard.last_content_offset = new.scroll_offset;
            guard.metadata = ScrollMetadata {
                zoom,
                scroll_offset: offset,
                ..new
            };
        }
        guard.refresh_ranges();
        Ok(self.finish(guard))
    }

    pub fn update_config(&self, config: GlideConfig) {
        let mut guard = self.lock();
        guard.x.apply_config(&config);
        guard.y.apply_config(&config);
        guard.config = config;
        drop(guard);
    }

    // ------------------------------------------------------------------
    // Deferred-task callbacks
    // ------------------------------------------------------------------

    /// Fire the delayed transform-end if its grace window elapsed with the
    /// controller still at rest.
    pub fn run_transform_end(&self, now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        guard.maybe_fire_transform_end(now);
        self.finish(guard)
    }

    /// Full-resolution repaint after zoom activity settles.
    pub fn run_delayed_repaint(&self, _now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        if guard.state == PanZoomState::Pinching {
            // A new pinch started before the delay elapsed.
            return self.finish(guard);
        }
        guard.request_repaint(RepaintReason::DelayedZoom);
        self.finish(guard)
    }

    /// Drop the running animation and any overscroll, returning to rest.
    pub fn cancel_animation(&self, now: f64) -> Vec<DeferredTask> {
        let mut guard = self.lock();
        if guard.animation.is_some() {
            warn!(controller = ?self.id, "cancelling running animation");
        }
        guard.animation = None;
        guard.x.clear_overscroll();
        guard.y.clear_overscroll();
        guard.x.set_velocity(0.0);
        guard.y.set_velocity(0.0);
        guard.set_state(PanZoomState::Idle, now);
        self.finish(guard)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn pan_zoom_state(&self) -> PanZoomState {
        self.lock().state
    }

    pub fn scroll_offset(&self) -> Point {
        self.lock().metadata.scroll_offset
    }

    pub fn zoom(&self) -> f32 {
        self.lock().metadata.zoom
    }

    pub fn is_overscrolled(&self) -> bool {
        self.lock().is_overscrolled()
    }

    pub fn overscroll(&self) -> Vector {
        let guard = self.lock();
        Vector::new(guard.x.overscroll(), guard.y.overscroll())
    }
}

impl std::fmt::Debug for ControllerShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerShared")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
