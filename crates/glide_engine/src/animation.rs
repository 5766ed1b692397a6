//! Frame animations
//!
//! Each controller runs at most one animation at a time, expressed as a
//! single tagged union so a state transition can always tell exactly what
//! the controller is doing. Every variant is sampled against an
//! [`AnimationContext`] that exposes the live metadata, axes and config
//! without the animation holding any reference of its own.

use glide_animation::{Easing, FlingDecay, Spring, SpringConfig};
use glide_core::{GlideConfig, Point, Vector};
use tracing::trace;

use crate::axis::Axis;
use crate::metadata::ScrollMetadata;
use crate::observer::DeferredTask;
use crate::ControllerId;

/// Outcome of one animation sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleResult {
    Continue,
    Finished,
}

/// Mutable view of a controller's scroll state handed to an animation for
/// one sample. Mutations go through the helpers so the metadata offset and
/// the per-axis positions never diverge.
pub struct AnimationContext<'a> {
    pub id: ControllerId,
    pub metadata: &'a mut ScrollMetadata,
    pub x: &'a mut Axis,
    pub y: &'a mut Axis,
    pub config: &'a GlideConfig,
    pub deferred: &'a mut Vec<DeferredTask>,
    /// Sample timestamp in milliseconds.
    pub now: f64,
}

impl AnimationContext<'_> {
    pub fn offset(&self) -> Point {
        self.metadata.scroll_offset
    }

    /// Move to an absolute offset, clamped to the scroll range.
    pub fn set_offset(&mut self, target: Point) {
        self.metadata.scroll_offset = target;
        self.metadata.clamp_scroll_offset();
        self.x.set_position(self.metadata.scroll_offset.x);
        self.y.set_position(self.metadata.scroll_offset.y);
    }

    /// Apply a displacement through the axes, returning the consumed and
    /// overscroll parts per axis.
    pub fn scroll_by(&mut self, delta: Vector) -> (Vector, Vector) {
        let ax = self.x.adjust_displacement(delta.x);
        let ay = self.y.adjust_displacement(delta.y);
        self.metadata.scroll_offset = Point::new(self.x.position(), self.y.position());
        (
            Vector::new(ax.consumed, ay.consumed),
            Vector::new(ax.overscroll, ay.overscroll),
        )
    }

    /// Re-derive axis ranges from the metadata; must run after any zoom
    /// change since the range depends on the zoom.
    pub fn refresh_ranges(&mut self) {
        let comp = self.metadata.composition_size_in_content();
        let (min_x, max_x) = self.metadata.scroll_range_x();
        let (min_y, max_y) = self.metadata.scroll_range_y();
        self.x.set_range(min_x, max_x, comp.x);
        self.y.set_range(min_y, max_y, comp.y);
        self.metadata.clamp_scroll_offset();
        self.x.set_position(self.metadata.scroll_offset.x);
        self.y.set_position(self.metadata.scroll_offset.y);
    }

    fn overscroll_spring(&self, value: f32, velocity: f32) -> Spring {
        let config = SpringConfig::with_damping_ratio(
            self.config.overscroll_spring_stiffness,
            self.config.overscroll_spring_damping_ratio,
            1.0,
        );
        let mut spring = Spring::with_velocity(config, value, velocity);
        spring.set_target(0.0);
        spring
    }
}

/// Momentum scrolling after a released pan.
///
/// Velocity decays by an exponential friction model; when an axis hits its
/// scroll boundary with velocity left over, the residual is handed to the
/// next controller in the handoff chain (or converted into overscroll at
/// the end of the chain).
#[derive(Debug, Clone)]
pub struct FlingAnimation {
    decay: FlingDecay,
    /// Handoff chain captured when the fling started; `index` is this
    /// controller's position in it.
    chain: Vec<ControllerId>,
    index: usize,
}

impl FlingAnimation {
    pub fn new(config: &GlideConfig, chain: Vec<ControllerId>, index: usize) -> Self {
        Self {
            decay: FlingDecay::new(config.fling_friction, config.fling_stopped_threshold),
            chain,
            index,
        }
    }

    fn sample(&mut self, ctx: &mut AnimationContext, dt_ms: f64) -> SampleResult {
        let vx = self.decay.step(ctx.x.velocity(), dt_ms);
        let vy = self.decay.step(ctx.y.velocity(), dt_ms);
        ctx.x.set_velocity(vx);
        ctx.y.set_velocity(vy);

        let displacement = Vector::new(vx * dt_ms as f32, vy * dt_ms as f32);
        let (_, over) = ctx.scroll_by(displacement);

        let mut residual = Vector::ZERO;
        let mut entered_overscroll = false;
        if over.x != 0.0 {
            if ctx.metadata.overscroll_behavior_x.allows_handoff()
                && self.index + 1 < self.chain.len()
            {
                residual.x = vx;
            } else if ctx.config.allow_overscroll
                && ctx.metadata.overscroll_behavior_x.allows_overscroll_effect()
            {
                ctx.x.overscroll_by(over.x);
                entered_overscroll = true;
            }
            ctx.x.set_velocity(0.0);
        }
        if over.y != 0.0 {
            if ctx.metadata.overscroll_behavior_y.allows_handoff()
                && self.index + 1 < self.chain.len()
            {
                residual.y = vy;
            } else if ctx.config.allow_overscroll
                && ctx.metadata.overscroll_behavior_y.allows_overscroll_effect()
            {
                ctx.y.overscroll_by(over.y);
                entered_overscroll = true;
            }
            ctx.y.set_velocity(0.0);
        }

        if !residual.is_zero() {
            trace!(?residual, "fling hit boundary, handing off residual");
            ctx.deferred.push(DeferredTask::HandoffFling {
                chain: self.chain.clone(),
                index: self.index + 1,
                velocity: residual,
            });
        }

        // Once an axis is overscrolled the snap-back spring takes over,
        // carrying the velocity it had at the boundary.
        if entered_overscroll {
            ctx.x.set_velocity(vx);
            ctx.y.set_velocity(vy);
            return SampleResult::Finished;
        }

        if self.decay.is_stopped(ctx.x.velocity()) && self.decay.is_stopped(ctx.y.velocity()) {
            ctx.x.set_velocity(0.0);
            ctx.y.set_velocity(0.0);
            SampleResult::Finished
        } else {
            SampleResult::Continue
        }
    }
}

/// Bezier-eased scroll to a fixed destination over a fixed duration.
#[derive(Debug, Clone)]
pub struct EasedScrollAnimation {
    start: Point,
    destination: Point,
    start_time: f64,
    duration_ms: f64,
    easing: Easing,
}

impl EasedScrollAnimation {
    pub fn new(
        start: Point,
        destination: Point,
        start_time: f64,
        duration_ms: f64,
        easing: Easing,
    ) -> Self {
        Self {
            start,
            destination,
            start_time,
            duration_ms: duration_ms.max(1.0),
            easing,
        }
    }

    pub fn destination(&self) -> Point {
        self.destination
    }

    /// Retarget mid-flight: the curve restarts from the current offset so
    /// the motion stays continuous.
    pub fn update_destination(&mut self, current: Point, destination: Point, now: f64) {
        self.start = current;
        self.destination = destination;
        self.start_time = now;
    }

    fn sample(&mut self, ctx: &mut AnimationContext) -> SampleResult {
        let t = ((ctx.now - self.start_time) / self.duration_ms).clamp(0.0, 1.0);
        let eased = self.easing.apply(t as f32);
        let position = self.start + (self.destination - self.start) * eased;
        ctx.set_offset(position);
        if t >= 1.0 {
            SampleResult::Finished
        } else {
            SampleResult::Continue
        }
    }
}

/// Spring-driven scroll to a destination, used when landing on a snap
/// point: unlike the eased curve it carries initial velocity, so a fling
/// retargeted onto a snap point decelerates naturally.
#[derive(Debug, Clone)]
pub struct MsdScrollAnimation {
    spring_x: Spring,
    spring_y: Spring,
}

impl MsdScrollAnimation {
    pub fn new(
        config: &GlideConfig,
        current: Point,
        velocity: Vector,
        destination: Point,
    ) -> Self {
        let spring_config = SpringConfig::with_damping_ratio(
            config.smooth_scroll_spring_stiffness,
            config.smooth_scroll_damping_ratio,
            1.0,
        );
        // Axis velocities are px/ms; the spring integrates in seconds.
        let mut spring_x = Spring::with_velocity(spring_config, current.x, velocity.x * 1000.0);
        let mut spring_y = Spring::with_velocity(spring_config, current.y, velocity.y * 1000.0);
        spring_x.set_target(destination.x);
        spring_y.set_target(destination.y);
        Self { spring_x, spring_y }
    }

    pub fn destination(&self) -> Point {
        Point::new(self.spring_x.target(), self.spring_y.target())
    }

    pub fn update_destination(&mut self, destination: Point) {
        self.spring_x.set_target(destination.x);
        self.spring_y.set_target(destination.y);
    }

    fn sample(&mut self, ctx: &mut AnimationContext, dt_ms: f64) -> SampleResult {
        let dt = (dt_ms / 1000.0) as f32;
        self.spring_x.step(dt);
        self.spring_y.step(dt);
        ctx.set_offset(Point::new(self.spring_x.value(), self.spring_y.value()));
        if self.spring_x.is_settled() && self.spring_y.is_settled() {
            SampleResult::Finished
        } else {
            SampleResult::Continue
        }
    }
}

/// Eased zoom to a target scale and offset (double-tap, zoom-to-rect).
#[derive(Debug, Clone)]
pub struct ZoomAnimation {
    start_zoom: f32,
    target_zoom: f32,
    start_offset: Point,
    target_offset: Point,
    start_time: f64,
    duration_ms: f64,
    easing: Easing,
}

impl ZoomAnimation {
    pub fn new(
        config: &GlideConfig,
        start_zoom: f32,
        target_zoom: f32,
        start_offset: Point,
        target_offset: Point,
        start_time: f64,
    ) -> Self {
        Self {
            start_zoom,
            target_zoom: target_zoom.clamp(config.min_zoom, config.max_zoom),
            start_offset,
            target_offset,
            start_time,
            duration_ms: config.zoom_animation_duration_ms.max(1.0),
            easing: Easing::zoom(),
        }
    }

    fn sample(&mut self, ctx: &mut AnimationContext) -> SampleResult {
        let t = ((ctx.now - self.start_time) / self.duration_ms).clamp(0.0, 1.0);
        let eased = self.easing.apply(t as f32);
        ctx.metadata.zoom = self.start_zoom + (self.target_zoom - self.start_zoom) * eased;
        ctx.refresh_ranges();
        ctx.set_offset(self.start_offset + (self.target_offset - self.start_offset) * eased);
        if t >= 1.0 {
            ctx.metadata.zoom = self.target_zoom;
            ctx.refresh_ranges();
            SampleResult::Finished
        } else {
            SampleResult::Continue
        }
    }
}

/// Spring-driven snap-back of overscroll to zero.
#[derive(Debug, Clone)]
pub struct OverscrollAnimation {
    spring_x: Spring,
    spring_y: Spring,
}

impl OverscrollAnimation {
    /// Build from the current overscroll and the velocity the axes carried
    /// into the boundary (px/ms).
    pub fn from_context(ctx: &AnimationContext) -> Self {
        Self {
            spring_x: ctx.overscroll_spring(ctx.x.overscroll(), ctx.x.velocity() * 1000.0),
            spring_y: ctx.overscroll_spring(ctx.y.overscroll(), ctx.y.velocity() * 1000.0),
        }
    }

    fn sample(&mut self, ctx: &mut AnimationContext, dt_ms: f64) -> SampleResult {
        let dt = (dt_ms / 1000.0) as f32;
        self.spring_x.step(dt);
        self.spring_y.step(dt);
        ctx.x.set_overscroll(self.spring_x.value());
        ctx.y.set_overscroll(self.spring_y.value());
        if self.spring_x.is_settled() && self.spring_y.is_settled() {
            ctx.x.clear_overscroll();
            ctx.y.clear_overscroll();
            ctx.x.set_velocity(0.0);
            ctx.y.set_velocity(0.0);
            SampleResult::Finished
        } else {
            SampleResult::Continue
        }
    }
}

/// Continuous scrolling toward the pointer during middle-click autoscroll.
/// Velocity is proportional to the pointer's offset from the anchor; the
/// animation only ends when the gesture is cancelled.
#[derive(Debug, Clone)]
pub struct AutoscrollAnimation {
    anchor: Point,
    pointer: Point,
}

impl AutoscrollAnimation {
    pub fn new(anchor: Point) -> Self {
        Self {
            anchor,
            pointer: anchor,
        }
    }

    pub fn set_pointer(&mut self, pointer: Point) {
        self.pointer = pointer;
    }

    fn sample(&mut self, ctx: &mut AnimationContext, dt_ms: f64) -> SampleResult {
        let velocity = (self.pointer - self.anchor) * ctx.config.autoscroll_gain;
        let displacement = ctx.metadata.screen_to_content(velocity * dt_ms as f32);
        ctx.scroll_by(displacement);
        SampleResult::Continue
    }
}

/// The single animation slot of a controller.
#[derive(Debug, Clone)]
pub enum Animation {
    Fling(FlingAnimation),
    /// Programmatic smooth scroll (content-requested).
    SmoothScroll(EasedScrollAnimation),
    /// Spring-driven scroll used for snapping.
    SmoothMsdScroll(MsdScrollAnimation),
    Zoom(ZoomAnimation),
    Overscroll(OverscrollAnimation),
    /// Wheel and keyboard scrolling; kept distinct from `SmoothScroll` so
    /// successive wheel ticks extend it rather than restarting it.
    WheelScroll(EasedScrollAnimation),
    Autoscroll(AutoscrollAnimation),
}

impl Animation {
    /// Advance by `dt_ms` and apply the result through `ctx`.
    pub fn sample(&mut self, ctx: &mut AnimationContext, dt_ms: f64) -> SampleResult {
        match self {
            Animation::Fling(a) => a.sample(ctx, dt_ms),
            Animation::SmoothScroll(a) | Animation::WheelScroll(a) => a.sample(ctx),
            Animation::SmoothMsdScroll(a) => a.sample(ctx, dt_ms),
            Animation::Zoom(a) => a.sample(ctx),
            Animation::Overscroll(a) => a.sample(ctx, dt_ms),
            Animation::Autoscroll(a) => a.sample(ctx, dt_ms),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Animation::Fling(_) => "fling",
            Animation::SmoothScroll(_) => "smooth_scroll",
            Animation::SmoothMsdScroll(_) => "smooth_msd_scroll",
            Animation::Zoom(_) => "zoom",
            Animation::Overscroll(_) => "overscroll",
            Animation::WheelScroll(_) => "wheel_scroll",
            Animation::Autoscroll(_) => "autoscroll",
        }
    }
}
