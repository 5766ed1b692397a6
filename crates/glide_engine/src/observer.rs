//! Controller observer & deferred work
//!
//! All outward communication from a controller flows through
//! [`ControllerObserver`]. Callbacks are always invoked with no controller
//! lock held; work that becomes necessary while a lock is held (a fling
//! handing residual velocity to an ancestor, a delayed transform-end) is
//! captured as a [`DeferredTask`] and executed by the tree afterward.

use glide_core::{Point, Vector};

use crate::controller::PanZoomState;
use crate::metadata::SnapTargetIds;
use crate::ControllerId;

/// Why a repaint is being requested, for content-side prioritization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintReason {
    UserInput,
    AnimationFrame,
    /// Zoom settled; a full-resolution repaint at the final scale.
    DelayedZoom,
}

/// A request for content to repaint at a new visual state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepaintRequest {
    pub id: ControllerId,
    pub scroll_offset: Point,
    pub zoom: f32,
    /// Scroll velocity in content units per millisecond, for checkerboard
    /// prediction on the content side.
    pub velocity: Vector,
    pub reason: RepaintReason,
}

/// Receiver for controller-side events. All methods default to no-ops so
/// embedders implement only what they need.
pub trait ControllerObserver: Send + Sync {
    /// The controller entered a transforming state (visual offset or zoom
    /// may now change every frame).
    fn on_transform_begin(&self, _id: ControllerId) {}

    /// The controller returned to rest. Guaranteed to pair with a prior
    /// `on_transform_begin` for the same controller.
    fn on_transform_end(&self, _id: ControllerId) {}

    fn on_state_change(&self, _id: ControllerId, _old: PanZoomState, _new: PanZoomState) {}

    fn request_repaint(&self, _request: &RepaintRequest) {}

    /// A snapping scroll settled on the given snap targets.
    fn on_snap_targets(&self, _id: ControllerId, _targets: SnapTargetIds) {}
}

/// Observer that ignores everything; useful in tests and as a default.
#[derive(Debug, Default)]
pub struct NullObserver;

impl ControllerObserver for NullObserver {}

/// An outward notification recorded while a controller lock was held,
/// dispatched in order once the lock is released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    TransformBegin,
    TransformEnd,
    StateChange { old: PanZoomState, new: PanZoomState },
    SnapTargets(SnapTargetIds),
    Repaint(RepaintRequest),
}

/// Work scheduled from inside a controller that must run with no lock
/// held, because it locks other controllers or fires at a later time.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredTask {
    /// A fling hit a scroll boundary; continue it further along the
    /// handoff chain starting at `index`.
    HandoffFling {
        chain: Vec<ControllerId>,
        index: usize,
        velocity: Vector,
    },
    /// Fire `on_transform_end` at `deadline` unless a new gesture started
    /// on the controller in the meantime.
    TransformEnd { id: ControllerId, deadline: f64 },
    /// Full-resolution repaint after a zoom gesture has been quiescent
    /// until `deadline`.
    DelayedRepaint { id: ControllerId, deadline: f64 },
}
