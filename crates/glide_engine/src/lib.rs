//! Glide Engine
//!
//! The asynchronous pan/zoom engine: per-region controllers that turn
//! platform input events into scroll offsets, zoom levels and overscroll,
//! sampled by a compositor at its own cadence.
//!
//! - **Axis & velocity**: per-axis displacement accounting and gesture
//!   velocity estimation
//! - **Animations**: fling, smooth scroll, snap, zoom and overscroll
//!   springs, one per controller at a time
//! - **Controller**: the gesture state machine behind a single mutex
//! - **Tree**: the controller arena and scroll handoff between regions
//!
//! Threading: input events, animation ticks and compositor sampling may
//! all arrive on different threads. No controller lock is ever held while
//! another controller is locked or while observer callbacks run.

pub mod animation;
pub mod axis;
pub mod controller;
pub mod metadata;
pub mod observer;
pub mod sampled;
pub mod tree;
pub mod velocity;

slotmap::new_key_type! {
    /// Arena key identifying one controller in a [`tree::ControllerTree`].
    pub struct ControllerId;
}

pub use controller::{ControllerShared, HandleResult, PanZoomState};
pub use metadata::{
    MetadataError, OverscrollBehavior, ScrollDirection, ScrollMetadata, SnapFlags, SnapInfo,
    SnapPoint, SnapTargetIds,
};
pub use observer::{ControllerObserver, NullObserver, RepaintReason, RepaintRequest};
pub use sampled::{FrameState, FrameTransform, SampledState};
pub use tree::ControllerTree;
