//! Input event model
//!
//! Platform-normalized gesture and scroll events consumed by the controller
//! on the input thread. Timestamps are milliseconds on a monotonically
//! increasing clock chosen by the embedder; the engine only ever looks at
//! differences between them.

use crate::geometry::{Point, Vector};

/// What the controller did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// The event was used to drive the state machine; the embedder should
    /// not perform its default action.
    Consumed,
    /// The event did not apply to the current state and was dropped.
    Ignored,
    /// The controller acknowledges the event but the embedder owns the
    /// response (e.g. tap dispatch, double-tap zoom target selection).
    DefaultAction,
}

/// A historical touch sample delivered alongside a touch-move. Touch screens
/// commonly sample faster than the event pipeline delivers; feeding the
/// intermediate samples to the velocity tracker improves fling accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalSample {
    pub position: Point,
    pub time: f64,
}

/// Kind of tap gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapKind {
    Single,
    Double,
    Long,
}

/// How a wheel event wants its delta applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDeliveryMode {
    /// Apply the delta immediately (clicky wheels, scroll snapping applies).
    Instant,
    /// Animate toward the accumulated destination.
    Smooth,
}

/// Granularity of a keyboard scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollUnit {
    Line,
    Page,
    /// Scroll to the start/end of the document (Home/End).
    Whole,
}

/// A keyboard-initiated scroll action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardScrollAction {
    pub unit: ScrollUnit,
    /// Scroll toward larger offsets (down/right) when true.
    pub forward: bool,
    /// Scroll the horizontal axis instead of the vertical one.
    pub horizontal: bool,
}

/// A platform-normalized input event.
///
/// Touch events describe the single tracked touch point; two-finger gestures
/// arrive pre-classified as pinch events. Pan events are trackpad pan
/// gestures, which carry their displacement with the event and may be
/// followed by a system-driven momentum phase.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    TouchStart {
        position: Point,
        time: f64,
    },
    TouchMove {
        position: Point,
        /// Older samples from the same device, oldest first.
        historical: Vec<HistoricalSample>,
        time: f64,
    },
    TouchEnd {
        time: f64,
    },
    TouchCancel {
        time: f64,
    },

    PanBegin {
        position: Point,
        time: f64,
    },
    PanUpdate {
        displacement: Vector,
        time: f64,
    },
    PanEnd {
        /// Synthesize a fling locally; set on platforms that do not emit
        /// momentum events.
        simulate_momentum: bool,
        time: f64,
    },
    PanMomentumStart {
        time: f64,
    },
    PanMomentumUpdate {
        displacement: Vector,
        time: f64,
    },
    PanMomentumEnd {
        time: f64,
    },

    PinchStart {
        focus: Point,
        time: f64,
    },
    PinchUpdate {
        focus: Point,
        current_span: f32,
        previous_span: f32,
        time: f64,
    },
    PinchEnd {
        /// One finger is still down; the gesture degrades to a touch.
        finger_lifted: bool,
        focus: Point,
        time: f64,
    },

    Tap {
        kind: TapKind,
        position: Point,
        time: f64,
    },

    Wheel {
        delta: Vector,
        mode: WheelDeliveryMode,
        origin: Point,
        time: f64,
    },

    KeyboardScroll {
        action: KeyboardScrollAction,
        time: f64,
    },

    ScrollbarDragStart {
        /// Dragging the vertical thumb (as opposed to the horizontal one).
        vertical: bool,
        time: f64,
    },
    ScrollbarDragUpdate {
        /// Thumb position as a fraction of the track, 0.0..=1.0.
        thumb_fraction: f32,
        time: f64,
    },
    ScrollbarDragEnd {
        time: f64,
    },

    AutoscrollStart {
        anchor: Point,
        time: f64,
    },
    AutoscrollUpdate {
        position: Point,
        time: f64,
    },
    AutoscrollStop {
        time: f64,
    },
}

impl InputEvent {
    /// The timestamp carried by the event.
    pub fn time(&self) -> f64 {
        match self {
            InputEvent::TouchStart { time, .. }
            | InputEvent::TouchMove { time, .. }
            | InputEvent::TouchEnd { time }
            | InputEvent::TouchCancel { time }
            | InputEvent::PanBegin { time, .. }
            | InputEvent::PanUpdate { time, .. }
            | InputEvent::PanEnd { time, .. }
            | InputEvent::PanMomentumStart { time }
            | InputEvent::PanMomentumUpdate { time, .. }
            | InputEvent::PanMomentumEnd { time }
            | InputEvent::PinchStart { time, .. }
            | InputEvent::PinchUpdate { time, .. }
            | InputEvent::PinchEnd { time, .. }
            | InputEvent::Tap { time, .. }
            | InputEvent::Wheel { time, .. }
            | InputEvent::KeyboardScroll { time, .. }
            | InputEvent::ScrollbarDragStart { time, .. }
            | InputEvent::ScrollbarDragUpdate { time, .. }
            | InputEvent::ScrollbarDragEnd { time }
            | InputEvent::AutoscrollStart { time, .. }
            | InputEvent::AutoscrollUpdate { time, .. }
            | InputEvent::AutoscrollStop { time } => *time,
        }
    }
}
