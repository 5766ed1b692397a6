//! Sampled compositing state
//!
//! The compositor never reads the live controller state directly. Each
//! animation tick pushes a snapshot of (offset, zoom, generation) into a
//! two-entry FIFO; the compositor consumes the front. The extra entry
//! gives every visual change exactly one frame of delay, so input-driven
//! and animation-driven updates reach the screen with the same latency.

use glide_core::geometry::SideBits;
use glide_core::Point;
use smallvec::SmallVec;

/// One frame's worth of compositing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub scroll_offset: Point,
    pub zoom: f32,
    /// Content-side generation the snapshot was taken against.
    pub generation: u64,
    /// Timestamp of the animation sample that produced this entry, used to
    /// collapse duplicate samples at the same vsync time.
    pub sample_time: f64,
}

/// What the compositor applies this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub scroll_offset: Point,
    pub zoom: f32,
    /// Visual overscroll translation in content units, already passed
    /// through the sublinear stretch mapping.
    pub overscroll: Point,
    /// Which composition edges the overscroll hangs off, so the renderer
    /// knows where to anchor the stretch effect.
    pub overscroll_sides: SideBits,
}

/// FIFO of at most two sampled frames.
///
/// `advance` drops the consumed front once a newer entry exists; `push`
/// replaces the back when called twice for the same sample time, so a
/// repeated sample within one frame cannot grow the queue.
#[derive(Debug, Clone, Default)]
pub struct SampledState {
    frames: SmallVec<[FrameState; 2]>,
}

impl SampledState {
    /// Record a snapshot of the live state for a given sample time.
    pub fn push(&mut self, frame: FrameState) {
        if let Some(back) = self.frames.last_mut() {
            if back.sample_time == frame.sample_time {
                *back = frame;
                return;
            }
        }
        if self.frames.len() == 2 {
            // The compositor missed a frame; the oldest snapshot is stale.
            self.frames.remove(0);
        }
        self.frames.push(frame);
    }

    /// The snapshot the compositor should apply this frame, if any.
    pub fn front(&self) -> Option<&FrameState> {
        self.frames.first()
    }

    /// The most recently queued snapshot.
    pub fn back(&self) -> Option<&FrameState> {
        self.frames.last()
    }

    /// Retire the front once a newer snapshot is queued behind it. The
    /// last remaining entry is kept so a static scene still composites.
    pub fn advance(&mut self) {
        if self.frames.len() > 1 {
            self.frames.remove(0);
        }
    }

    /// Whether a newer snapshot is waiting behind the front.
    pub fn has_pending(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
