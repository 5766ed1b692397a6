//! Velocity tracking
//!
//! Estimates gesture velocity from position samples. The strategy is
//! pluggable because platforms weight samples differently; the default
//! keeps a bounded ring of recent samples, ignores stale ones, and blends
//! instantaneous velocities with exponential smoothing.

use glide_core::GlideConfig;

/// Strategy for turning position samples into a velocity estimate.
///
/// Positions are one-dimensional (the tracked coordinate of one axis);
/// times are milliseconds. Implementations must tolerate out-of-order and
/// duplicate timestamps without producing non-finite output.
pub trait VelocityTracker: Send {
    /// Begin a new gesture at `position`.
    fn start(&mut self, position: f32, time: f64);
    /// Record a movement sample. Returns the instantaneous velocity for
    /// this sample if one could be computed.
    fn add(&mut self, position: f32, time: f64) -> Option<f32>;
    /// Current smoothed velocity estimate in px/ms.
    fn velocity(&self) -> f32;
    /// The most recently recorded position.
    fn position(&self) -> f32;
    /// End the gesture at `time`, discarding sample history. The velocity
    /// estimate survives unless the history is stale relative to `time`.
    fn end(&mut self, time: f64);
    /// Drop all state including the velocity estimate.
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, Default)]
struct Sample {
    position: f32,
    time: f64,
}

const HISTORY_SIZE: usize = 8;

/// Default tracker: bounded sample history with an age horizon and
/// exponentially smoothed instantaneous velocities.
#[derive(Debug)]
pub struct ExponentialTracker {
    samples: [Option<Sample>; HISTORY_SIZE],
    head: usize,
    velocity: f32,
    /// Samples older than this are irrelevant.
    relevance_ms: f64,
    smoothing: f32,
    max_velocity: f32,
}

impl ExponentialTracker {
    pub fn new(config: &GlideConfig) -> Self {
        Self {
            samples: [None; HISTORY_SIZE],
            head: 0,
            velocity: 0.0,
            relevance_ms: config.velocity_relevance_ms,
            smoothing: config.velocity_smoothing,
            max_velocity: config.max_velocity,
        }
    }

    pub fn apply_config(&mut self, config: &GlideConfig) {
        self.relevance_ms = config.velocity_relevance_ms;
        self.smoothing = config.velocity_smoothing;
        self.max_velocity = config.max_velocity;
    }

    fn newest(&self) -> Option<Sample> {
        self.samples[self.head]
    }

    fn push(&mut self, sample: Sample) {
        self.head = (self.head + 1) % HISTORY_SIZE;
        self.samples[self.head] = Some(sample);
    }
}

impl VelocityTracker for ExponentialTracker {
    fn start(&mut self, position: f32, time: f64) {
        self.samples = [None; HISTORY_SIZE];
        self.velocity = 0.0;
        self.push(Sample { position, time });
    }

    fn add(&mut self, position: f32, time: f64) -> Option<f32> {
        let Some(newest) = self.newest() else {
            // No open gesture; treat this as the first sample.
            self.push(Sample { position, time });
            return None;
        };

        let dt = time - newest.time;
        if dt <= 0.0 {
            // Out-of-order or duplicate timestamp: overwrite the newest
            // sample rather than dividing by a degenerate delta.
            self.samples[self.head] = Some(Sample { position, time: newest.time });
            return None;
        }
        if dt > self.relevance_ms {
            // The pointer effectively stopped; history is stale.
            self.start(position, time);
            return Some(0.0);
        }

        let instantaneous =
            ((position - newest.position) / dt as f32).clamp(-self.max_velocity, self.max_velocity);
        self.push(Sample { position, time });

        self.velocity = if self.velocity == 0.0 {
            instantaneous
        } else {
            self.velocity * (1.0 - self.smoothing) + instantaneous * self.smoothing
        };
        Some(instantaneous)
    }

    fn velocity(&self) -> f32 {
        self.velocity
    }

    fn position(&self) -> f32 {
        self.newest().map(|s| s.position).unwrap_or(0.0)
    }

    fn end(&mut self, time: f64) {
        // Keep the velocity estimate for fling computation, but a finger
        // that rested before lifting released at zero velocity.
        let mut relevant = 0;
        for sample in self.samples.iter().flatten() {
            if time - sample.time <= self.relevance_ms {
                relevant += 1;
            }
        }
        if relevant < 2 {
            self.velocity = 0.0;
        }
        self.samples = [None; HISTORY_SIZE];
        self.head = 0;
    }

    fn reset(&mut self) {
        self.samples = [None; HISTORY_SIZE];
        self.head = 0;
        self.velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ExponentialTracker {
        ExponentialTracker::new(&GlideConfig::default())
    }

    #[test]
    fn steady_motion_converges_to_true_velocity() {
        let mut tracker = tracker();
        tracker.start(0.0, 0.0);
        // 1 px/ms for 100ms.
        for i in 1..=10 {
            tracker.add(i as f32 * 10.0, i as f64 * 10.0);
        }
        assert!((tracker.velocity() - 1.0).abs() < 0.05);
    }

    #[test]
    fn duplicate_timestamps_do_not_blow_up() {
        let mut tracker = tracker();
        tracker.start(0.0, 0.0);
        tracker.add(5.0, 10.0);
        tracker.add(9.0, 10.0);
        assert!(tracker.velocity().is_finite());
        assert_eq!(tracker.position(), 9.0);
    }

    #[test]
    fn stale_history_reads_as_stopped() {
        let mut tracker = tracker();
        tracker.start(0.0, 0.0);
        tracker.add(50.0, 10.0);
        // Long hold before moving again.
        let instantaneous = tracker.add(51.0, 500.0);
        assert_eq!(instantaneous, Some(0.0));
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn velocity_is_clamped() {
        let mut tracker = tracker();
        tracker.start(0.0, 0.0);
        tracker.add(10_000.0, 1.0);
        assert!(tracker.velocity().abs() <= GlideConfig::default().max_velocity);
    }

    #[test]
    fn end_with_single_sample_zeroes_velocity() {
        let mut tracker = tracker();
        tracker.start(0.0, 0.0);
        tracker.add(30.0, 10.0);
        tracker.add(60.0, 20.0);
        // Finger rests before lifting: history ages out.
        tracker.end(200.0);
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn prompt_release_keeps_the_velocity() {
        let mut tracker = tracker();
        tracker.start(0.0, 0.0);
        tracker.add(30.0, 10.0);
        tracker.add(60.0, 20.0);
        tracker.end(25.0);
        assert!(tracker.velocity() > 1.0);
    }
}
