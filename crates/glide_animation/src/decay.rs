//! Fling velocity decay
//!
//! Exponential deceleration: every elapsed millisecond removes a fixed
//! fraction of the remaining velocity, so the trajectory is a pure function
//! of elapsed time and terminates for any finite initial velocity.

/// Exponential fling decay model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingDecay {
    /// Fraction of velocity lost per millisecond, in (0, 1).
    friction: f32,
    /// Velocities below this are treated as stopped.
    stop_threshold: f32,
}

impl FlingDecay {
    pub fn new(friction: f32, stop_threshold: f32) -> Self {
        Self {
            friction: friction.clamp(f32::EPSILON, 1.0 - f32::EPSILON),
            stop_threshold: stop_threshold.abs(),
        }
    }

    /// Decay `velocity` over `dt_ms` milliseconds. Returns 0.0 once the
    /// stop threshold is crossed.
    pub fn step(&self, velocity: f32, dt_ms: f64) -> f32 {
        if dt_ms <= 0.0 || !velocity.is_finite() {
            return if velocity.is_finite() { velocity } else { 0.0 };
        }
        let decayed = velocity * (1.0 - self.friction).powf(dt_ms as f32);
        if decayed.abs() < self.stop_threshold {
            tracing::trace!(velocity, decayed, "fling decayed below stop threshold");
            0.0
        } else {
            decayed
        }
    }

    pub fn is_stopped(&self, velocity: f32) -> bool {
        velocity.abs() < self.stop_threshold
    }

    /// Total distance a fling starting at `velocity` will cover before
    /// stopping, by integrating the decay curve. Used to predict the fling
    /// destination for scroll snapping.
    pub fn predicted_distance(&self, velocity: f32) -> f32 {
        if !velocity.is_finite() || self.is_stopped(velocity) {
            return 0.0;
        }
        // Integral of v0 * r^t over t in ms is v0 / -ln(r).
        let rate = -(1.0 - self.friction).ln();
        if rate <= f32::EPSILON {
            return 0.0;
        }
        velocity / rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_decays_to_zero_in_finite_time() {
        let decay = FlingDecay::new(0.002, 0.01);
        let mut velocity = 3.0;
        let mut elapsed = 0.0;
        while velocity != 0.0 && elapsed < 60_000.0 {
            velocity = decay.step(velocity, 16.0);
            elapsed += 16.0;
        }
        assert_eq!(velocity, 0.0);
        assert!(elapsed < 60_000.0, "fling never stopped");
    }

    #[test]
    fn decay_is_monotonic() {
        let decay = FlingDecay::new(0.002, 0.01);
        let mut velocity = 2.0;
        loop {
            let next = decay.step(velocity, 16.0);
            assert!(next.abs() <= velocity.abs());
            if next == 0.0 {
                break;
            }
            velocity = next;
        }
    }

    #[test]
    fn zero_dt_is_identity() {
        let decay = FlingDecay::new(0.002, 0.01);
        assert_eq!(decay.step(1.5, 0.0), 1.5);
    }

    #[test]
    fn non_finite_velocity_stops() {
        let decay = FlingDecay::new(0.002, 0.01);
        assert_eq!(decay.step(f32::NAN, 16.0), 0.0);
        assert_eq!(decay.step(f32::INFINITY, 16.0), 0.0);
    }

    #[test]
    fn predicted_distance_matches_integration() {
        let decay = FlingDecay::new(0.002, 0.0001);
        let predicted = decay.predicted_distance(1.0);
        let mut travelled = 0.0;
        let mut velocity = 1.0f32;
        for _ in 0..20_000 {
            travelled += velocity; // 1ms steps
            velocity = decay.step(velocity, 1.0);
            if velocity == 0.0 {
                break;
            }
        }
        assert!((travelled - predicted).abs() / predicted < 0.05);
    }
}
