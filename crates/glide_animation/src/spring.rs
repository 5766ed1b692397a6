//! Spring physics
//!
//! A one-dimensional mass-spring-damper integrated with RK4. Used for
//! overscroll snap-back and spring-driven smooth scrolling; retargeting
//! keeps the current value and velocity so an interrupted spring resumes
//! without a discontinuity.

/// Spring parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Derive damping from a damping ratio (1.0 = critically damped,
    /// above = no rebound, below = bouncy).
    pub fn with_damping_ratio(stiffness: f32, ratio: f32, mass: f32) -> Self {
        let critical = 2.0 * (stiffness * mass).sqrt();
        Self::new(stiffness, critical * ratio, mass)
    }

    /// Stiff snap with no visible rebound.
    pub fn stiff() -> Self {
        Self::with_damping_ratio(3000.0, 1.05, 1.0)
    }

    /// Soft, slightly bouncy settle.
    pub fn gentle() -> Self {
        Self::with_damping_ratio(120.0, 0.8, 1.0)
    }
}

/// Settled when both of these are crossed.
const POSITION_EPSILON: f32 = 0.05;
const VELOCITY_EPSILON: f32 = 0.01;

/// A running spring simulation.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    value: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, value: f32) -> Self {
        Self {
            config,
            value,
            velocity: 0.0,
            target: value,
        }
    }

    pub fn with_velocity(config: SpringConfig, value: f32, velocity: f32) -> Self {
        Self {
            config,
            value,
            velocity,
            target: value,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Retarget mid-flight; value and velocity carry over.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }

    /// Advance the simulation by `dt` seconds using RK4.
    ///
    /// Large deltas (dropped frames) are subdivided so the integration
    /// stays stable at high stiffness.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let mut remaining = dt;
        const MAX_STEP: f32 = 1.0 / 60.0;
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP);
            self.rk4_step(h);
            remaining -= h;
        }
        if self.is_settled() {
            tracing::trace!(target = self.target, "spring settled");
            self.value = self.target;
            self.velocity = 0.0;
        }
    }

    fn accel(&self, value: f32, velocity: f32) -> f32 {
        let displacement = value - self.target;
        (-self.config.stiffness * displacement - self.config.damping * velocity)
            / self.config.mass.max(f32::EPSILON)
    }

    fn rk4_step(&mut self, h: f32) {
        let (x, v) = (self.value, self.velocity);

        let k1v = self.accel(x, v);
        let k1x = v;

        let k2v = self.accel(x + k1x * h * 0.5, v + k1v * h * 0.5);
        let k2x = v + k1v * h * 0.5;

        let k3v = self.accel(x + k2x * h * 0.5, v + k2v * h * 0.5);
        let k3x = v + k2v * h * 0.5;

        let k4v = self.accel(x + k3x * h, v + k3v * h);
        let k4x = v + k3v * h;

        self.value = x + (k1x + 2.0 * k2x + 2.0 * k3x + k4x) * h / 6.0;
        self.velocity = v + (k1v + 2.0 * k2v + 2.0 * k3v + k4v) * h / 6.0;
    }

    /// Whether the spring has come to rest at its target.
    pub fn is_settled(&self) -> bool {
        (self.value - self.target).abs() < POSITION_EPSILON
            && self.velocity.abs() < VELOCITY_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(spring: &mut Spring, max_seconds: f32) -> f32 {
        let mut t = 0.0;
        while !spring.is_settled() && t < max_seconds {
            spring.step(1.0 / 120.0);
            t += 1.0 / 120.0;
        }
        t
    }

    #[test]
    fn reaches_target() {
        let mut spring = Spring::new(SpringConfig::stiff(), 0.0);
        spring.set_target(100.0);
        let t = settle(&mut spring, 5.0);
        assert!(t < 5.0, "spring did not settle");
        assert!((spring.value() - 100.0).abs() < 0.1);
    }

    #[test]
    fn overdamped_never_overshoots() {
        let mut spring =
            Spring::new(SpringConfig::with_damping_ratio(200.0, 1.2, 1.0), 50.0);
        spring.set_target(0.0);
        for _ in 0..1200 {
            spring.step(1.0 / 120.0);
            assert!(spring.value() >= -POSITION_EPSILON);
        }
        assert!(spring.is_settled());
    }

    #[test]
    fn retarget_keeps_continuity() {
        let mut spring = Spring::new(SpringConfig::gentle(), 0.0);
        spring.set_target(100.0);
        for _ in 0..10 {
            spring.step(1.0 / 120.0);
        }
        let (value, velocity) = (spring.value(), spring.velocity());
        spring.set_target(-50.0);
        assert_eq!(spring.value(), value);
        assert_eq!(spring.velocity(), velocity);
        settle(&mut spring, 10.0);
        assert!((spring.value() + 50.0).abs() < 0.1);
    }

    #[test]
    fn zero_and_negative_dt_are_no_ops() {
        let mut spring = Spring::with_velocity(SpringConfig::gentle(), 10.0, 3.0);
        spring.set_target(0.0);
        spring.step(0.0);
        spring.step(-1.0);
        spring.step(f32::NAN);
        assert_eq!(spring.value(), 10.0);
        assert_eq!(spring.velocity(), 3.0);
    }

    #[test]
    fn large_dt_is_subdivided() {
        let mut fine = Spring::new(SpringConfig::stiff(), 0.0);
        fine.set_target(100.0);
        let mut coarse = fine.clone();
        for _ in 0..120 {
            fine.step(1.0 / 120.0);
        }
        coarse.step(1.0);
        assert!((fine.value() - coarse.value()).abs() < 1.0);
    }
}
