//! Engine configuration
//!
//! Every physics constant and threshold in the engine is a named field here,
//! externally supplied and hot-swappable between gestures. Defaults are
//! tuned for a 1x-scale desktop/touch profile.
//!
//! Units: distances in logical pixels, velocities in logical pixels per
//! millisecond, durations in milliseconds, angles in radians.

use serde::Deserialize;
use thiserror::Error;

/// Axis locking policy once a pan direction is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisLockMode {
    /// Never lock; both axes always pan freely.
    Free,
    /// Lock once at pan start and hold for the rest of the gesture.
    #[default]
    Standard,
    /// Re-evaluate past the breakout threshold; may release the lock or
    /// re-lock onto the other axis.
    Sticky,
    /// Release the lock past the breakout threshold but never re-acquire it.
    Breakable,
}

/// Pinch lock policy distinguishing two-finger pans from true pinches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchLockMode {
    /// Never lock; any span change zooms.
    Free,
    /// Lock into panning when focus movement dominates span movement, and
    /// stay locked for the rest of the gesture.
    #[default]
    Standard,
    /// Like standard, but a large enough span change breaks the lock.
    Sticky,
}

/// All engine tunables. Construct via `Default`, field updates, or
/// [`GlideConfig::from_toml_str`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlideConfig {
    // Axis locking
    pub axis_lock_mode: AxisLockMode,
    /// Maximum deviation from an axis for the initial lock decision.
    pub axis_lock_angle: f32,
    /// Deviation beyond which a held lock is re-evaluated.
    pub axis_breakout_angle: f32,
    /// Pan distance that must accumulate before re-evaluating a lock.
    pub axis_breakout_threshold: f32,

    // Pinch locking
    pub pinch_lock_mode: PinchLockMode,
    /// Span movement below this while focus moves enters pinch lock.
    pub pinch_lock_span_threshold: f32,
    /// Focus movement above this while span is quiet enters pinch lock.
    pub pinch_lock_scroll_threshold: f32,
    /// Span movement above this breaks a sticky pinch lock.
    pub pinch_span_breakout_threshold: f32,
    /// Age limit for the buffered pinch samples used to de-jitter the
    /// lock decision.
    pub pinch_buffer_max_age_ms: f64,
    /// Throttle for repaint requests while pinching.
    pub pinch_repaint_delay_ms: f64,

    // Fling
    /// Per-millisecond fraction of velocity lost to friction, in (0, 1).
    pub fling_friction: f32,
    /// Release velocity below this never starts a fling.
    pub fling_min_velocity: f32,
    /// A running fling below this velocity stops.
    pub fling_stopped_threshold: f32,

    // Overscroll
    pub allow_overscroll: bool,
    /// Maximum rubber-band stretch as a fraction of the composition length.
    pub overscroll_max_stretch: f32,
    /// Entering overscroll on an axis requires the pan distance on that axis
    /// to exceed the other axis' distance times this ratio.
    pub overscroll_min_pan_distance_ratio: f32,
    pub overscroll_spring_stiffness: f32,
    pub overscroll_spring_damping_ratio: f32,

    // Smooth scrolling
    pub smooth_scroll_duration_ms: f64,
    pub smooth_scroll_spring_stiffness: f32,
    pub smooth_scroll_damping_ratio: f32,
    pub wheel_scroll_duration_ms: f64,
    /// Distance of one keyboard/wheel "line".
    pub line_scroll_distance: f32,
    /// Fraction of the composition length scrolled by one "page".
    pub page_scroll_fraction: f32,

    // Zoom
    pub allow_zoom: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_animation_duration_ms: f64,

    // Gesture classification
    /// Touch movement below this never starts a pan.
    pub touch_start_tolerance: f32,
    /// Grace period after a pan-end in which a momentum phase may still
    /// claim the transform before transform-end fires.
    pub scrollend_grace_ms: f64,
    /// Autoscroll velocity per pixel of cursor displacement from the anchor.
    pub autoscroll_gain: f32,

    // Velocity tracking
    /// Samples older than this are ignored by the velocity tracker.
    pub velocity_relevance_ms: f64,
    /// Exponential smoothing weight for new velocity samples, in (0, 1].
    pub velocity_smoothing: f32,
    /// Hard cap on tracked velocity.
    pub max_velocity: f32,
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            axis_lock_mode: AxisLockMode::Standard,
            axis_lock_angle: std::f32::consts::FRAC_PI_6,
            axis_breakout_angle: std::f32::consts::FRAC_PI_8,
            axis_breakout_threshold: 32.0,

            pinch_lock_mode: PinchLockMode::Standard,
            pinch_lock_span_threshold: 16.0,
            pinch_lock_scroll_threshold: 12.0,
            pinch_span_breakout_threshold: 12.0,
            pinch_buffer_max_age_ms: 80.0,
            pinch_repaint_delay_ms: 500.0,

            fling_friction: 0.002,
            fling_min_velocity: 0.5,
            fling_stopped_threshold: 0.01,

            allow_overscroll: true,
            overscroll_max_stretch: 0.35,
            overscroll_min_pan_distance_ratio: 1.0,
            overscroll_spring_stiffness: 200.0,
            overscroll_spring_damping_ratio: 1.1,

            smooth_scroll_duration_ms: 250.0,
            smooth_scroll_spring_stiffness: 250.0,
            smooth_scroll_damping_ratio: 1.0,
            wheel_scroll_duration_ms: 150.0,
            line_scroll_distance: 40.0,
            page_scroll_fraction: 0.9,

            allow_zoom: true,
            min_zoom: 0.25,
            max_zoom: 10.0,
            zoom_animation_duration_ms: 250.0,

            touch_start_tolerance: 8.0,
            scrollend_grace_ms: 100.0,
            autoscroll_gain: 0.02,

            velocity_relevance_ms: 100.0,
            velocity_smoothing: 0.3,
            max_velocity: 4.0,
        }
    }
}

/// Rejected configuration input. Invalid configs are refused wholesale;
/// the previously installed config stays in effect.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config field `{field}` is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

impl GlideConfig {
    /// Parse a (possibly partial) TOML document; unspecified fields keep
    /// their defaults. The result is validated before being returned.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: GlideConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject NaN and out-of-range tunables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn finite_positive(
            value: f32,
            field: &'static str,
        ) -> Result<(), ConfigError> {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be finite and positive",
                });
            }
            Ok(())
        }

        if !self.fling_friction.is_finite()
            || self.fling_friction <= 0.0
            || self.fling_friction >= 1.0
        {
            return Err(ConfigError::OutOfRange {
                field: "fling_friction",
                reason: "must lie in (0, 1)",
            });
        }
        if !self.velocity_smoothing.is_finite()
            || self.velocity_smoothing <= 0.0
            || self.velocity_smoothing > 1.0
        {
            return Err(ConfigError::OutOfRange {
                field: "velocity_smoothing",
                reason: "must lie in (0, 1]",
            });
        }
        finite_positive(self.axis_lock_angle, "axis_lock_angle")?;
        finite_positive(self.axis_breakout_threshold, "axis_breakout_threshold")?;
        finite_positive(self.fling_min_velocity, "fling_min_velocity")?;
        finite_positive(self.fling_stopped_threshold, "fling_stopped_threshold")?;
        finite_positive(self.overscroll_max_stretch, "overscroll_max_stretch")?;
        finite_positive(
            self.overscroll_spring_stiffness,
            "overscroll_spring_stiffness",
        )?;
        finite_positive(
            self.smooth_scroll_spring_stiffness,
            "smooth_scroll_spring_stiffness",
        )?;
        finite_positive(self.touch_start_tolerance, "touch_start_tolerance")?;
        finite_positive(self.max_velocity, "max_velocity")?;
        finite_positive(self.min_zoom, "min_zoom")?;
        finite_positive(self.max_zoom, "max_zoom")?;
        if self.max_zoom < self.min_zoom {
            return Err(ConfigError::OutOfRange {
                field: "max_zoom",
                reason: "must be >= min_zoom",
            });
        }
        for (value, field) in [
            (self.smooth_scroll_duration_ms, "smooth_scroll_duration_ms"),
            (self.wheel_scroll_duration_ms, "wheel_scroll_duration_ms"),
            (self.zoom_animation_duration_ms, "zoom_animation_duration_ms"),
            (self.velocity_relevance_ms, "velocity_relevance_ms"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be finite and positive",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GlideConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = GlideConfig::from_toml_str(
            r#"
            fling_friction = 0.004
            axis_lock_mode = "sticky"
            "#,
        )
        .unwrap();
        assert_eq!(config.fling_friction, 0.004);
        assert_eq!(config.axis_lock_mode, AxisLockMode::Sticky);
        assert_eq!(
            config.touch_start_tolerance,
            GlideConfig::default().touch_start_tolerance
        );
    }

    #[test]
    fn rejects_out_of_range_friction() {
        assert!(GlideConfig::from_toml_str("fling_friction = 1.5").is_err());
        assert!(GlideConfig::from_toml_str("fling_friction = 0.0").is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(GlideConfig::from_toml_str("not_a_tunable = 1.0").is_err());
    }

    #[test]
    fn rejects_nan() {
        let mut config = GlideConfig::default();
        config.max_velocity = f32::NAN;
        assert!(config.validate().is_err());
    }
}
