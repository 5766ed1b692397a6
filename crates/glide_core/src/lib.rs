//! Glide Core Primitives
//!
//! This crate provides the foundational types for the Glide pan/zoom engine:
//!
//! - **Geometry**: points, vectors, rects and overscroll side bits
//! - **Input Events**: platform-normalized gesture and scroll events
//! - **Configuration**: named physics tunables with TOML loading

pub mod config;
pub mod events;
pub mod geometry;

pub use config::{AxisLockMode, ConfigError, GlideConfig, PinchLockMode};
pub use events::{
    EventStatus, HistoricalSample, InputEvent, KeyboardScrollAction, ScrollUnit, TapKind,
    WheelDeliveryMode,
};
pub use geometry::{Point, Rect, SideBits, Vector};
