//! Glide Animation Math
//!
//! Pure sampled-physics units shared by the engine's animations:
//!
//! - **Spring Physics**: RK4-integrated mass-spring-damper
//! - **Easing**: CSS cubic-bezier curves solved numerically
//! - **Fling Decay**: exponential velocity decay with a stop threshold
//!
//! Every unit is a trajectory function of elapsed time: no wall clock, no
//! deadlines. All of them settle exactly once and can be retargeted
//! mid-flight without a position discontinuity.

pub mod decay;
pub mod easing;
pub mod spring;

pub use decay::FlingDecay;
pub use easing::Easing;
pub use spring::{Spring, SpringConfig};
