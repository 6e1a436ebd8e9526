//! Demo Tracker math utilities.

pub mod math;

pub use math::conditional::*;
pub use math::moving_average::*;
