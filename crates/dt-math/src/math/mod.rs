//! Core math modules.

pub mod conditional;
pub mod moving_average;
