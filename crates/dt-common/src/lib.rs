//! Demo Tracker common types and errors.
//!
//! This crate provides foundational types shared across the tracker crates:
//! - User and attribute identifiers
//! - The unified error taxonomy with stable codes

pub mod error;
pub mod id;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::{AttributeKey, UserId};
