//! Camera state and GPU uniform.
//!
//! The renderer consumes only the view and view-projection accessors;
//! camera change detection compares the view matrix by value.

/// Perspective camera and its GPU uniform struct.
pub mod core;

pub use self::core::{Camera, CameraUniform};
