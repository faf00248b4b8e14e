use serde::{Deserialize, Serialize};

/// Camera projection and orbit parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Initial eye distance from the target.
    pub distance: f32,
    /// Orbit speed of the demo viewer in radians per second.
    pub orbit_speed: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 1000.0,
            distance: 6.0,
            orbit_speed: 0.3,
        }
    }
}
