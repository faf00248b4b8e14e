use serde::{Deserialize, Serialize};

/// Display toggles and splat presentation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayOptions {
    /// Clear color behind the splats, RGBA.
    pub background: [f32; 4],
    /// Global multiplier applied to splat extents.
    pub splat_scale: f32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            background: [0.02, 0.02, 0.03, 1.0],
            splat_scale: 1.0,
        }
    }
}
