//! Centralized rendering/display options with TOML preset support.
//!
//! All tweakable settings (display, camera) are consolidated here.
//! Options serialize to/from TOML for presets.

mod camera;
mod display;

use std::path::Path;

pub use camera::CameraOptions;
pub use display::DisplayOptions;
use serde::{Deserialize, Serialize};

use crate::error::LusterError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[camera]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Display toggles and splat presentation parameters.
    pub display: DisplayOptions,
    /// Camera projection and orbit parameters.
    pub camera: CameraOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Io`] if the file cannot be read or
    /// [`LusterError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, LusterError> {
        let content = std::fs::read_to_string(path).map_err(LusterError::Io)?;
        toml::from_str(&content)
            .map_err(|e| LusterError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::OptionsParse`] if serialization fails or
    /// [`LusterError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), LusterError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LusterError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(LusterError::Io)?;
        }
        std::fs::write(path, content).map_err(LusterError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let options = Options::default();
        let toml_str = match toml::to_string_pretty(&options) {
            Ok(s) => s,
            Err(e) => unreachable!("serialization failed: {e}"),
        };
        let parsed: Options = match toml::from_str(&toml_str) {
            Ok(o) => o,
            Err(e) => unreachable!("parse failed: {e}"),
        };
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Options =
            match toml::from_str("[camera]\nfovy = 60.0\n") {
                Ok(o) => o,
                Err(e) => unreachable!("parse failed: {e}"),
            };
        assert_eq!(parsed.camera.fovy, 60.0);
        assert_eq!(parsed.camera.znear, CameraOptions::default().znear);
        assert_eq!(parsed.display, DisplayOptions::default());
    }
}
