//! Crate-level error types.

use std::fmt;

use crate::gpu::lifecycle::LifecycleError;
use crate::gpu::render_context::RenderContextError;
use crate::splat::model::ModelError;
use crate::splat::quad_mesh::MeshError;

/// Errors produced by the luster crate.
#[derive(Debug)]
pub enum LusterError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Resource lifecycle violation (over-release, use before init).
    Lifecycle(LifecycleError),
    /// Mesh attribute contract violation.
    Mesh(MeshError),
    /// Inconsistent splat model arrays.
    Model(ModelError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for LusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle error: {e}"),
            Self::Mesh(e) => write!(f, "mesh error: {e}"),
            Self::Model(e) => write!(f, "model error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for LusterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
            Self::Mesh(e) => Some(e),
            Self::Model(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::OptionsParse(_) | Self::Viewer(_) => None,
        }
    }
}

impl From<RenderContextError> for LusterError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<LifecycleError> for LusterError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

impl From<MeshError> for LusterError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<ModelError> for LusterError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<std::io::Error> for LusterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
