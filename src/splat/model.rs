//! Immutable splat model data.

use std::fmt;

use crate::splat::attributes::SplatAttribute;

/// Errors raised when model arrays are inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// An array length is not a multiple of its per-splat width.
    RaggedArray {
        /// Which array is malformed.
        array: &'static str,
        /// Its length in floats.
        len: usize,
        /// The expected per-splat width.
        stride: usize,
    },
    /// The four arrays disagree on the number of splats.
    MismatchedCounts {
        /// Splat count implied by the positions array.
        positions: usize,
        /// Splat count implied by the rotations array.
        rotations: usize,
        /// Splat count implied by the scales array.
        scales: usize,
        /// Splat count implied by the colors array.
        colors: usize,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaggedArray { array, len, stride } => write!(
                f,
                "{array} array length {len} is not a multiple of {stride}"
            ),
            Self::MismatchedCounts {
                positions,
                rotations,
                scales,
                colors,
            } => write!(
                f,
                "model arrays disagree on splat count: positions {positions}, \
                 rotations {rotations}, scales {scales}, colors {colors}"
            ),
        }
    }
}

impl std::error::Error for ModelError {}

/// Validate the four parallel arrays and return the splat count they
/// describe.
pub(crate) fn validate_arrays(
    positions: &[f32],
    rotations: &[f32],
    scales: &[f32],
    colors: &[f32],
) -> Result<usize, ModelError> {
    let widths = [
        ("positions", positions, SplatAttribute::Center.components()),
        ("rotations", rotations, SplatAttribute::Rotation.components()),
        ("scales", scales, SplatAttribute::Scale.components()),
        ("colors", colors, SplatAttribute::Color.components()),
    ];
    for (array, data, stride) in widths {
        if data.len() % stride != 0 {
            return Err(ModelError::RaggedArray {
                array,
                len: data.len(),
                stride,
            });
        }
    }

    let counts = [
        positions.len() / SplatAttribute::Center.components(),
        rotations.len() / SplatAttribute::Rotation.components(),
        scales.len() / SplatAttribute::Scale.components(),
        colors.len() / SplatAttribute::Color.components(),
    ];
    if counts.iter().any(|&c| c != counts[0]) {
        return Err(ModelError::MismatchedCounts {
            positions: counts[0],
            rotations: counts[1],
            scales: counts[2],
            colors: counts[3],
        });
    }

    Ok(counts[0])
}

/// One loaded splat model: four parallel arrays describing N splats.
///
/// The arrays are immutable for the model's lifetime; structural changes
/// require building a new model.
#[derive(Debug, Clone)]
pub struct SplatModel {
    positions: Vec<f32>,
    rotations: Vec<f32>,
    scales: Vec<f32>,
    colors: Vec<f32>,
    num_splats: usize,
}

impl SplatModel {
    /// Build a model from the four parallel arrays.
    ///
    /// `positions` holds xyz triples, `rotations` unit quaternions,
    /// `scales` log-space xyz triples, and `colors` RGBA with opacity
    /// already resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if any array is ragged or the arrays
    /// disagree on the splat count.
    pub fn new(
        positions: Vec<f32>,
        rotations: Vec<f32>,
        scales: Vec<f32>,
        colors: Vec<f32>,
    ) -> Result<Self, ModelError> {
        let num_splats =
            validate_arrays(&positions, &rotations, &scales, &colors)?;
        Ok(Self {
            positions,
            rotations,
            scales,
            colors,
            num_splats,
        })
    }

    /// Number of splats the model describes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.num_splats
    }

    /// Whether the model holds no splats.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_splats == 0
    }

    /// Splat centers, xyz per splat.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Splat orientations, one quaternion per splat.
    #[must_use]
    pub fn rotations(&self) -> &[f32] {
        &self.rotations
    }

    /// Log-space splat scales, xyz per splat.
    #[must_use]
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Splat colors, RGBA per splat.
    #[must_use]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_splat() -> SplatModel {
        match SplatModel::new(
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0],
        ) {
            Ok(model) => model,
            Err(e) => unreachable!("valid model rejected: {e}"),
        }
    }

    #[test]
    fn test_valid_model() {
        let model = single_splat();
        assert_eq!(model.len(), 1);
        assert!(!model.is_empty());
    }

    #[test]
    fn test_empty_model() {
        let result =
            SplatModel::new(Vec::new(), Vec::new(), Vec::new(), Vec::new());
        match result {
            Ok(model) => assert!(model.is_empty()),
            Err(e) => unreachable!("empty model rejected: {e}"),
        }
    }

    #[test]
    fn test_ragged_array_rejected() {
        let result = SplatModel::new(
            vec![0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0],
        );
        assert_eq!(
            result.err(),
            Some(ModelError::RaggedArray {
                array: "positions",
                len: 2,
                stride: 3,
            })
        );
    }

    #[test]
    fn test_mismatched_counts_rejected() {
        let result = SplatModel::new(
            vec![0.0; 6],
            vec![0.0; 4],
            vec![0.0; 6],
            vec![0.0; 8],
        );
        assert_eq!(
            result.err(),
            Some(ModelError::MismatchedCounts {
                positions: 2,
                rotations: 1,
                scales: 2,
                colors: 2,
            })
        );
    }
}
