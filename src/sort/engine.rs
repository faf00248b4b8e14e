//! Depth ordering of splats against a view-projection matrix.
//!
//! One engine lives inside each sort worker thread. It owns the model
//! arrays plus index/depth scratch space, and produces densely-packed
//! reordered copies on every sort. Splats are ordered far-to-near so
//! alpha blending composites correctly; splats behind the projection
//! plane are culled.

use glam::{Mat4, Vec3};

use crate::splat::attributes::SplatAttribute;
use crate::splat::model::{validate_arrays, ModelError};

/// Reordered splat arrays tagged with the matrix they were computed
/// against.
#[derive(Debug, Clone)]
pub struct SortResult {
    /// Reordered centers, xyz per visible splat.
    pub positions: Vec<f32>,
    /// Reordered orientations, one quaternion per visible splat.
    pub rotations: Vec<f32>,
    /// Reordered log-space scales, xyz per visible splat.
    pub scales: Vec<f32>,
    /// Reordered colors, RGBA per visible splat.
    pub colors: Vec<f32>,
    /// Number of splats that survived culling.
    pub visible_count: u32,
    /// The matrix this ordering was computed against.
    pub view_projection: Mat4,
}

/// Owned sort state for one splat model.
#[derive(Debug, Default)]
pub struct SortEngine {
    positions: Vec<f32>,
    rotations: Vec<f32>,
    scales: Vec<f32>,
    colors: Vec<f32>,
    num_splats: usize,
    has_model: bool,
    indices: Vec<u32>,
    depths: Vec<f32>,
}

impl SortEngine {
    /// Engine with no model loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of the model arrays. Called exactly once per model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if any array is ragged or the arrays
    /// disagree on the splat count; the engine then keeps no model.
    pub fn set_buffers(
        &mut self,
        positions: Vec<f32>,
        rotations: Vec<f32>,
        scales: Vec<f32>,
        colors: Vec<f32>,
    ) -> Result<(), ModelError> {
        let num_splats =
            validate_arrays(&positions, &rotations, &scales, &colors)?;
        self.positions = positions;
        self.rotations = rotations;
        self.scales = scales;
        self.colors = colors;
        self.num_splats = num_splats;
        self.has_model = true;
        Ok(())
    }

    /// Whether model arrays have been loaded.
    #[must_use]
    pub const fn has_model(&self) -> bool {
        self.has_model
    }

    /// Number of splats in the loaded model.
    #[must_use]
    pub const fn num_splats(&self) -> usize {
        self.num_splats
    }

    /// Reorder the model far-to-near as seen through `view_projection`.
    ///
    /// Depth is clip-space z after the perspective divide. Splats with a
    /// negative or non-finite depth are culled; survivors are packed
    /// densely, so every output array describes exactly
    /// [`SortResult::visible_count`] splats.
    pub fn sort(&mut self, view_projection: Mat4) -> SortResult {
        let n = self.num_splats;

        self.indices.clear();
        self.indices.extend(0..n as u32);
        self.depths.resize(n, 0.0);

        for i in 0..n {
            let position = Vec3::new(
                self.positions[i * 3],
                self.positions[i * 3 + 1],
                self.positions[i * 3 + 2],
            );
            let clip = view_projection * position.extend(1.0);
            let depth = clip.z / clip.w;
            // Non-finite depths (degenerate w) sink with the culled set.
            self.depths[i] =
                if depth.is_finite() { depth } else { f32::NEG_INFINITY };
        }

        // Farther splats draw first; stable so equal depths keep input
        // order.
        let depths = &self.depths;
        self.indices.sort_by(|&a, &b| {
            depths[b as usize].total_cmp(&depths[a as usize])
        });

        let pos_stride = SplatAttribute::Center.components();
        let rot_stride = SplatAttribute::Rotation.components();
        let scale_stride = SplatAttribute::Scale.components();
        let color_stride = SplatAttribute::Color.components();

        let mut result = SortResult {
            positions: Vec::with_capacity(n * pos_stride),
            rotations: Vec::with_capacity(n * rot_stride),
            scales: Vec::with_capacity(n * scale_stride),
            colors: Vec::with_capacity(n * color_stride),
            visible_count: 0,
            view_projection,
        };

        for &index in &self.indices {
            let i = index as usize;
            // Descending order: the first hidden splat ends the visible
            // prefix.
            if self.depths[i] < 0.0 {
                break;
            }

            result.positions.extend_from_slice(
                &self.positions[i * pos_stride..(i + 1) * pos_stride],
            );
            result.rotations.extend_from_slice(
                &self.rotations[i * rot_stride..(i + 1) * rot_stride],
            );
            result.scales.extend_from_slice(
                &self.scales[i * scale_stride..(i + 1) * scale_stride],
            );
            result.colors.extend_from_slice(
                &self.colors[i * color_stride..(i + 1) * color_stride],
            );
            result.visible_count += 1;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_points(points: &[[f32; 3]]) -> SortEngine {
        let positions: Vec<f32> =
            points.iter().flat_map(|p| p.iter().copied()).collect();
        let rotations: Vec<f32> = points
            .iter()
            .flat_map(|_| [0.0, 0.0, 0.0, 1.0])
            .collect();
        let scales = vec![0.0; points.len() * 3];
        let colors: Vec<f32> = (0..points.len())
            .flat_map(|i| [i as f32, 0.0, 0.0, 1.0])
            .collect();

        let mut engine = SortEngine::new();
        assert_eq!(
            engine.set_buffers(positions, rotations, scales, colors),
            Ok(())
        );
        engine
    }

    /// Recover the original point index from the marker stashed in the
    /// red channel.
    fn order_by_color(result: &SortResult) -> Vec<usize> {
        result
            .colors
            .chunks(4)
            .map(|c| c[0] as usize)
            .collect()
    }

    #[test]
    fn test_identity_matrix_keeps_plane_points() {
        // Three points on the z=0 plane all project to depth 0 under the
        // identity matrix: every one is visible and ties keep input order.
        let mut engine = engine_with_points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let result = engine.sort(Mat4::IDENTITY);

        assert_eq!(result.visible_count, 3);
        assert_eq!(order_by_color(&result), vec![0, 1, 2]);
        assert_eq!(result.view_projection, Mat4::IDENTITY);
    }

    #[test]
    fn test_descending_depth_order() {
        let mut engine = engine_with_points(&[
            [0.0, 0.0, 0.5],
            [0.0, 0.0, 0.2],
            [0.0, 0.0, 0.8],
        ]);
        let result = engine.sort(Mat4::IDENTITY);

        // Reference ordering by descending z: 0.8, 0.5, 0.2.
        assert_eq!(order_by_color(&result), vec![2, 0, 1]);
    }

    #[test]
    fn test_matches_reference_ordering_through_view() {
        let view = Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
        );
        let proj = Mat4::perspective_rh(
            45.0_f32.to_radians(),
            1.0,
            0.1,
            100.0,
        );
        let vp = proj * view;

        let points =
            [[0.0, 0.0, 0.0], [0.0, 0.0, 2.0], [0.0, 0.0, -2.0]];
        let mut engine = engine_with_points(&points);
        let result = engine.sort(vp);

        // Independently computed reference: sort indices by descending
        // clip-space depth.
        let mut reference: Vec<usize> = (0..points.len()).collect();
        let depth = |i: usize| {
            let clip = vp * Vec3::from_array(points[i]).extend(1.0);
            clip.z / clip.w
        };
        reference.sort_by(|&a, &b| depth(b).total_cmp(&depth(a)));

        assert_eq!(result.visible_count, 3);
        assert_eq!(order_by_color(&result), reference);
    }

    #[test]
    fn test_behind_plane_culled_and_packed() {
        let mut engine = engine_with_points(&[
            [0.0, 0.0, -0.5],
            [0.0, 0.0, 0.3],
            [0.0, 0.0, -0.1],
            [0.0, 0.0, 0.7],
        ]);
        let result = engine.sort(Mat4::IDENTITY);

        assert_eq!(result.visible_count, 2);
        assert_eq!(order_by_color(&result), vec![3, 1]);
        // Densely packed: array lengths agree with the visible count.
        assert_eq!(result.positions.len(), 2 * 3);
        assert_eq!(result.rotations.len(), 2 * 4);
        assert_eq!(result.scales.len(), 2 * 3);
        assert_eq!(result.colors.len(), 2 * 4);
    }

    #[test]
    fn test_visible_count_bounded_by_model() {
        let mut engine = engine_with_points(&[
            [0.0, 0.0, 0.1],
            [0.0, 0.0, 0.2],
        ]);
        let result = engine.sort(Mat4::IDENTITY);
        assert!(result.visible_count as usize <= engine.num_splats());
    }

    #[test]
    fn test_rejects_mismatched_buffers() {
        let mut engine = SortEngine::new();
        let result = engine.set_buffers(
            vec![0.0; 3],
            vec![0.0; 8],
            vec![0.0; 3],
            vec![0.0; 4],
        );
        assert!(result.is_err());
        assert!(!engine.has_model());
    }

    #[test]
    fn test_carries_rotations_and_scales_with_their_splat() {
        let positions = vec![0.0, 0.0, 0.2, 0.0, 0.0, 0.9];
        let rotations =
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let scales = vec![0.1, 0.1, 0.1, 0.2, 0.2, 0.2];
        let colors = vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut engine = SortEngine::new();
        assert_eq!(
            engine.set_buffers(positions, rotations, scales, colors),
            Ok(())
        );
        let result = engine.sort(Mat4::IDENTITY);

        // Splat 1 (z = 0.9) is farther and comes first, bringing its
        // rotation, scale, and color along.
        assert_eq!(result.visible_count, 2);
        assert_eq!(&result.rotations[..4], &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(&result.scales[..3], &[0.2, 0.2, 0.2]);
        assert_eq!(&result.colors[..4], &[0.0, 1.0, 0.0, 1.0]);
    }
}
