use bytemuck::{Pod, Zeroable};

use crate::normalize::NormalizationParams;

/// std140 mirror of the `DrawParams` block declared in `compile.rs`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct DrawParams {
    pub projection: [[f32; 4]; 4],
    pub translation: [f32; 2],
    pub size: f32,
    pub _padding: f32,
    pub normalize_mult: [f32; 4],
    pub normalize_add: [f32; 4],
}

impl DrawParams {
    /// A `size`-pixel square at `translation` on a `width` x `height` target.
    pub fn new(width: u32, height: u32, translation: [f32; 2], size: f32) -> Self {
        Self {
            projection: orthographic(width, height),
            translation,
            size,
            _padding: 0.0,
            normalize_mult: NormalizationParams::NEUTRAL.mult_vec4(),
            normalize_add: NormalizationParams::NEUTRAL.add_vec4(),
        }
    }

    /// Covers a square target edge to edge.
    pub fn full_target(edge: u32) -> Self {
        Self::new(edge, edge, [0.0, 0.0], edge as f32)
    }

    pub fn with_normalization(mut self, params: &NormalizationParams) -> Self {
        self.normalize_mult = params.mult_vec4();
        self.normalize_add = params.add_vec4();
        self
    }
}

/// Column-major pixel-to-clip projection with the origin at the top-left and
/// y pointing down.
pub(crate) fn orthographic(width: u32, height: u32) -> [[f32; 4]; 4] {
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    [
        [2.0 / width, 0.0, 0.0, 0.0],
        [0.0, -2.0 / height, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(matrix: &[[f32; 4]; 4], x: f32, y: f32) -> [f32; 2] {
        let column = |c: usize, row: usize| matrix[c][row];
        [
            column(0, 0) * x + column(1, 0) * y + column(3, 0),
            column(0, 1) * x + column(1, 1) * y + column(3, 1),
        ]
    }

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<DrawParams>(), 112);
        assert_eq!(std::mem::offset_of!(DrawParams, translation), 64);
        assert_eq!(std::mem::offset_of!(DrawParams, size), 72);
        assert_eq!(std::mem::offset_of!(DrawParams, normalize_mult), 80);
        assert_eq!(std::mem::offset_of!(DrawParams, normalize_add), 96);
    }

    fn assert_near(actual: [f32; 2], expected: [f32; 2]) {
        assert!(
            (actual[0] - expected[0]).abs() < 1e-5 && (actual[1] - expected[1]).abs() < 1e-5,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn projection_puts_origin_top_left() {
        let matrix = orthographic(1280, 900);
        assert_near(project(&matrix, 0.0, 0.0), [-1.0, 1.0]);
        assert_near(project(&matrix, 1280.0, 900.0), [1.0, -1.0]);
        assert_near(project(&matrix, 640.0, 450.0), [0.0, 0.0]);
    }

    #[test]
    fn normalization_fills_vec4_lanes() {
        let params = NormalizationParams {
            mult: [2.0, 3.0, 4.0],
            add: [-1.0, -2.0, -3.0],
        };
        let draw = DrawParams::full_target(4).with_normalization(&params);
        assert_eq!(draw.normalize_mult, [2.0, 3.0, 4.0, 1.0]);
        assert_eq!(draw.normalize_add, [-1.0, -2.0, -3.0, 0.0]);
        assert_eq!(draw.size, 4.0);
    }
}
