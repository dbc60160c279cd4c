//! Per-frame projection and placement matrices.
//!
//! Pure functions of their inputs: the frame index is passed in, so calling
//! the generator twice with the same state gives the same matrices.

use crate::{
    Mat4,
    camera::{CameraState, Projection},
    transform::Transform,
};

/// Rotation of the mesh about the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RotationMode {
    /// Constant angle in radians.
    Fixed(f32),
    /// `per_frame` radians for every frame rendered so far.
    Spin { per_frame: f32 },
}

impl RotationMode {
    pub fn angle(&self, frame: u64) -> f32 {
        match *self {
            RotationMode::Fixed(angle) => angle,
            RotationMode::Spin { per_frame } => (f64::from(per_frame) * frame as f64) as f32,
        }
    }
}

impl Default for RotationMode {
    fn default() -> Self {
        RotationMode::Fixed(0.0)
    }
}

/// Drawable surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        debug_assert!(self.height > 0, "zero-height viewport");
        self.width as f32 / self.height as f32
    }
}

/// Matrices handed to the draw call for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransforms {
    pub projection: Mat4,
    pub placement: Mat4,
}

impl FrameTransforms {
    /// Projection as 16 column-major floats.
    #[inline]
    pub fn projection_cols(&self) -> [f32; 16] {
        self.projection.to_cols_array()
    }

    /// Placement as 16 column-major floats.
    #[inline]
    pub fn placement_cols(&self) -> [f32; 16] {
        self.placement.to_cols_array()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTransformGenerator {
    pub projection: Projection,
    pub rotation: RotationMode,
}

impl FrameTransformGenerator {
    pub fn new(projection: Projection, rotation: RotationMode) -> Self {
        Self {
            projection,
            rotation,
        }
    }

    pub fn generate(&self, camera: &CameraState, viewport: Viewport, frame: u64) -> FrameTransforms {
        let yaw = self.rotation.angle(frame);
        FrameTransforms {
            projection: self.projection.matrix(viewport.aspect()),
            placement: Transform::placement(camera.position, yaw).matrix(),
        }
    }
}
