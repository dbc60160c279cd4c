use crate::{Mat4, Vec3};

/// Perspective projection parameters (right-handed, depth in [0, 1]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub const DEFAULT: Self = Self {
        fov_y_deg: 70.0,
        z_near: 0.1,
        z_far: 100.0,
    };

    /// `aspect` must be finite and positive; a zero-height viewport is the
    /// caller's bug.
    #[inline]
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        debug_assert!(aspect.is_finite() && aspect > 0.0, "bad aspect {aspect}");
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, self.z_near, self.z_far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Coordinate axis a camera path moves along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Camera position, owned by the frame loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    start: Vec3,
    frames: u64,
}

impl CameraState {
    pub fn new(start: Vec3) -> Self {
        Self {
            position: start,
            start,
            frames: 0,
        }
    }

    /// Number of times the camera has been advanced.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 1.0))
    }
}

/// Fixed, input-free camera motion: `step` units along `axis` per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPath {
    pub axis: Axis,
    pub step: f32,
}

impl CameraPath {
    pub const DEFAULT: Self = Self {
        axis: Axis::Z,
        step: 0.01,
    };

    /// Move the camera by one frame. Called once per rendered frame.
    ///
    /// The position is recomputed from the start point, so it does not
    /// accumulate rounding error over long runs.
    pub fn advance(&self, state: &mut CameraState) {
        state.frames += 1;
        state.position = self.position_after(state.start, state.frames);
    }

    pub fn position_after(&self, start: Vec3, frames: u64) -> Vec3 {
        let offset = (f64::from(self.step) * frames as f64) as f32;
        start + self.axis.unit() * offset
    }
}

impl Default for CameraPath {
    fn default() -> Self {
        Self::DEFAULT
    }
}
