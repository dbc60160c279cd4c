//! Rescale and recenter mesh positions into the canonical [-1, 1] cube.
//!
//! The largest axis extent is mapped onto [-1, 1]; the other axes get the same
//! scale factor, so proportions are preserved. Every output coordinate is then
//! checked against the cube with a tolerance of [`EPSILON`].

use std::ops::Deref;

use crate::{
    error::{AssetError, AssetResult},
    mesh::RawMesh,
};

pub const EPSILON: f32 = 0.001;
const TOLERANCE: f64 = EPSILON as f64;

/// Axis-aligned bounds of a position array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    /// Bounds of xyz triplets, computed in one pass. `None` for no vertices.
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        if positions.len() < 3 {
            return None;
        }
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in positions.chunks_exact(3) {
            for axis in 0..3 {
                if v[axis] < min[axis] {
                    min[axis] = v[axis];
                }
                if v[axis] > max[axis] {
                    max[axis] = v[axis];
                }
            }
        }
        Some(Self { min, max })
    }

    /// Per-axis extents, widened to f64 so a span near `f32::MAX` stays finite.
    pub fn extents(&self) -> [f64; 3] {
        [0, 1, 2].map(|axis| f64::from(self.max[axis]) - f64::from(self.min[axis]))
    }

    /// Largest extent. Ties go to the later axis (Z over Y over X).
    pub fn max_extent(&self) -> f64 {
        let [x, y, z] = self.extents();
        let mut max_extent = 0.0;
        if x >= y && x >= z {
            max_extent = x;
        }
        if y >= x && y >= z {
            max_extent = y;
        }
        if z >= x && z >= y {
            max_extent = z;
        }
        max_extent
    }

    pub fn center(&self) -> [f64; 3] {
        let e = self.extents();
        [0, 1, 2].map(|axis| f64::from(self.min[axis]) + e[axis] / 2.0)
    }
}

/// Mesh whose positions lie inside the canonical cube.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMesh(RawMesh);

impl NormalizedMesh {
    pub fn into_inner(self) -> RawMesh {
        self.0
    }
}

impl Deref for NormalizedMesh {
    type Target = RawMesh;

    fn deref(&self) -> &RawMesh {
        &self.0
    }
}

/// Normalize a mesh, consuming it.
pub fn normalize(mut mesh: RawMesh) -> AssetResult<NormalizedMesh> {
    normalize_positions(&mut mesh.positions)?;
    Ok(NormalizedMesh(mesh))
}

/// Normalize xyz triplets in place. Returns the bounds before the transform.
///
/// An empty array is left untouched. When all vertices coincide the mesh is
/// only recentered, since there is no extent to scale by.
pub fn normalize_positions(positions: &mut [f32]) -> AssetResult<Option<Aabb>> {
    let Some(bounds) = Aabb::from_positions(positions) else {
        return Ok(None);
    };

    let max_extent = bounds.max_extent();
    let scale = if max_extent > 0.0 { 2.0 / max_extent } else { 1.0 };
    let shift = bounds.center();
    log::debug!(
        "Normalizing mesh: min={:?} max={:?} scale={} shift={:?}",
        bounds.min,
        bounds.max,
        scale,
        shift
    );

    for (i, v) in positions.chunks_exact_mut(3).enumerate() {
        for axis in 0..3 {
            let n = (f64::from(v[axis]) - shift[axis]) * scale;
            if !(-1.0 - TOLERANCE..=1.0 + TOLERANCE).contains(&n) {
                return Err(AssetError::InvariantViolation(format!(
                    "vertex {i} axis {axis} normalized to {n}, outside [-1, 1]"
                )));
            }
            v[axis] = n as f32;
        }
    }

    Ok(Some(bounds))
}
