//! CPU-side mesh representation used by loaders.

use std::path::PathBuf;

use crate::{
    error::{AssetError, AssetResult},
    obj,
};

/// Indexed triangle mesh with flat attribute arrays, ready for upload.
///
/// `positions` holds xyz triplets, `texcoords` uv pairs (empty when the source
/// had none) and `indices` triangles with stride 3.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMesh {
    pub positions: Vec<f32>,
    pub texcoords: Vec<f32>,
    pub indices: Vec<u32>,
}

impl RawMesh {
    pub fn new(positions: Vec<f32>, texcoords: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            texcoords,
            indices,
        }
    }

    /// Two-triangle quad spanning [-1, 1] on X and Y at z = 0.
    pub fn inline_quad() -> Self {
        Self::new(
            vec![
                1.0, 1.0, 0.0, //
                1.0, -1.0, 0.0, //
                -1.0, 1.0, 0.0, //
                -1.0, -1.0, 0.0,
            ],
            vec![
                1.0, 1.0, //
                1.0, 0.0, //
                0.0, 1.0, //
                0.0, 0.0,
            ],
            vec![3, 0, 2, 3, 1, 0],
        )
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    /// Check the structural invariants of the arrays.
    pub fn validate(&self) -> AssetResult<()> {
        if self.positions.len() % 3 != 0 {
            return Err(AssetError::InvariantViolation(format!(
                "position array length {} is not a multiple of 3",
                self.positions.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::InvariantViolation(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if self.has_texcoords() && self.texcoords.len() != self.vertex_count() * 2 {
            return Err(AssetError::InvariantViolation(format!(
                "{} texcoord floats for {} vertices",
                self.texcoords.len(),
                self.vertex_count()
            )));
        }
        let count = self.vertex_count();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(AssetError::InvariantViolation(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }
}

/// Where the viewer takes its mesh from. Resolved once at startup.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshSource {
    InlineQuad,
    File(PathBuf),
}

impl MeshSource {
    pub fn load(&self) -> AssetResult<RawMesh> {
        let mesh = match self {
            MeshSource::InlineQuad => RawMesh::inline_quad(),
            MeshSource::File(path) => obj::load_obj_from_path(path)?,
        };
        mesh.validate()?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_quad_is_valid() {
        let quad = RawMesh::inline_quad();
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.triangle_count(), 2);
        assert!(quad.has_texcoords());
        quad.validate().expect("quad is valid");
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mesh = RawMesh::new(vec![0.0; 9], vec![], vec![0, 1, 3]);
        assert!(matches!(
            mesh.validate(),
            Err(AssetError::InvariantViolation(_))
        ));
    }

    #[test]
    fn mismatched_texcoords_are_rejected() {
        let mesh = RawMesh::new(vec![0.0; 9], vec![0.0; 4], vec![0, 1, 2]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn missing_file_source_reports_io() {
        let source = MeshSource::File(PathBuf::from("definitely/not/here.obj"));
        assert!(matches!(source.load(), Err(AssetError::Io { .. })));
    }
}
