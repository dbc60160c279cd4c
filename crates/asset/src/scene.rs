//! Initialization phase: resolve the configured sources into upload-ready data.

use crate::{
    error::{AssetError, AssetResult},
    mesh::MeshSource,
    normalize::{self, NormalizedMesh},
    texture::{TextureData, TextureSource},
};

/// What to load at startup. `texture: None` selects the untextured pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub mesh: MeshSource,
    pub texture: Option<TextureSource>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mesh: MeshSource::InlineQuad,
            texture: Some(TextureSource::Checker(64)),
        }
    }
}

/// Everything the renderer uploads. Consumed by the upload step.
#[derive(Clone, Debug)]
pub struct SceneAssets {
    pub mesh: NormalizedMesh,
    pub texture: Option<TextureData>,
}

impl SceneAssets {
    #[inline]
    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    /// Load, normalize and check capabilities. Any error is fatal to startup.
    pub fn load(config: &SceneConfig) -> AssetResult<Self> {
        let mesh = normalize::normalize(config.mesh.load()?)?;

        // Checked before the texture is decoded so a bad pairing fails early.
        require_texcoords(&mesh, config.texture.is_some())?;

        let texture = config.texture.as_ref().map(TextureSource::load).transpose()?;
        Self::new(mesh, texture)
    }

    /// Pair a mesh with an optional texture, enforcing the texcoord requirement.
    pub fn new(mesh: NormalizedMesh, texture: Option<TextureData>) -> AssetResult<Self> {
        require_texcoords(&mesh, texture.is_some())?;
        Ok(Self { mesh, texture })
    }
}

fn require_texcoords(mesh: &NormalizedMesh, textured: bool) -> AssetResult<()> {
    if textured && !mesh.has_texcoords() {
        return Err(AssetError::UnsupportedFormat(
            "textured rendering needs texture coordinates, but the mesh has none".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bmp::tests::bitmap, mesh::RawMesh, obj};

    fn untextured_mesh() -> NormalizedMesh {
        let raw = obj::load_obj_from_str("v 0 0 0\nv 4 0 0\nv 0 2 0\nf 1 2 3\n").expect("parse");
        normalize::normalize(raw).expect("normalize")
    }

    #[test]
    fn default_scene_is_textured_quad() {
        let scene = SceneAssets::load(&SceneConfig::default()).expect("load");
        assert!(scene.is_textured());
        assert_eq!(scene.mesh.positions, RawMesh::inline_quad().positions);
    }

    #[test]
    fn texture_without_texcoords_is_unsupported() {
        let texture = Some(TextureData::create_test_texture(8));
        assert!(matches!(
            SceneAssets::new(untextured_mesh(), texture),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn untextured_mesh_without_texture_is_fine() {
        let scene = SceneAssets::new(untextured_mesh(), None).expect("scene");
        assert!(!scene.is_textured());
        assert!(scene.mesh.positions.iter().all(|c| c.abs() <= 1.0 + normalize::EPSILON));
    }

    #[test]
    fn bitmap_texture_source_is_decoded() {
        let path = std::env::temp_dir().join(format!("svarog-scene-{}.bmp", std::process::id()));
        std::fs::write(&path, bitmap(1, 1, 1, 24, &[1, 2, 3])).expect("write fixture");
        let config = SceneConfig {
            mesh: MeshSource::InlineQuad,
            texture: Some(TextureSource::File(path.clone())),
        };
        let scene = SceneAssets::load(&config);
        let _ = std::fs::remove_file(&path);
        let texture = scene.expect("load").texture.expect("texture");
        assert_eq!(texture.data, vec![3, 2, 1, 255]);
    }

    #[test]
    fn bad_bitmap_aborts_loading() {
        let path = std::env::temp_dir().join(format!("svarog-planes-{}.bmp", std::process::id()));
        std::fs::write(&path, bitmap(1, 1, 2, 24, &[0, 0, 0])).expect("write fixture");
        let config = SceneConfig {
            mesh: MeshSource::InlineQuad,
            texture: Some(TextureSource::File(path.clone())),
        };
        let scene = SceneAssets::load(&config);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(scene, Err(AssetError::UnsupportedFormat(_))));
    }
}
