//! Asset loading/parsers (meshes, bitmaps, textures, shaders).
//! Everything here runs once, during startup, before the frame loop.

pub mod bmp;
pub mod error;
pub mod mesh;
pub mod normalize;
pub mod obj;
pub mod scene;
pub mod shader;
pub mod texture;

pub use error::{AssetError, AssetResult};
