//! Core types: math re-exports, Transform, camera path and frame matrices.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod frame;
pub mod transform;
