//! Shader stage sources.
//!
//! A stage that cannot be read yields an empty source. The renderer refuses
//! to compile an empty stage, so the failure surfaces there as a compile
//! error instead of being dropped.

use std::path::{Path, PathBuf};

pub const VERTEX_FILE: &str = "vertex.wgsl";
pub const FRAGMENT_FILE: &str = "fragment.wgsl";

/// Vertex and fragment stage source text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read `vertex.wgsl` and `fragment.wgsl` from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vertex: read_source(dir.join(VERTEX_FILE)),
            fragment: read_source(dir.join(FRAGMENT_FILE)),
        }
    }
}

/// Read a source file in full, or return an empty string on failure.
pub fn read_source(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(src) => {
            log::debug!("Read shader source {:?} ({} bytes)", path, src.len());
            src
        }
        Err(e) => {
            log::error!("error loading {:?}: {}", path, e);
            String::new()
        }
    }
}

/// Where shader sources come from: compiled into the binary or a directory.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ShaderOrigin {
    #[default]
    Embedded,
    Dir(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_stage_is_empty() {
        let sources = ShaderSources::from_dir("no/such/shader/dir");
        assert!(sources.vertex.is_empty());
        assert!(sources.fragment.is_empty());
    }

    #[test]
    fn reads_both_stages_from_dir() {
        let dir = std::env::temp_dir().join(format!("svarog-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join(VERTEX_FILE), "// vs").expect("write vs");
        std::fs::write(dir.join(FRAGMENT_FILE), "// fs").expect("write fs");
        let sources = ShaderSources::from_dir(&dir);
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(sources, ShaderSources::new("// vs", "// fs"));
    }
}
