//! Minimal OBJ parser producing the first shape of a file as a [`RawMesh`].
//!
//! Shapes are delimited by `o` and `g` directives; faces that appear before
//! any of them belong to an unnamed leading shape. Shapes without faces are
//! skipped, so the result is the first shape that actually has geometry.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{
    error::{AssetError, AssetResult},
    mesh::RawMesh,
};

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> AssetResult<RawMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
    log::info!("Loading mesh from {:?}", path);
    let mesh = parse_obj(BufReader::new(file)).map_err(|e| match e {
        AssetError::Io { source, .. } => AssetError::io(path, source),
        other => other,
    })?;
    log::info!(
        "Loaded mesh: {} vertices, {} triangles, texcoords={}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.has_texcoords()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> AssetResult<RawMesh> {
    parse_obj(reader)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> AssetResult<RawMesh> {
    parse_obj(io::Cursor::new(contents))
}

/// Per-shape vertex de-duplication keyed on (position, texcoord).
#[derive(Default)]
struct ShapeBuilder {
    unique: HashMap<(usize, Option<usize>), u32>,
    positions: Vec<f32>,
    texcoords: Vec<Option<[f32; 2]>>,
    indices: Vec<u32>,
}

impl ShapeBuilder {
    fn has_faces(&self) -> bool {
        !self.indices.is_empty()
    }

    fn vertex(
        &mut self,
        key: (usize, Option<usize>),
        positions: &[[f32; 3]],
        texcoords: &[[f32; 2]],
        line: usize,
    ) -> AssetResult<u32> {
        if let Some(&idx) = self.unique.get(&key) {
            return Ok(idx);
        }
        let idx = u32::try_from(self.texcoords.len())
            .map_err(|_| AssetError::parse(line, format!("too many vertices (>{})", u32::MAX)))?;
        let (vi, vti) = key;
        self.positions.extend_from_slice(&positions[vi]);
        self.texcoords.push(vti.map(|i| texcoords[i]));
        self.unique.insert(key, idx);
        Ok(idx)
    }

    fn finish(self) -> RawMesh {
        let texcoords = if self.texcoords.iter().any(Option::is_some) {
            self.texcoords
                .iter()
                .flat_map(|uv| uv.unwrap_or([0.0, 0.0]))
                .collect()
        } else {
            Vec::new()
        };
        RawMesh::new(self.positions, texcoords, self.indices)
    }
}

fn parse_obj<R: BufRead>(reader: R) -> AssetResult<RawMesh> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();

    let mut shape = ShapeBuilder::default();
    // Set once the first shape with faces has been closed; later faces are
    // still checked but produce no geometry.
    let mut first_done = false;

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| AssetError::io("<obj stream>", e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                normals.push([nx, ny, nz]);
            }
            "o" | "g" => {
                if shape.has_faces() {
                    first_done = true;
                }
            }
            "f" => {
                let mut face: Vec<(usize, Option<usize>)> = Vec::new();
                for part in parts {
                    let (vi, vti, _vni) = parse_face_vertex(
                        part,
                        positions.len(),
                        texcoords.len(),
                        normals.len(),
                        line_no,
                    )?;
                    face.push((vi, vti));
                }
                if face.len() < 3 {
                    return Err(AssetError::parse(
                        line_no,
                        format!("face needs at least 3 vertices, found {}", face.len()),
                    ));
                }
                if first_done {
                    continue;
                }

                let mut face_indices = Vec::with_capacity(face.len());
                for key in face {
                    face_indices.push(shape.vertex(key, &positions, &texcoords, line_no)?);
                }
                // Triangulate fan
                for tri in 1..(face_indices.len() - 1) {
                    shape.indices.push(face_indices[0]);
                    shape.indices.push(face_indices[tri]);
                    shape.indices.push(face_indices[tri + 1]);
                }
            }
            _ => {
                // Ignore other directives (s/usemtl/mtllib/etc.)
            }
        }
    }

    if !shape.has_faces() {
        return Err(AssetError::parse(0, "OBJ contains no shape with faces"));
    }

    Ok(shape.finish())
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| AssetError::parse(line_no, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|e| AssetError::parse(line_no, format!("invalid {what} '{token}': {e}")))
}

fn parse_face_vertex(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> AssetResult<(usize, Option<usize>, Option<usize>)> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AssetError::parse(line_no, format!("malformed face element '{token}'")))?;
    let pos_idx = resolve_index(pos, pos_count, line_no)?;

    let tex_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let norm_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    if split.next().is_some() {
        return Err(AssetError::parse(
            line_no,
            format!("malformed face element '{token}'"),
        ));
    }

    Ok((pos_idx, tex_idx, norm_idx))
}

fn resolve_index(token: &str, len: usize, line_no: usize) -> AssetResult<usize> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| AssetError::parse(line_no, format!("invalid index '{token}'")))?;
    if raw == 0 {
        return Err(AssetError::parse(
            line_no,
            "OBJ indices are 1-based; found 0",
        ));
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        return Err(AssetError::parse(
            line_no,
            format!("index {raw} resolved out of bounds (len={len})"),
        ));
    }

    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let mesh = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.texcoords, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        mesh.validate().expect("valid");
    }

    #[test]
    fn quad_face_is_fan_triangulated_and_shared_vertices_dedup() {
        let src = "
            v -1 -1 0
            v 1 -1 0
            v 1 1 0
            v -1 1 0
            f 1 2 3 4
            f 1 3 4
        ";
        let mesh = load_obj_from_str(src).expect("parse quad");
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 0, 2, 3]);
    }

    #[test]
    fn no_texcoord_records_leave_texcoords_empty() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert!(!mesh.has_texcoords());
        assert_eq!(mesh.positions.len(), 9);
    }

    #[test]
    fn only_first_shape_with_faces_is_returned() {
        let src = "
            o empty
            v 0 0 0
            v 1 0 0
            v 0 1 0
            v 0 0 1
            o first
            f 1 2 3
            o second
            f 1 2 4
            f 2 3 4
        ";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(&mesh.positions[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn later_shapes_are_still_syntax_checked() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\ng other\nf 1 2 9\n";
        let err = load_obj_from_str(src).unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 6, .. }), "{err}");
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn malformed_number_reports_line() {
        let src = "v 0 0 0\nv 1 zero 0\n";
        match load_obj_from_str(src) {
            Err(AssetError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn zero_index_and_degenerate_face_are_errors() {
        assert!(matches!(
            load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n"),
            Err(AssetError::Parse { line: 4, .. })
        ));
        assert!(matches!(
            load_obj_from_str("v 0 0 0\nv 1 0 0\nf 1 2\n"),
            Err(AssetError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn bundled_cube_loads_and_normalizes() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../resources/cube.obj");
        let mesh = load_obj_from_path(path).expect("load cube");
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.has_texcoords());
        mesh.validate().expect("valid");
        let normalized = crate::normalize::normalize(mesh).expect("normalize");
        assert!(normalized.positions.iter().all(|c| c.abs() <= 1.0));
    }

    #[test]
    fn file_without_faces_is_an_error() {
        assert!(matches!(
            load_obj_from_str("v 0 0 0\n"),
            Err(AssetError::Parse { line: 0, .. })
        ));
    }
}
