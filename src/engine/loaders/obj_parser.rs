//! Minimal Wavefront OBJ reader for single-object, pre-triangulated files.
//!
//! Only `v`, `vt` and `f` records are understood; every other line is
//! skipped. Each `v` record produces exactly one vertex, so a vertex shared
//! by several faces keeps a single texture coordinate and a single normal:
//! whichever face touches it last wins.

use std::path::Path;
use std::str::SplitWhitespace;

use cgmath::{ InnerSpace, Vector3 };

use crate::engine::components::mesh::Vertex;
use crate::engine::error::ObjParseError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedObj {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ParsedObj {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    position: usize,
    tex_coord: Option<usize>,
}

struct Face {
    line: usize,
    corners: [Corner; 3],
}

pub fn load_obj_file(path: &Path) -> Result<ParsedObj, ObjParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ObjParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_obj(&text)?;
    log::info!(
        "Parsed {}: {} vertices, {} triangles",
        path.display(),
        parsed.vertices.len(),
        parsed.triangle_count()
    );
    Ok(parsed)
}

pub fn parse_obj(text: &str) -> Result<ParsedObj, ObjParseError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let content = raw.split('#').next().unwrap_or_default();
        let mut fields = content.split_whitespace();

        match fields.next() {
            Some("v") => positions.push(parse_floats::<3>(fields, line)?),
            Some("vt") => tex_coords.push(parse_floats::<2>(fields, line)?),
            Some("f") => faces.push(parse_face(fields, line)?),
            _ => {}
        }
    }

    let mut vertices: Vec<Vertex> = positions
        .iter()
        .map(|&position| Vertex::new(position, [0.0; 3], [0.0; 2]))
        .collect();
    let mut indices = Vec::with_capacity(faces.len() * 3);

    for face in &faces {
        for corner in &face.corners {
            if corner.position >= vertices.len() {
                return Err(out_of_range(face.line, "vertex", corner.position, vertices.len()));
            }
            if let Some(t) = corner.tex_coord {
                let uv = *tex_coords
                    .get(t)
                    .ok_or_else(|| out_of_range(face.line, "texture coordinate", t, tex_coords.len()))?;
                vertices[corner.position].tex_coords = uv;
            }
        }

        let [a, b, c] = face.corners.map(|corner| corner.position);
        let normal = face_normal(positions[a], positions[b], positions[c]);
        for index in [a, b, c] {
            vertices[index].normal = normal;
            indices.push(index as u32);
        }
    }

    Ok(ParsedObj { vertices, indices })
}

/// Right-handed normal of the triangle (p1 - p0) x (p2 - p0). Degenerate
/// triangles give a zero normal.
fn face_normal(p0: [f32; 3], p1: [f32; 3], p2: [f32; 3]) -> [f32; 3] {
    let p0 = Vector3::from(p0);
    let n = (Vector3::from(p1) - p0).cross(Vector3::from(p2) - p0);
    if n.magnitude2() > 0.0 { n.normalize().into() } else { [0.0; 3] }
}

fn syntax(line: usize, message: String) -> ObjParseError {
    ObjParseError::Syntax { line, message }
}

fn out_of_range(line: usize, what: &str, index: usize, len: usize) -> ObjParseError {
    syntax(line, format!("{} index {} out of range ({} defined)", what, index + 1, len))
}

/// Reads the first `N` fields as floats. Extra fields, such as a `w`
/// component, are ignored.
fn parse_floats<const N: usize>(
    fields: SplitWhitespace<'_>,
    line: usize
) -> Result<[f32; N], ObjParseError> {
    let values = fields
        .take(N)
        .map(|field| field.parse::<f32>().map_err(|_| syntax(line, format!("bad number '{}'", field))))
        .collect::<Result<Vec<_>, _>>()?;

    <[f32; N]>::try_from(values.as_slice()).map_err(|_| {
        syntax(line, format!("expected {} values, found {}", N, values.len()))
    })
}

fn parse_face(fields: SplitWhitespace<'_>, line: usize) -> Result<Face, ObjParseError> {
    let corners = fields.map(|group| parse_corner(group, line)).collect::<Result<Vec<_>, _>>()?;

    match corners.as_slice() {
        &[a, b, c] => Ok(Face { line, corners: [a, b, c] }),
        _ => {
            let message = format!("face has {} vertices, only triangles are supported", corners.len());
            Err(syntax(line, message))
        }
    }
}

/// `v`, `v/t`, `v//n` or `v/t/n`, 1-based.
fn parse_corner(group: &str, line: usize) -> Result<Corner, ObjParseError> {
    let mut parts = group.split('/');
    let position = parse_index(parts.next().unwrap_or_default(), line)?;
    let tex_coord = match parts.next() {
        Some(t) if !t.is_empty() => Some(parse_index(t, line)?),
        _ => None,
    };
    Ok(Corner { position, tex_coord })
}

fn parse_index(field: &str, line: usize) -> Result<usize, ObjParseError> {
    let index = field.parse::<i64>().map_err(|_| syntax(line, format!("bad index '{}'", field)))?;
    if index < 1 {
        return Err(syntax(line, format!("index {} out of range", index)));
    }
    Ok((index - 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# single triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn parses_single_triangle() {
        let obj = parse_obj(TRIANGLE).unwrap();
        assert_eq!(obj.triangle_count(), 1);
        assert_eq!(obj.indices, vec![0, 1, 2]);
        assert_eq!(obj.vertices[1].tex_coords, [1.0, 0.0]);
        for v in &obj.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn clockwise_face_gets_flipped_normal() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 3 2\n";
        let obj = parse_obj(text).unwrap();
        assert_eq!(obj.vertices[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn shared_vertex_keeps_last_face_normal() {
        // Two triangles sharing vertex 1: the first faces +Z, the second -Y.
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
f 1 2 3
f 1 2 4
";
        let obj = parse_obj(text).unwrap();
        assert_eq!(obj.vertices[2].normal, [0.0, 0.0, 1.0]);
        assert_eq!(obj.vertices[0].normal, [0.0, -1.0, 0.0]);
        assert_eq!(obj.vertices[3].normal, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn quads_are_rejected_with_line_number() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let err = parse_obj(text).unwrap_err();
        assert!(matches!(err, ObjParseError::Syntax { line: 5, .. }));
    }

    #[test]
    fn bad_number_reports_its_line() {
        let err = parse_obj("v 0 0 0\nv 1 x 0\n").unwrap_err();
        assert!(matches!(err, ObjParseError::Syntax { line: 2, .. }));
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let err = parse_obj("vt 0.5\n").unwrap_err();
        assert!(matches!(err, ObjParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn extra_components_and_trailing_comments_are_ignored() {
        let text = "\
v 0 0 0 # origin
v 1 0 0 1.0
v 0 1 0
vt 0.5 0.5 0.0
f 1/1 2/1 3/1 # only face
";
        let parsed = parse_obj(text).unwrap();

        assert_eq!(parsed.vertices.len(), 3);
        assert_eq!(parsed.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(parsed.vertices[2].tex_coords, [0.5, 0.5]);
        assert_eq!(parsed.indices, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, ObjParseError::Syntax { line: 3, .. }));
        assert!(parse_obj("v 0 0 0\nf 0 1 1\n").is_err());
    }
}
