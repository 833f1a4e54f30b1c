use crate::error::{Error, Result};
use crate::mesh::{BufferMesh, IndexData, SubMesh};
use crate::vertex::Vertex;

pub const CUBE_MESH_NAME: &str = "CustomCubeGeometry";

const CUBE_VERTEX_COUNT: usize = 24;
const CUBE_INDEX_COUNT: usize = 36;

/// One cube face: outward normal, corner signs (scaled by the half size),
/// and the two triangles relative to the face's first vertex.
struct Face {
    normal: [f32; 3],
    corners: [[f32; 3]; 4],
    triangles: [u16; 6],
}

// Faces that wind 0-2-1 / 2-0-3 against those that wind 0-2-3 / 2-0-1.
const WIND_A: [u16; 6] = [0, 2, 1, 2, 0, 3];
const WIND_B: [u16; 6] = [0, 2, 3, 2, 0, 1];

// Up, down, left, right, front, back.
const FACES: [Face; 6] = [
    Face {
        normal: [0.0, 1.0, 0.0],
        corners: [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
        triangles: WIND_A,
    },
    Face {
        normal: [0.0, -1.0, 0.0],
        corners: [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
        triangles: WIND_B,
    },
    Face {
        normal: [-1.0, 0.0, 0.0],
        corners: [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0]],
        triangles: WIND_A,
    },
    Face {
        normal: [1.0, 0.0, 0.0],
        corners: [[1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [1.0, -1.0, -1.0]],
        triangles: WIND_B,
    },
    Face {
        normal: [0.0, 0.0, 1.0],
        corners: [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
        triangles: WIND_A,
    },
    Face {
        normal: [0.0, 0.0, -1.0],
        corners: [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0]],
        triangles: WIND_B,
    },
];

/// Builds an axis-aligned cube with half extent `size`.
///
/// Rejects sizes that are not finite or not strictly positive.
pub fn create_cube(size: f32) -> Result<BufferMesh> {
    if !size.is_finite() || size <= 0.0 {
        return Err(Error::InvalidSize(size));
    }
    Ok(cube_geometry(size))
}

/// Cube geometry for any `size`, including degenerate ones.
///
/// 24 position/normal vertices (four per face so each face keeps its own
/// normal), 36 `u16` indices wound counter-clockwise from outside, and a
/// single sub-mesh covering every index.
pub fn cube_geometry(size: f32) -> BufferMesh {
    let mut vertices: Vec<Vertex> = Vec::with_capacity(CUBE_VERTEX_COUNT);
    let mut indices: Vec<u16> = Vec::with_capacity(CUBE_INDEX_COUNT);

    for face in &FACES {
        let base = vertices.len() as u16;
        for [x, y, z] in face.corners {
            vertices.push(Vertex::new([x * size, y * size, z * size], face.normal));
        }
        indices.extend(face.triangles.iter().map(|i| base + i));
    }

    let mesh = BufferMesh::from_parts(
        CUBE_MESH_NAME,
        bytemuck::cast_slice(&vertices).to_vec(),
        Vertex::STRIDE,
        IndexData::UInt16(indices),
        Vertex::elements(),
        vec![SubMesh { start: 0, count: CUBE_INDEX_COUNT }],
    );

    log::trace!("Built cube of size {}: {} vertices, {} indices", size, mesh.vertex_count(), mesh.index_count());
    mesh
}
