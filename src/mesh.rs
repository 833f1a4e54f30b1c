use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::vertex::{IndexFormat, VertexElement, VertexElementFormat, NORMAL, POSITION};

/// Contiguous slice of the index buffer drawn as one primitive group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMesh {
    pub start: usize,
    pub count: usize,
}

impl SubMesh {
    /// One past the last index, or `None` if the range overflows.
    #[inline]
    pub fn end(&self) -> Option<usize> {
        self.start.checked_add(self.count)
    }
}

/// Index data tagged with its width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexData {
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
}

impl IndexData {
    pub fn format(&self) -> IndexFormat {
        match self {
            IndexData::UInt8(_) => IndexFormat::UInt8,
            IndexData::UInt16(_) => IndexFormat::UInt16,
            IndexData::UInt32(_) => IndexFormat::UInt32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::UInt8(data) => data.len(),
            IndexData::UInt16(data) => data.len(),
            IndexData::UInt32(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            IndexData::UInt8(data) => data.iter().map(|&v| v as u32).collect(),
            IndexData::UInt16(data) => data.iter().map(|&v| v as u32).collect(),
            IndexData::UInt32(data) => data.clone(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::UInt8(data) => data.as_slice(),
            IndexData::UInt16(data) => bytemuck::cast_slice(data),
            IndexData::UInt32(data) => bytemuck::cast_slice(data),
        }
    }
}

impl From<Vec<u16>> for IndexData {
    fn from(data: Vec<u16>) -> Self {
        IndexData::UInt16(data)
    }
}

impl From<Vec<u32>> for IndexData {
    fn from(data: Vec<u32>) -> Self {
        IndexData::UInt32(data)
    }
}

impl Default for IndexData {
    fn default() -> Self {
        IndexData::UInt16(Vec::new())
    }
}

/// Geometry held as raw interleaved vertex floats plus an index buffer,
/// described by a vertex layout and a list of sub-meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferMesh {
    name: String,
    vertices: Vec<f32>,
    vertex_stride: u32,
    indices: IndexData,
    elements: Vec<VertexElement>,
    sub_meshes: Vec<SubMesh>,
}

impl BufferMesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vertices: Vec::new(),
            vertex_stride: 0,
            indices: IndexData::default(),
            elements: Vec::new(),
            sub_meshes: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        name: &str,
        vertices: Vec<f32>,
        vertex_stride: u32,
        indices: IndexData,
        elements: Vec<VertexElement>,
        sub_meshes: Vec<SubMesh>,
    ) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            vertex_stride,
            indices,
            elements,
            sub_meshes,
        }
    }

    /// Bind interleaved vertex data; `stride` is in bytes.
    pub fn set_vertex_buffer_binding(&mut self, vertices: Vec<f32>, stride: u32) {
        self.vertices = vertices;
        self.vertex_stride = stride;
    }

    pub fn set_index_buffer_binding(&mut self, indices: impl Into<IndexData>) {
        self.indices = indices.into();
    }

    pub fn set_vertex_elements(&mut self, elements: Vec<VertexElement>) {
        self.elements = elements;
    }

    pub fn add_sub_mesh(&mut self, start: usize, count: usize) -> Result<SubMesh> {
        let sub_mesh = SubMesh { start, count };
        Self::sub_mesh_range(&sub_mesh, self.indices.len())?;
        self.sub_meshes.push(sub_mesh);
        Ok(sub_mesh)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_stride(&self) -> u32 {
        self.vertex_stride
    }

    #[inline]
    pub fn indices(&self) -> &IndexData {
        &self.indices
    }

    #[inline]
    pub fn index_format(&self) -> IndexFormat {
        self.indices.format()
    }

    #[inline]
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    #[inline]
    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    pub fn element(&self, semantic: &str) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.semantic == semantic)
    }

    fn floats_per_vertex(&self) -> usize {
        (self.vertex_stride as usize) / size_of::<f32>()
    }

    pub fn vertex_count(&self) -> usize {
        match self.floats_per_vertex() {
            0 => 0,
            n => self.vertices.len() / n,
        }
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        self.indices.as_bytes()
    }

    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vector3_attribute(POSITION)
    }

    pub fn normals(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vector3_attribute(NORMAL)
    }

    fn vector3_attribute(&self, semantic: &str) -> impl Iterator<Item = [f32; 3]> + '_ {
        let offset = self
            .element(semantic)
            .filter(|e| e.format == VertexElementFormat::Vector3 && e.offset % 4 == 0)
            .map(|e| (e.offset / 4) as usize);
        let step = self.floats_per_vertex().max(1);

        self.vertices
            .chunks_exact(step)
            .filter_map(move |vertex| {
                let o = offset?;
                let values = vertex.get(o..o + 3)?;
                Some([values[0], values[1], values[2]])
            })
    }

    fn sub_mesh_range(sub: &SubMesh, len: usize) -> Result<std::ops::Range<usize>> {
        match sub.end() {
            Some(end) if end <= len => Ok(sub.start..end),
            _ => Err(Error::InvalidSubMesh { start: sub.start, count: sub.count, len }),
        }
    }

    /// Triangles of every sub-mesh, in sub-mesh order. Fails if a sub-mesh
    /// no longer fits the bound index buffer.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>> {
        let indices = self.indices.to_u32();
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for sub in &self.sub_meshes {
            let range = Self::sub_mesh_range(sub, indices.len())?;
            triangles.extend(indices[range].chunks_exact(3).map(|t| [t[0], t[1], t[2]]));
        }
        Ok(triangles)
    }

    /// Checks that the layout fits the interleaved stride and that every
    /// index and sub-mesh stays inside its buffer.
    pub fn validate(&self) -> Result<()> {
        let stride = self.vertex_stride;
        if stride == 0 || stride % 4 != 0 {
            return Err(Error::InvalidLayout(format!("stride {} is not a positive multiple of 4", stride)));
        }
        if self.vertices.len() % self.floats_per_vertex() != 0 {
            return Err(Error::InvalidLayout(format!(
                "{} floats do not divide into {}-byte vertices",
                self.vertices.len(),
                stride
            )));
        }

        let mut elements: Vec<&VertexElement> = self.elements.iter().collect();
        elements.sort_by_key(|e| (e.binding_index, e.offset));
        for element in &elements {
            if element.binding_index != 0 {
                return Err(Error::InvalidLayout(format!(
                    "{} is bound to slot {} but only slot 0 has a buffer",
                    element.semantic, element.binding_index
                )));
            }
            if element.end() > stride {
                return Err(Error::InvalidLayout(format!(
                    "{} ends at byte {} past stride {}",
                    element.semantic,
                    element.end(),
                    stride
                )));
            }
        }
        for pair in elements.windows(2) {
            if pair[0].end() > pair[1].offset {
                return Err(Error::InvalidLayout(format!(
                    "{} overlaps {}",
                    pair[0].semantic, pair[1].semantic
                )));
            }
        }

        let vertex_count = self.vertex_count();
        for index in self.indices.to_u32() {
            if index as usize >= vertex_count {
                return Err(Error::IndexOutOfRange { index, vertex_count });
            }
        }

        let len = self.indices.len();
        for sub in &self.sub_meshes {
            Self::sub_mesh_range(sub, len)?;
        }

        Ok(())
    }

    /// Write the mesh as Wavefront OBJ, one group per sub-mesh. The mesh is
    /// validated first, so nothing is written for a broken descriptor.
    pub fn export_obj(&self, obj_path: &Path) -> Result<()> {
        self.validate()?;

        let file = File::create(obj_path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "o {}", self.name)?;

        for [x, y, z] in self.positions() {
            writeln!(writer, "v {} {} {}", x, y, z)?;
        }

        let has_normals = self.element(NORMAL).is_some();
        for [x, y, z] in self.normals() {
            writeln!(writer, "vn {} {} {}", x, y, z)?;
        }

        // OBJ is 1-based
        let indices = self.indices.to_u32();
        for (i, sub) in self.sub_meshes.iter().enumerate() {
            writeln!(writer, "g {}_{}", self.name, i)?;
            let range = Self::sub_mesh_range(sub, indices.len())?;
            for face in indices[range].chunks_exact(3) {
                let [a, b, c] = [face[0] + 1, face[1] + 1, face[2] + 1];
                if has_normals {
                    writeln!(writer, "f {0}//{0} {1}//{1} {2}//{2}", a, b, c)?;
                } else {
                    writeln!(writer, "f {} {} {}", a, b, c)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::Vertex;

    fn triangle() -> BufferMesh {
        let mut mesh = BufferMesh::new("Triangle");
        mesh.set_vertex_buffer_binding(
            vec![
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
                0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
            ],
            Vertex::STRIDE,
        );
        mesh.set_index_buffer_binding(vec![0u16, 1, 2]);
        mesh.set_vertex_elements(Vertex::elements());
        mesh.add_sub_mesh(0, 3).unwrap();
        mesh
    }

    #[test]
    fn triangle_is_valid() {
        let mesh = triangle();
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_format(), IndexFormat::UInt16);
        assert_eq!(mesh.positions().nth(1), Some([1.0, 0.0, 0.0]));
        assert!(mesh.normals().all(|n| n == [0.0, 0.0, 1.0]));
        assert_eq!(mesh.triangles().unwrap(), vec![[0, 1, 2]]);
        assert_eq!(mesh.vertex_bytes().len(), 72);
        assert_eq!(mesh.index_bytes().len(), 6);
    }

    #[test]
    fn sub_mesh_past_index_buffer_is_rejected() {
        let mut mesh = triangle();
        let err = mesh.add_sub_mesh(2, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidSubMesh { start: 2, count: 3, len: 3 }));
        assert!(matches!(mesh.add_sub_mesh(usize::MAX, 2), Err(Error::InvalidSubMesh { .. })));
    }

    #[test]
    fn overlapping_elements_are_rejected() {
        let mut mesh = triangle();
        mesh.set_vertex_elements(vec![
            VertexElement::new(POSITION, 0, VertexElementFormat::Vector3, 0),
            VertexElement::new(NORMAL, 8, VertexElementFormat::Vector3, 0),
        ]);
        assert!(matches!(mesh.validate(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn element_past_stride_is_rejected() {
        let mut mesh = triangle();
        mesh.set_vertex_elements(vec![
            VertexElement::new(POSITION, 0, VertexElementFormat::Vector3, 0),
            VertexElement::new(NORMAL, 16, VertexElementFormat::Vector3, 0),
        ]);
        assert!(matches!(mesh.validate(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = triangle();
        mesh.set_index_buffer_binding(vec![0u16, 1, 3]);
        assert!(matches!(
            mesh.validate(),
            Err(Error::IndexOutOfRange { index: 3, vertex_count: 3 })
        ));
    }

    #[test]
    fn exports_obj_with_normals() {
        let mesh = triangle();
        let path = std::env::temp_dir().join(format!("bufmesh_triangle_{}.obj", std::process::id()));
        mesh.export_obj(&path).unwrap();

        let obj = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(obj.starts_with("o Triangle\n"));
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 3);
        assert_eq!(obj.lines().filter(|l| l.starts_with("vn ")).count(), 3);
        assert!(obj.contains("g Triangle_0\n"));
        assert!(obj.contains("f 1//1 2//2 3//3"));
    }

    #[test]
    fn shorter_index_buffer_invalidates_sub_meshes() {
        let mut cube = crate::primitives::create_cube(1.0).unwrap();
        cube.set_index_buffer_binding(vec![0u16, 1, 2]);

        fn expected<T>(r: Result<T>) -> bool {
            matches!(r, Err(Error::InvalidSubMesh { start: 0, count: 36, len: 3 }))
        }
        assert!(expected(cube.validate()));
        assert!(expected(cube.triangles()));

        let path = std::env::temp_dir().join(format!("bufmesh_rebound_{}.obj", std::process::id()));
        assert!(expected(cube.export_obj(&path)));
        assert!(!path.exists());

        // A fresh sub-mesh is checked against the rebound buffer.
        assert!(matches!(cube.add_sub_mesh(0, 6), Err(Error::InvalidSubMesh { len: 3, .. })));
        cube.add_sub_mesh(0, 3).unwrap();
        assert_eq!(cube.sub_meshes().len(), 2);
    }

    #[test]
    fn overflowing_sub_mesh_from_json_is_rejected() {
        let mut json = serde_json::to_value(triangle()).unwrap();
        json["sub_meshes"] = serde_json::json!([{ "start": usize::MAX, "count": 2 }]);
        let mesh: BufferMesh = serde_json::from_value(json).unwrap();

        assert_eq!(mesh.sub_meshes()[0].end(), None);
        assert!(matches!(mesh.validate(), Err(Error::InvalidSubMesh { start: usize::MAX, count: 2, len: 3 })));
        assert!(mesh.triangles().is_err());
    }

    #[test]
    fn export_into_missing_directory_is_an_io_error() {
        let path = std::env::temp_dir()
            .join(format!("bufmesh_missing_{}", std::process::id()))
            .join("triangle.obj");
        assert!(matches!(triangle().export_obj(&path), Err(Error::Io(_))));
    }
}
