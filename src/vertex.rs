use std::mem::size_of;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

pub const POSITION: &str = "POSITION";
pub const NORMAL: &str = "NORMAL";

/// Interleaved position/normal vertex, laid out exactly as the cube buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u32 = size_of::<Vertex>() as u32;
    pub const FLOATS: usize = size_of::<Vertex>() / size_of::<f32>();

    #[inline]
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    /// Element list matching this struct's memory layout, bound to slot 0.
    pub fn elements() -> Vec<VertexElement> {
        vec![
            VertexElement::new(POSITION, 0, VertexElementFormat::Vector3, 0),
            VertexElement::new(NORMAL, size_of::<[f32; 3]>() as u32, VertexElementFormat::Vector3, 0),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexElementFormat {
    Float,
    Vector2,
    Vector3,
    Vector4,
    Byte4,
    UByte4,
    NormalizedUByte4,
    Short2,
    UShort4,
}

impl VertexElementFormat {
    /// Size in bytes of one element of this format.
    pub const fn size(self) -> u32 {
        match self {
            VertexElementFormat::Float => 4,
            VertexElementFormat::Vector2 => 8,
            VertexElementFormat::Vector3 => 12,
            VertexElementFormat::Vector4 => 16,
            VertexElementFormat::Byte4
            | VertexElementFormat::UByte4
            | VertexElementFormat::NormalizedUByte4
            | VertexElementFormat::Short2 => 4,
            VertexElementFormat::UShort4 => 8,
        }
    }
}

/// One named attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexElement {
    pub semantic: String,
    pub offset: u32,
    pub format: VertexElementFormat,
    pub binding_index: u32,
}

impl VertexElement {
    pub fn new(semantic: &str, offset: u32, format: VertexElementFormat, binding_index: u32) -> Self {
        Self {
            semantic: semantic.to_string(),
            offset,
            format,
            binding_index,
        }
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.format.size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexFormat {
    UInt8,
    UInt16,
    UInt32,
}

impl IndexFormat {
    pub const fn size(self) -> u32 {
        match self {
            IndexFormat::UInt8 => 1,
            IndexFormat::UInt16 => 2,
            IndexFormat::UInt32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferBindFlag {
    VertexBuffer,
    IndexBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
}
