use std::fmt;

use crate::host::{EntityId, MeshId};

#[derive(Debug)]
pub enum Error {
    InvalidSize(f32),
    InvalidLayout(String),
    InvalidSubMesh { start: usize, count: usize, len: usize },
    IndexOutOfRange { index: u32, vertex_count: usize },
    AssetLoad { url: String, reason: String },
    UnknownAnimation(String),
    HostInit(String),
    UnknownEntity(EntityId),
    UnknownMesh(MeshId),
    Io(std::io::Error),
    Custom(String),
}

impl Error {
    pub(crate) fn asset_load(url: &str, reason: impl fmt::Display) -> Self {
        Error::AssetLoad {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSize(size) => write!(f, "Invalid cube size {}: must be finite and greater than zero", size),
            Error::InvalidLayout(msg) => write!(f, "Invalid vertex layout: {}", msg),
            Error::InvalidSubMesh { start, count, len } => {
                write!(f, "Sub-mesh of {} indices at {} exceeds index buffer of length {}", count, start, len)
            }
            Error::IndexOutOfRange { index, vertex_count } => {
                write!(f, "Index {} out of range for {} vertices", index, vertex_count)
            }
            Error::AssetLoad { url, reason } => write!(f, "Failed to load asset {}: {}", url, reason),
            Error::UnknownAnimation(name) => write!(f, "Animation not found: {}", name),
            Error::HostInit(msg) => write!(f, "Rendering host initialization failed: {}", msg),
            Error::UnknownEntity(id) => write!(f, "Unknown entity {:?}", id),
            Error::UnknownMesh(id) => write!(f, "Unknown mesh {:?}", id),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
