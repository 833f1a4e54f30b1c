pub mod error;
pub mod vertex;
pub mod mesh;
pub mod primitives;
pub mod host;
pub mod asset;
pub mod scene;

pub use crate::error::{Error, Result};
pub use crate::mesh::{BufferMesh, IndexData, SubMesh};
pub use crate::primitives::{create_cube, cube_geometry};
pub use crate::host::{HeadlessHost, RenderHost, Viewport};
pub use crate::asset::{AssetLoader, AssetType, LoadItem, SpineAsset};
