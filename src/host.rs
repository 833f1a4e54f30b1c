//! The rendering host interface the demo scenes drive, and a headless
//! implementation that records every call instead of touching a GPU.

use glam::{EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use crate::asset::SpineAnimation;
use crate::error::{Error, Result};
use crate::mesh::{BufferMesh, SubMesh};
use crate::vertex::{BufferBindFlag, BufferUsage, IndexFormat, VertexElement};

/// Seconds advanced per frame by [`HeadlessHost::run`].
pub const FRAME_DELTA: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Window size in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    /// Canvas size in physical pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let scale = |v: u32| (v as f32 * self.device_pixel_ratio).round() as u32;
        (scale(self.width), scale(self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinnPhongMaterial {
    pub base_color: Color,
    pub specular_color: Color,
    pub shininess: f32,
}

impl Default for BlinnPhongMaterial {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            specular_color: Color::WHITE,
            shininess: 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Component {
    MeshRenderer { mesh: MeshId, material: BlinnPhongMaterial },
    Camera(Camera),
    AmbientLight { color: Color },
    DirectLight { color: Color },
    SpineAnimation(SpineAnimation),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::MeshRenderer { .. } => "MeshRenderer",
            Component::Camera(_) => "Camera",
            Component::AmbientLight { .. } => "AmbientLight",
            Component::DirectLight { .. } => "DirectLight",
            Component::SpineAnimation(_) => "SpineAnimation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    /// Rotate in local space by Euler angles given in degrees.
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) {
        let delta = Quat::from_euler(EulerRot::YXZ, y.to_radians(), x.to_radians(), z.to_radians());
        self.rotation = (self.rotation * delta).normalize();
    }

    /// Point -Z at `target`, keeping `Vec3::Y` as up. A target at the
    /// current position leaves the rotation untouched.
    pub fn look_at(&mut self, target: Vec3) {
        let back = (self.position - target).normalize_or_zero();
        if back == Vec3::ZERO {
            return;
        }
        let mut right = Vec3::Y.cross(back).normalize_or_zero();
        if right == Vec3::ZERO {
            right = Vec3::X;
        }
        let up = back.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, back));
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Euler angles in degrees, as (x, y, z).
    pub fn euler_degrees(&self) -> Vec3 {
        let (y, x, z) = self.rotation.to_euler(EulerRot::YXZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }
}

/// GPU-side description of a mesh once its buffers are uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding {
    pub name: String,
    pub vertex_buffer: BufferId,
    pub vertex_stride: u32,
    pub index_buffer: BufferId,
    pub index_format: IndexFormat,
    pub elements: Vec<VertexElement>,
    pub sub_meshes: Vec<SubMesh>,
}

pub trait RenderHost {
    fn create_buffer(&mut self, flag: BufferBindFlag, data: &[u8], usage: BufferUsage) -> BufferId;

    fn register_mesh(&mut self, binding: MeshBinding) -> MeshId;

    /// Upload the mesh's vertex and index data as static buffers and
    /// register its layout.
    fn create_mesh(&mut self, mesh: &BufferMesh) -> Result<MeshId> {
        mesh.validate()?;
        let vertex_buffer = self.create_buffer(BufferBindFlag::VertexBuffer, mesh.vertex_bytes(), BufferUsage::Static);
        let index_buffer = self.create_buffer(BufferBindFlag::IndexBuffer, mesh.index_bytes(), BufferUsage::Static);

        Ok(self.register_mesh(MeshBinding {
            name: mesh.name().to_string(),
            vertex_buffer,
            vertex_stride: mesh.vertex_stride(),
            index_buffer,
            index_format: mesh.index_format(),
            elements: mesh.elements().to_vec(),
            sub_meshes: mesh.sub_meshes().to_vec(),
        }))
    }

    fn create_root_entity(&mut self, name: &str) -> EntityId;

    fn create_child(&mut self, parent: EntityId, name: &str) -> Result<EntityId>;

    /// Reparent `child` under `parent`.
    fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()>;

    fn add_component(&mut self, entity: EntityId, component: Component) -> Result<()>;

    fn transform_mut(&mut self, entity: EntityId) -> Result<&mut Transform>;

    /// Fit the canvas to `viewport`. Fails with [`Error::HostInit`] when
    /// the viewport has no drawable area.
    fn resize_canvas(&mut self, viewport: Viewport) -> Result<()>;

    /// Hand the frame loop to the host.
    fn run(&mut self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Buffer {
    pub flag: BufferBindFlag,
    pub usage: BufferUsage,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub transform: Transform,
    pub components: Vec<Component>,
}

impl Entity {
    fn new(name: &str, parent: Option<EntityId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            transform: Transform::default(),
            components: Vec::new(),
        }
    }

    pub fn has_component(&self, kind: &str) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    pub fn spine_animation(&self) -> Option<&SpineAnimation> {
        self.components.iter().find_map(|c| match c {
            Component::SpineAnimation(spine) => Some(spine),
            _ => None,
        })
    }

    pub fn spine_animation_mut(&mut self) -> Option<&mut SpineAnimation> {
        self.components.iter_mut().find_map(|c| match c {
            Component::SpineAnimation(spine) => Some(spine),
            _ => None,
        })
    }
}

/// In-memory host: keeps uploaded buffers and the entity tree, and runs a
/// fixed number of frames.
#[derive(Debug)]
pub struct HeadlessHost {
    canvas: (u32, u32),
    frames: u64,
    frame_count: u64,
    buffers: Vec<Buffer>,
    meshes: Vec<MeshBinding>,
    entities: Vec<Entity>,
    roots: Vec<EntityId>,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport, frames: u64) -> Result<Self> {
        let canvas = Self::drawable_canvas(viewport)?;
        log::debug!("Headless host ready: {}x{} canvas, {} frames", canvas.0, canvas.1, frames);

        Ok(Self {
            canvas,
            frames,
            frame_count: 0,
            buffers: Vec::new(),
            meshes: Vec::new(),
            entities: Vec::new(),
            roots: Vec::new(),
        })
    }

    #[inline]
    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    fn drawable_canvas(viewport: Viewport) -> Result<(u32, u32)> {
        let canvas = viewport.canvas_size();
        if canvas.0 == 0 || canvas.1 == 0 {
            return Err(Error::HostInit(format!(
                "no drawable surface for a {}x{} canvas",
                canvas.0, canvas.1
            )));
        }
        Ok(canvas)
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    #[inline]
    pub fn meshes(&self) -> &[MeshBinding] {
        &self.meshes
    }

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id.0)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshBinding> {
        self.meshes.get(id.0)
    }

    #[inline]
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    /// Resolve a slash separated path of entity names from a root,
    /// e.g. `"Root/Cube"`.
    pub fn find(&self, path: &str) -> Option<EntityId> {
        let mut names = path.split('/');
        let first = names.next()?;
        let mut current = *self.roots.iter().find(|id| self.entities[id.0].name == first)?;
        for name in names {
            current = *self.entities[current.0]
                .children
                .iter()
                .find(|id| self.entities[id.0].name == name)?;
        }
        Some(current)
    }

    fn check(&self, id: EntityId) -> Result<()> {
        if id.0 < self.entities.len() { Ok(()) } else { Err(Error::UnknownEntity(id)) }
    }

    fn is_ancestor(&self, ancestor: EntityId, mut id: EntityId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.entities[id.0].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, id: EntityId) {
        match self.entities[id.0].parent.take() {
            Some(parent) => self.entities[parent.0].children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
    }

    fn update(&mut self, delta: f32) {
        for entity in &mut self.entities {
            if let Some(spine) = entity.spine_animation_mut() {
                spine.update(delta);
            }
        }
    }
}

impl RenderHost for HeadlessHost {
    fn create_buffer(&mut self, flag: BufferBindFlag, data: &[u8], usage: BufferUsage) -> BufferId {
        let id = BufferId(self.buffers.len());
        log::trace!("Buffer {:?}: {:?} {:?}, {} bytes", id, flag, usage, data.len());
        self.buffers.push(Buffer {
            flag,
            usage,
            data: data.to_vec(),
        });
        id
    }

    fn register_mesh(&mut self, binding: MeshBinding) -> MeshId {
        let id = MeshId(self.meshes.len());
        log::debug!("Mesh {:?} registered as {:?}", binding.name, id);
        self.meshes.push(binding);
        id
    }

    fn create_root_entity(&mut self, name: &str) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(name, None));
        self.roots.push(id);
        id
    }

    fn create_child(&mut self, parent: EntityId, name: &str) -> Result<EntityId> {
        self.check(parent)?;
        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(name, Some(parent)));
        self.entities[parent.0].children.push(id);
        Ok(id)
    }

    fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if self.is_ancestor(child, parent) {
            return Err(Error::Custom(format!(
                "cannot attach {:?} under its own descendant {:?}",
                child, parent
            )));
        }
        self.detach(child);
        self.entities[child.0].parent = Some(parent);
        self.entities[parent.0].children.push(child);
        Ok(())
    }

    fn add_component(&mut self, entity: EntityId, component: Component) -> Result<()> {
        self.check(entity)?;
        if let Component::MeshRenderer { mesh, .. } = &component {
            if mesh.0 >= self.meshes.len() {
                return Err(Error::UnknownMesh(*mesh));
            }
        }
        log::trace!("{} attached to {:?}", component.kind(), self.entities[entity.0].name);
        self.entities[entity.0].components.push(component);
        Ok(())
    }

    fn transform_mut(&mut self, entity: EntityId) -> Result<&mut Transform> {
        self.entities
            .get_mut(entity.0)
            .map(|e| &mut e.transform)
            .ok_or(Error::UnknownEntity(entity))
    }

    fn resize_canvas(&mut self, viewport: Viewport) -> Result<()> {
        self.canvas = Self::drawable_canvas(viewport)?;
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        log::info!("Running {} frames on a {}x{} canvas", self.frames, self.canvas.0, self.canvas.1);
        for _ in 0..self.frames {
            self.update(FRAME_DELTA);
            self.frame_count += 1;
        }
        Ok(())
    }
}
