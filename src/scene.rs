//! The two demo setups: a lit custom cube, and a walking spine skeleton.
//! Both only build the scene; the caller decides when to call `run`.

use glam::Vec3;
use crate::asset::{AssetLoader, LoadItem};
use crate::error::Result;
use crate::host::{BlinnPhongMaterial, Camera, Color, Component, EntityId, RenderHost, Viewport};
use crate::primitives::create_cube;

pub const SPINEBOY_URL: &str = "https://sbfkcel.github.io/pixi-spine-debug/assets/spine/spineboy-pro.json";

pub const SPINE_ANIMATION: &str = "walk";
pub const SPINE_SCALE: f32 = 0.05;

/// Root with a lit camera looking at a rotated cube built from raw buffers.
/// Returns the cube entity.
pub fn buffer_mesh_scene<H>(host: &mut H, viewport: Viewport, cube_size: f32) -> Result<EntityId>
where
    H: RenderHost + ?Sized,
{
    host.resize_canvas(viewport)?;
    let root = host.create_root_entity("Root");

    let light = host.create_child(root, "DirectLight")?;
    host.add_component(light, Component::AmbientLight { color: Color::new(0.2, 0.2, 0.2) })?;
    host.add_component(light, Component::DirectLight { color: Color::new(0.3, 0.4, 0.4) })?;

    let camera = host.create_child(root, "Camera")?;
    let transform = host.transform_mut(camera)?;
    transform.set_position(0.0, 6.0, 10.0);
    transform.look_at(Vec3::ZERO);
    host.add_component(camera, Component::Camera(Camera::default()))?;

    let cube = host.create_child(root, "Cube")?;
    let mesh = host.create_mesh(&create_cube(cube_size)?)?;
    host.transform_mut(cube)?.rotate(0.0, 60.0, 0.0);
    host.add_component(cube, Component::MeshRenderer { mesh, material: BlinnPhongMaterial::default() })?;

    log::info!("Buffer mesh scene ready (cube size {})", cube_size);
    Ok(cube)
}

/// Camera plus a spine skeleton loaded from `url`, walking on track 0.
/// Returns the spine entity; a failed load leaves only the camera behind.
pub async fn spine_scene<H>(host: &mut H, viewport: Viewport, loader: &AssetLoader, url: &str) -> Result<EntityId>
where
    H: RenderHost + ?Sized,
{
    host.resize_canvas(viewport)?;
    let root = host.create_root_entity("Root");

    let camera = host.create_child(root, "camera_node")?;
    host.add_component(camera, Component::Camera(Camera::default()))?;
    host.transform_mut(camera)?.set_position(0.0, 0.0, 70.0);

    let asset = loader.load(&LoadItem::spine(url)).await?;

    let mut animation = asset.animation();
    animation.state.set_animation(0, SPINE_ANIMATION, true)?;
    animation.skeleton.scale_x = SPINE_SCALE;
    animation.skeleton.scale_y = SPINE_SCALE;

    let spine = asset.instantiate(host, animation)?;
    host.transform_mut(spine)?.set_position(0.0, -12.0, 0.0);
    host.add_child(root, spine)?;

    log::info!("Spine scene ready: {} playing {:?}", asset.entity_name(), SPINE_ANIMATION);
    Ok(spine)
}
