use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::Context;
use bufmesh::asset::{AssetLoader, LoadItem, SpineAsset};
use bufmesh::scene::{buffer_mesh_scene, spine_scene};
use bufmesh::{create_cube, HeadlessHost, RenderHost};
use crate::config::{Config, Demo};
use crate::stats::SceneStats;

pub(crate) struct Runner {
    config: Config
}

impl Runner {

    pub(crate) fn new(config: Config) -> Self {
        Runner {
            config
        }
    }

    fn loader(&self) -> AssetLoader {
        AssetLoader::new(Duration::from_secs(self.config.asset.timeout_secs))
    }

    /// Build the cube and write `<name>.obj` (and `<name>.json` if asked)
    /// into the output folder. Returns the OBJ path.
    pub(crate) fn export_cube(&self) -> anyhow::Result<PathBuf> {
        let cube = create_cube(self.config.cube.size)?;
        let output_dir = &self.config.output.output_folder;

        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

        let obj_path = output_dir.join(format!("{}.obj", self.config.cube.name));
        cube.export_obj(&obj_path)
            .with_context(|| format!("Failed to export mesh to {}", obj_path.display()))?;
        log::info!("Wrote {} ({} vertices, {} indices)", obj_path.display(), cube.vertex_count(), cube.index_count());

        if self.config.output.write_json {
            let json_path = output_dir.join(format!("{}.json", self.config.cube.name));
            fs::write(&json_path, serde_json::to_string_pretty(&cube)?)
                .with_context(|| format!("Failed to write {}", json_path.display()))?;
            log::info!("Wrote {}", json_path.display());
        }

        Ok(obj_path)
    }

    pub(crate) async fn inspect_spine(&self) -> anyhow::Result<SpineAsset> {
        let asset = self.loader().load(&LoadItem::spine(&self.config.asset.url)).await?;
        let data = asset.data();

        println!("Skeleton: {} (spine {})", asset.entity_name(), data.header.spine.as_deref().unwrap_or("unknown"));
        println!("Size: {} x {}", data.header.width, data.header.height);
        println!("Bones: {}", data.bones.len());
        println!("Slots: {}", data.slots.len());
        println!("Animations:");
        for animation in &data.animations {
            println!("  - {} ({:.3}s)", animation.name, animation.duration);
        }

        Ok(asset)
    }

    pub(crate) async fn run_demo(&self, demo: Demo) -> anyhow::Result<SceneStats> {
        let viewport = self.config.viewport.viewport();
        let mut host = HeadlessHost::new(viewport, self.config.run.frames)?;

        match demo {
            Demo::BufferMesh => {
                buffer_mesh_scene(&mut host, viewport, self.config.cube.size)?;
            }
            Demo::Spine => {
                spine_scene(&mut host, viewport, &self.loader(), &self.config.asset.url).await?;
            }
        }

        host.run()?;

        if self.config.run.verbose {
            SceneStats::print_tree(&host);
        }
        Ok(SceneStats::new(&host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKELETON: &str = r#"{
        "skeleton": { "spine": "4.1.17", "width": 470.0, "height": 731.0 },
        "bones": [ { "name": "root" }, { "name": "hip", "parent": "root" } ],
        "slots": [ { "name": "torso", "bone": "hip" } ],
        "animations": {
            "walk": { "bones": { "hip": { "rotate": [ { "angle": 0 }, { "time": 1.0667, "angle": 12 } ] } } },
            "jump": { "bones": { "hip": { "translate": [ { "time": 1.3333, "y": 40 } ] } } }
        }
    }"#;

    fn spine_config(file_name: &str) -> Config {
        let path = std::env::temp_dir().join(format!("bufmesh_runner_{}_{}", std::process::id(), file_name));
        fs::write(&path, SKELETON).unwrap();
        let mut config = Config::default();
        config.asset.url = path.display().to_string();
        config.asset.timeout_secs = 5;
        config
    }

    #[test]
    fn exports_obj_and_json() {
        let mut config = Config::default();
        config.output.output_folder = std::env::temp_dir().join(format!("bufmesh_bin_{}", std::process::id()));
        config.output.write_json = true;
        config.cube.size = 0.5;

        let obj_path = Runner::new(config.clone()).export_cube().unwrap();
        let obj = fs::read_to_string(&obj_path).unwrap();
        let json = fs::read_to_string(config.output.output_folder.join("cube.json")).unwrap();
        fs::remove_dir_all(&config.output.output_folder).ok();

        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 24);
        assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 12);
        let mesh: bufmesh::BufferMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(mesh.vertices()[..3], [-0.5, 0.5, -0.5]);
    }

    #[test]
    fn invalid_cube_size_is_reported() {
        let mut config = Config::default();
        config.cube.size = 0.0;
        let err = Runner::new(config).export_cube().unwrap_err();
        assert!(err.to_string().contains("Invalid cube size"));
    }

    #[tokio::test]
    async fn buffer_mesh_demo_runs_all_frames() {
        let mut config = Config::default();
        config.run.frames = 5;
        let stats = Runner::new(config).run_demo(Demo::BufferMesh).await.unwrap();
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.meshes, 1);
    }

    #[tokio::test]
    async fn inspects_spine_from_local_file() {
        let config = spine_config("inspect-boy.json");
        let asset = Runner::new(config.clone()).inspect_spine().await;
        fs::remove_file(&config.asset.url).ok();

        let asset = asset.unwrap();
        assert!(asset.entity_name().ends_with("inspect-boy"));
        assert_eq!(asset.data().bones.len(), 2);
        assert_eq!(asset.data().animations.len(), 2);
    }

    #[tokio::test]
    async fn spine_demo_runs_all_frames() {
        let mut config = spine_config("demo-boy.json");
        config.run.frames = 3;
        let stats = Runner::new(config.clone()).run_demo(Demo::Spine).await;
        fs::remove_file(&config.asset.url).ok();

        let stats = stats.unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.entities, 3);
        assert_eq!(stats.components, 2);
        assert_eq!(stats.meshes, 0);
    }

    #[tokio::test]
    async fn missing_spine_file_fails_the_demo() {
        let mut config = Config::default();
        config.asset.url = std::env::temp_dir().join("bufmesh_runner_absent.json").display().to_string();
        let err = Runner::new(config).run_demo(Demo::Spine).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load asset"));
    }
}
