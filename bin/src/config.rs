use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::bail;
use bufmesh::scene::SPINEBOY_URL;
use bufmesh::Viewport;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Demo {
    /// Lit cube built from raw vertex and index buffers
    BufferMesh,
    /// Spine skeleton playing its walk animation
    Spine,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Cube generation
    #[serde(default)]
    pub cube: CubeConfig,
    /// Window the host renders into
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Asset loading
    #[serde(default)]
    pub asset: AssetConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Frame loop
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CubeConfig {
    /// Half extent of the cube
    pub size: f32,
    /// Mesh file stem
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AssetConfig {
    /// Spine skeleton URL or path
    pub url: String,
    /// Seconds before a load is abandoned
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct OutputConfig {
    /// Output folder for exported meshes
    pub output_folder: PathBuf,
    /// Also write the mesh descriptor as JSON
    pub write_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    /// Frames the headless host runs before returning
    pub frames: u64,
    /// Enable verbose output
    pub verbose: bool,
}

impl Default for CubeConfig {
    fn default() -> Self {
        CubeConfig {
            size: 1.0,
            name: "cube".to_string(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let viewport = Viewport::default();
        ViewportConfig {
            width: viewport.width,
            height: viewport.height,
            device_pixel_ratio: viewport.device_pixel_ratio,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        AssetConfig {
            url: SPINEBOY_URL.to_string(),
            timeout_secs: bufmesh::asset::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            output_folder: PathBuf::from("output"),
            write_json: false,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            frames: 120,
            verbose: false,
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }
}

impl Config {

    pub fn load(config_path: &Path) -> anyhow::Result<Config> {
        let config_str = fs::read_to_string(config_path)?;
        let config: Config = match config_path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&config_str)?,
            Some("toml") => toml::from_str(&config_str)?,
            _ => bail!("Unsupported config file format. Use .json or .toml"),
        };
        Ok(config)
    }

    pub fn save_default(config_path: &Path) -> anyhow::Result<()> {
        let config = Config::default();
        let config_str = match config_path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(&config)?,
            _ => serde_json::to_string_pretty(&config)?, // Default to JSON
        };

        let mut file = File::create(config_path)?;
        file.write_all(config_str.as_bytes())?;
        println!("Generated default configuration file: {}", config_path.display());
        Ok(())
    }

}
