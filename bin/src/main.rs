mod config;
mod runner;
mod stats;

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use crate::config::{Config, Demo};
use crate::runner::Runner;

#[derive(Parser)]
#[command(name = "bufmesh")]
#[command(about = "Build buffer meshes and run demo scenes on a headless host")]
#[command(version = "1.0")]
struct Args {
    /// Configuration file path (.json or .toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Generate default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Verbose output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build a cube mesh and export it as OBJ
    Cube {
        /// Half extent of the cube
        #[arg(short, long)]
        size: Option<f32>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file stem
        #[arg(short, long)]
        name: Option<String>,

        /// Also write the mesh descriptor as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a spine skeleton and list its contents
    Spine {
        /// Skeleton URL or local path
        #[arg(short, long)]
        url: Option<String>,

        /// Seconds before the load is abandoned
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Run one of the demo scenes on the headless host
    Demo {
        #[arg(value_enum)]
        demo: Demo,

        /// Frames to run before exiting
        #[arg(long)]
        frames: Option<u64>,

        /// Skeleton URL or local path for the spine demo
        #[arg(short, long)]
        url: Option<String>,

        /// Cube size for the buffer-mesh demo
        #[arg(short, long)]
        size: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    // Handle config generation
    if args.generate_config {
        let config_path = args.config.unwrap_or_else(|| PathBuf::from("bufmesh_config.json"));
        Config::save_default(&config_path)?;
        return Ok(());
    }

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    if args.verbose {
        config.run.verbose = true;
    }

    let Some(command) = args.command else {
        anyhow::bail!("No command given; try --help");
    };

    // Override config with command line arguments
    match command {
        Command::Cube { size, output, name, json } => {
            if let Some(size) = size {
                config.cube.size = size;
            }
            if let Some(output) = output {
                config.output.output_folder = output;
            }
            if let Some(name) = name {
                config.cube.name = name;
            }
            if json {
                config.output.write_json = true;
            }

            let obj_path = Runner::new(config).export_cube()?;
            println!("Successfully generated cube mesh: {}", obj_path.display());
        }
        Command::Spine { url, timeout_secs } => {
            if let Some(url) = url {
                config.asset.url = url;
            }
            if let Some(timeout_secs) = timeout_secs {
                config.asset.timeout_secs = timeout_secs;
            }

            Runner::new(config).inspect_spine().await?;
        }
        Command::Demo { demo, frames, url, size } => {
            if let Some(frames) = frames {
                config.run.frames = frames;
            }
            if let Some(url) = url {
                config.asset.url = url;
            }
            if let Some(size) = size {
                config.cube.size = size;
            }

            let stats = Runner::new(config).run_demo(demo).await?;
            stats.print_summary();
        }
    }

    Ok(())
}
