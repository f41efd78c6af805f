mod demo;
mod manifest;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rtgl_scene::{ModelPayload, geometry};
use tracing_subscriber::EnvFilter;

use crate::manifest::DemoManifest;

#[derive(Parser)]
#[command(name = "rtgl-cli", about = "Headless runner for rtgl demos")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a demo manifest and render it headlessly
    Run {
        /// Path to the YAML demo manifest
        manifest: PathBuf,
        /// Override the manifest's frame count
        #[arg(short, long)]
        frames: Option<u32>,
    },
    /// Parse and validate a model JSON file
    Inspect {
        /// Path to the model JSON
        model: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("rtgl-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("gpu: {}", rtgl_gpu::crate_info());
            println!("gpu-glow: {}", rtgl_gpu_glow::crate_info());
            println!("clock: {}", rtgl_clock::crate_info());
            println!("camera: {}", rtgl_camera::crate_info());
            println!("transforms: {}", rtgl_transforms::crate_info());
            println!("scene: {}", rtgl_scene::crate_info());
        }
        Commands::Run { manifest, frames } => {
            let mut config = DemoManifest::load(&manifest)?;
            if let Some(frames) = frames {
                config.frames = frames;
            }
            let base_dir = manifest
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));

            let (state, summary) = demo::build(&config, &base_dir)?;
            println!(
                "Program: attributes=[{}] uniforms=[{}]",
                state.ctx.program.attribute_names().collect::<Vec<_>>().join(", "),
                state.ctx.program.uniform_names().collect::<Vec<_>>().join(", ")
            );
            let summary = demo::run(state, &config, summary);

            println!("Loaded: {} objects", summary.loaded);
            for locator in &summary.failed_loads {
                println!("Failed: {locator}");
            }
            println!("Render order: {}", summary.render_order);
            println!(
                "Frames: {}, draws: {}, simulation steps: {}, failed listeners: {}",
                summary.frames, summary.draws, summary.simulation_steps, summary.failed_listeners
            );
        }
        Commands::Inspect { model } => {
            let bytes =
                std::fs::read(&model).with_context(|| format!("reading {}", model.display()))?;
            let payload = ModelPayload::from_json(&bytes)?;
            println!("Alias: {}", payload.alias.as_deref().unwrap_or("<none>"));
            println!(
                "Vertices: {}, indices: {}",
                payload.vertex_count(),
                payload.indices.len()
            );
            println!(
                "Colors: {}, texture coords: {}",
                payload.scalars.is_some(),
                payload.texture_coords.is_some()
            );
            match payload.validate() {
                Ok(()) => {
                    let normals = geometry::calculate_normals(&payload.vertices, &payload.indices);
                    let degenerate = normals
                        .chunks_exact(3)
                        .filter(|n| n.iter().all(|&c| c == 0.0))
                        .count();
                    println!("Valid: yes ({degenerate} vertices without a face normal)");
                }
                Err(err) => println!("Valid: no ({err})"),
            }
        }
    }

    Ok(())
}
