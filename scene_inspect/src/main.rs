//! Scene inspection tool
//!
//! Imports an asset, renders one frame through the headless backend and logs
//! what was found.
//!
//! ```text
//! scene_inspect <asset.ron|asset.obj> [--config <settings.toml|settings.ron>]
//! ```

use std::path::PathBuf;

use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
enum InspectError {
    #[error("usage: scene_inspect <asset> [--config <file>]")]
    Usage,

    #[error("configuration: {0}")]
    Config(#[from] scene_engine::core::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

struct Args {
    asset: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args, InspectError> {
    let mut asset = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config = Some(PathBuf::from(args.next().ok_or(InspectError::Usage)?)),
            "--help" | "-h" => return Err(InspectError::Usage),
            _ if asset.is_none() => asset = Some(PathBuf::from(arg)),
            _ => return Err(InspectError::Usage),
        }
    }

    Ok(Args {
        asset: asset.ok_or(InspectError::Usage)?,
        config,
    })
}

fn run(args: &Args) -> Result<(), InspectError> {
    let config = match &args.config {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::default(),
    };
    config.validate().map_err(InspectError::InvalidConfig)?;
    logging::init(&config.engine.log_level);

    log::info!("Inspecting {}", args.asset.display());
    let mut scene = SceneImporter::new(config.import.clone()).import(&args.asset)?;

    for mesh in scene.meshes() {
        let material = mesh.material().map_or("<none>", |m| m.name.as_str());
        log::info!(
            "mesh '{}': {} vertices, {} triangles, material '{}', position {:?}",
            mesh.name(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            material,
            mesh.transform().position()
        );
    }
    for camera in scene.cameras() {
        log::info!(
            "camera '{}': fov {:.1}°, aspect {:.3}, clip {}..{}",
            camera.name(),
            camera.field_of_view_degrees(),
            camera.aspect_ratio(),
            camera.near(),
            camera.far()
        );
    }
    for light in scene.lights() {
        log::info!(
            "light '{}': {:?}, color {:?}, position {:?}",
            light.name(),
            light.kind(),
            light.color,
            light.transform().world_position()
        );
    }

    if let Some(camera) = scene.active_camera_mut() {
        camera.set_render_resolution(config.renderer.render_width, config.renderer.render_height, false);
    }

    let mut renderer = Renderer::new(HeadlessGraphics::new(), config.renderer.clone())?;
    match scene.draw(&mut renderer) {
        Some(stats) => log::info!(
            "Rendered one frame: {} draw calls, {} triangles, {} skipped meshes",
            stats.draw_calls,
            stats.triangles,
            stats.skipped_meshes
        ),
        None => log::warn!("No camera in scene, frame not rendered"),
    }

    scene.dispose(renderer.gfx_mut());
    renderer.release();
    Ok(())
}

fn main() {
    let result = parse_args().and_then(|args| run(&args));
    if let Err(e) = result {
        // Logging may not be initialized yet (bad arguments or config)
        eprintln!("scene_inspect: {e}");
        std::process::exit(1);
    }
}
