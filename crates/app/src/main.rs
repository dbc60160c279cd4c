//! Entry point for the Svarog viewer.
//! Loads the mesh and texture, then hands them to the frame loop.

mod config;

use anyhow::{Context, Result};
use asset::{mesh::MeshSource, scene::SceneAssets, texture::TextureSource};

use config::Config;

fn describe_mesh(source: &MeshSource) -> String {
    match source {
        MeshSource::InlineQuad => "inline quad".to_owned(),
        MeshSource::File(path) => path.display().to_string(),
    }
}

fn describe_texture(source: Option<&TextureSource>) -> String {
    match source {
        None => "none".to_owned(),
        Some(TextureSource::Checker(size)) => format!("checker {size}x{size}"),
        Some(TextureSource::File(path)) => path.display().to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let mesh_name = describe_mesh(&config.scene.mesh);
    let texture_name = describe_texture(config.scene.texture.as_ref());
    log::info!(
        "Starting Svarog viewer. Backend: {:?}, show_fps={}, window_size={}x{}, mesh={}, texture={}",
        config.viewer.backends,
        config.viewer.show_fps,
        config.viewer.width,
        config.viewer.height,
        mesh_name,
        texture_name
    );

    // Initialization must finish before the first frame; any failure is fatal.
    let scene = SceneAssets::load(&config.scene)
        .with_context(|| format!("Failed to load scene (mesh: {mesh_name}, texture: {texture_name})"))
        .inspect_err(|e| log::error!("{e:#}"))?;
    let shaders = renderer::resolve_shaders(&config.shaders);

    platform::run_viewer(config.viewer, scene, shaders)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
