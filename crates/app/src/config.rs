//! Command-line configuration: `--key=value` flags, unknown values fall back
//! to defaults with a warning.

use std::path::PathBuf;

use asset::{
    mesh::MeshSource,
    scene::SceneConfig,
    shader::ShaderOrigin,
    texture::TextureSource,
};
use corelib::{
    Vec3,
    camera::{Axis, CameraPath, CameraState, Projection},
    frame::{FrameTransformGenerator, RotationMode},
};
use platform::ViewerOptions;

/// Everything resolved from the command line.
#[derive(Clone, Debug)]
pub struct Config {
    pub scene: SceneConfig,
    pub shaders: ShaderOrigin,
    pub viewer: ViewerOptions,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();

        let (width, height) = parse_size_args(&args);
        let camera_start = flag(&args, "--camera-start")
            .and_then(|v| parse_vec3(v).or_else(|| warn_default("camera-start", v)))
            .unwrap_or(Vec3::new(0.0, 0.0, 1.0));
        let spin = flag(&args, "--spin")
            .and_then(|v| v.parse::<f32>().ok().or_else(|| warn_default("spin", v)))
            .unwrap_or(0.0);
        let rotation = if spin == 0.0 {
            RotationMode::Fixed(0.0)
        } else {
            RotationMode::Spin { per_frame: spin }
        };

        let viewer = ViewerOptions {
            backends: parse_backend_arg(&args),
            show_fps: parse_show_fps_arg(&args),
            width,
            height,
            camera: CameraState::new(camera_start),
            path: parse_camera_path(&args),
            generator: FrameTransformGenerator::new(Projection::default(), rotation),
            ..ViewerOptions::default()
        };

        Self {
            scene: SceneConfig {
                mesh: parse_mesh_arg(&args),
                texture: parse_texture_arg(&args),
            },
            shaders: flag(&args, "--shaders")
                .map(|dir| ShaderOrigin::Dir(PathBuf::from(dir)))
                .unwrap_or_default(),
            viewer,
        }
    }
}

/// Value of the last `--name=value` occurrence.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .rev()
        .find_map(|arg| arg.strip_prefix(name)?.strip_prefix('='))
}

fn warn_default<T>(name: &str, value: &str) -> Option<T> {
    log::warn!("Invalid --{}='{}', using the default.", name, value);
    None
}

fn parse_mesh_arg(args: &[String]) -> MeshSource {
    match flag(args, "--mesh") {
        None | Some("quad") => MeshSource::InlineQuad,
        Some(path) => MeshSource::File(PathBuf::from(path)),
    }
}

fn parse_texture_arg(args: &[String]) -> Option<TextureSource> {
    match flag(args, "--texture") {
        None | Some("checker") => Some(TextureSource::Checker(64)),
        Some("none") | Some("off") => None,
        Some(path) => Some(TextureSource::File(PathBuf::from(path))),
    }
}

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    match flag(args, "--gpu-backend").map(str::to_ascii_lowercase).as_deref() {
        None | Some("auto") => wgpu::Backends::all(),
        Some("vulkan" | "vk") => wgpu::Backends::VULKAN,
        Some("dx12" | "d3d12") => wgpu::Backends::DX12,
        Some("metal" | "mtl") => wgpu::Backends::METAL,
        Some("gl" | "opengl" | "gles") => wgpu::Backends::GL,
        Some(other) => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

fn parse_show_fps_arg(args: &[String]) -> bool {
    // --show-fps[=on|off], off by default
    for arg in args.iter().rev() {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(640).max(1);
    let hh = h.unwrap_or(480).max(1);
    (ww, hh)
}

fn parse_camera_path(args: &[String]) -> CameraPath {
    let mut path = CameraPath::default();
    if let Some(v) = flag(args, "--camera-axis") {
        match v.to_ascii_lowercase().as_str() {
            "x" => path.axis = Axis::X,
            "y" => path.axis = Axis::Y,
            "z" => path.axis = Axis::Z,
            _ => {
                warn_default::<()>("camera-axis", v);
            }
        }
    }
    if let Some(v) = flag(args, "--camera-step") {
        match v.parse::<f32>() {
            Ok(step) if step.is_finite() => path.step = step,
            _ => {
                warn_default::<()>("camera-step", v);
            }
        }
    }
    path
}

fn parse_vec3(value: &str) -> Option<Vec3> {
    let mut parts = value.split(',').map(|p| p.trim().parse::<f32>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Vec3::new(x, y, z))
}
