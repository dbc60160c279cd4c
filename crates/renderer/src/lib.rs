//! Renderer: wgpu init + depth + one indexed mesh, textured or not.
//! wgpu = 26.x, winit = 0.30.x

pub mod upload;

use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use asset::{
    scene::SceneAssets,
    shader::{ShaderOrigin, ShaderSources},
};
use bytemuck::{Pod, Zeroable};
use corelib::frame::{FrameTransforms, Viewport};
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    ErrorFilter, Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp,
    Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    SamplerBindingType, ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp,
    Surface, SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension,
    TextureFormat, TextureSampleType, TextureUsages, TextureView, TextureViewDescriptor,
    TextureViewDimension, VertexState, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

use upload::{GpuTexture, MeshBuffers, TEXTURED_BUFFERS, UNTEXTURED_BUFFERS};

const VERTEX_SHADER: &str = include_str!("shaders/vertex.wgsl");
const FRAGMENT_SHADER: &str = include_str!("shaders/fragment.wgsl");

/// Shader sources compiled into the binary.
pub fn embedded_shaders() -> ShaderSources {
    ShaderSources::new(VERTEX_SHADER, FRAGMENT_SHADER)
}

/// Resolve the configured shader origin into source text.
pub fn resolve_shaders(origin: &ShaderOrigin) -> ShaderSources {
    match origin {
        ShaderOrigin::Embedded => embedded_shaders(),
        ShaderOrigin::Dir(dir) => ShaderSources::from_dir(dir),
    }
}

/// Camera UBO: perspective and placement, column-major.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    perspective: [[f32; 4]; 4],
    placement: [[f32; 4]; 4],
}

impl CameraUniform {
    fn from_frame(frame: &FrameTransforms) -> Self {
        Self {
            perspective: frame.projection.to_cols_array_2d(),
            placement: frame.placement.to_cols_array_2d(),
        }
    }
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.25,
    g: 0.75,
    b: 1.0,
    a: 1.0,
};

/// Texture bound at group 1 in the textured pipeline.
struct TextureBinding {
    #[allow(dead_code)]
    texture: GpuTexture,
    bind_group: BindGroup,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    mesh: MeshBuffers,
    texture: Option<TextureBinding>,

    // Camera
    camera_bg: BindGroup,
    camera_buf: Buffer,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and upload the scene.
    ///
    /// The scene is consumed: after this returns the GPU holds the only copy.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        scene: SceneAssets,
        shaders: &ShaderSources,
    ) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Svarog Viewer Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .context("request_device failed")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let vs = compile_stage(&device, "vertex", &shaders.vertex).await?;
        let fs = compile_stage(&device, "fragment", &shaders.fragment).await?;

        // ==== Camera BGL/BG ====
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Camera BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(
                        std::mem::size_of::<CameraUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        // Identity until the first frame writes real matrices.
        let camera_init = CameraUniform {
            perspective: Mat4::IDENTITY.to_cols_array_2d(),
            placement: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera UBO"),
            contents: bytemuck::bytes_of(&camera_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera BG"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        // ==== Geometry & texture upload ====
        let textured = scene.is_textured();
        let mesh = upload::upload_mesh(&device, &scene.mesh, textured)?;
        let texture_bgl = textured.then(|| create_texture_bgl(&device));
        let texture = match (&scene.texture, &texture_bgl) {
            (Some(data), Some(bgl)) => {
                let texture = upload::upload_texture(&device, &queue, data)?;
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Texture BG"),
                    layout: bgl,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                });
                Some(TextureBinding {
                    texture,
                    bind_group,
                })
            }
            _ => None,
        };
        // CPU copies are no longer needed.
        drop(scene);

        // ==== Pipeline ====
        let mut bind_group_layouts: Vec<&BindGroupLayout> = vec![&camera_bgl];
        bind_group_layouts.extend(texture_bgl.as_ref());
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let (vs_entry, fs_entry, buffers) = if textured {
            ("vs_textured", "fs_textured", TEXTURED_BUFFERS)
        } else {
            ("vs_untextured", "fs_untextured", UNTEXTURED_BUFFERS)
        };

        device.push_error_scope(ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(if textured {
                "Textured Mesh Pipeline"
            } else {
                "Untextured Mesh Pipeline"
            }),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &vs,
                entry_point: Some(vs_entry),
                buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &fs,
                entry_point: Some(fs_entry),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: mesh_primitive_state(),
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = device.pop_error_scope().await {
            bail!("Error linking shaders: {err}");
        }

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            mesh,
            texture,
            camera_bg,
            camera_buf,
            depth_view,
            width,
            height,
        })
    }

    /// Current drawable size.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame: upload matrices + clear + draw the mesh.
    pub fn render(&mut self, frame: &FrameTransforms) -> Result<(), SurfaceError> {
        let cam = CameraUniform::from_frame(frame);
        self.queue
            .write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&cam));

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.camera_bg, &[]);
            if let Some(texture) = &self.texture {
                rpass.set_bind_group(1, &texture.bind_group, &[]);
            }
            rpass.set_vertex_buffer(0, self.mesh.positions.slice(..));
            if let Some(texcoords) = &self.mesh.texcoords {
                rpass.set_vertex_buffer(1, texcoords.slice(..));
            }
            rpass.set_index_buffer(self.mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..self.mesh.index_count, 0, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Compile one shader stage, turning validation errors into `Err`.
async fn compile_stage(device: &Device, stage: &str, source: &str) -> Result<ShaderModule> {
    check_stage_source(stage, source)?;
    device.push_error_scope(ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(stage),
        source: ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = device.pop_error_scope().await {
        bail!("Error compiling {stage} shader: {err}");
    }
    Ok(module)
}

/// Triangle list, both windings drawn: loaded meshes come in either.
fn mesh_primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        ..Default::default()
    }
}

/// An unreadable shader file arrives as an empty source.
fn check_stage_source(stage: &str, source: &str) -> Result<()> {
    if source.trim().is_empty() {
        bail!("Error compiling {stage} shader: empty source");
    }
    Ok(())
}

fn create_texture_bgl(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Texture BGL"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{
        camera::CameraState,
        frame::{FrameTransformGenerator, Viewport},
    };

    #[test]
    fn camera_uniform_is_two_column_major_matrices() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 2 * 16 * 4);
        let frame = FrameTransformGenerator::default().generate(
            &CameraState::default(),
            Viewport::new(640, 480),
            0,
        );
        let uniform = CameraUniform::from_frame(&frame);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniform));
        assert_eq!(&floats[..16], &frame.projection_cols());
        assert_eq!(&floats[16..], &frame.placement_cols());
    }

    #[test]
    fn embedded_shaders_define_both_variants() {
        let sources = embedded_shaders();
        assert!(sources.vertex.contains("fn vs_textured"));
        assert!(sources.vertex.contains("fn vs_untextured"));
        assert!(sources.fragment.contains("fn fs_textured"));
        assert!(sources.fragment.contains("fn fs_untextured"));
        assert_eq!(resolve_shaders(&ShaderOrigin::Embedded), sources);
    }

    #[test]
    fn missing_shader_source_is_a_compile_error() {
        let missing = ShaderSources::from_dir(std::env::temp_dir().join("svarog-no-shaders-here"));
        let err = check_stage_source("vertex", &missing.vertex).unwrap_err();
        assert_eq!(err.to_string(), "Error compiling vertex shader: empty source");
        assert!(check_stage_source("fragment", " \n\t").is_err());

        let embedded = embedded_shaders();
        assert!(check_stage_source("vertex", &embedded.vertex).is_ok());
        assert!(check_stage_source("fragment", &embedded.fragment).is_ok());
    }

    #[test]
    fn both_windings_are_drawn() {
        let primitive = mesh_primitive_state();
        assert_eq!(primitive.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(primitive.cull_mode, None);
    }

    #[test]
    fn vertex_layouts_match_flat_arrays() {
        assert_eq!(upload::POSITION_LAYOUT.array_stride, 12);
        assert_eq!(upload::TEXCOORD_LAYOUT.array_stride, 8);
        assert_eq!(TEXTURED_BUFFERS.len(), 2);
        assert_eq!(UNTEXTURED_BUFFERS.len(), 1);
    }
}
