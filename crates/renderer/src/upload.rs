//! Upload of mesh arrays and textures into GPU resources.

use anyhow::{Context, Result, bail};
use asset::{mesh::RawMesh, texture::TextureData};
use wgpu::{
    AddressMode, Buffer, BufferUsages, Device, Extent3d, FilterMode, Origin3d, Queue, Sampler,
    SamplerDescriptor, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture, TextureAspect,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    VertexBufferLayout, VertexStepMode, util::DeviceExt,
};

/// Tightly packed xyz positions, shader location 0.
pub const POSITION_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: (std::mem::size_of::<f32>() * 3) as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

/// Tightly packed uv pairs, shader location 1.
pub const TEXCOORD_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: (std::mem::size_of::<f32>() * 2) as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![1 => Float32x2],
};

/// Vertex buffers per pipeline variant, in slot order.
pub const TEXTURED_BUFFERS: &[VertexBufferLayout<'static>] = &[POSITION_LAYOUT, TEXCOORD_LAYOUT];
pub const UNTEXTURED_BUFFERS: &[VertexBufferLayout<'static>] = &[POSITION_LAYOUT];

pub const TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// GPU-side copy of a mesh. The CPU arrays can be dropped once this exists.
pub struct MeshBuffers {
    pub positions: Buffer,
    pub texcoords: Option<Buffer>,
    pub indices: Buffer,
    pub index_count: u32,
}

/// Upload positions, indices and (when `textured`) texcoords.
pub fn upload_mesh(device: &Device, mesh: &RawMesh, textured: bool) -> Result<MeshBuffers> {
    let index_count =
        u32::try_from(mesh.indices.len()).context("index count does not fit in u32")?;

    let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh positions"),
        contents: bytemuck::cast_slice(&mesh.positions),
        usage: BufferUsages::VERTEX,
    });

    let texcoords = if textured {
        if !mesh.has_texcoords() {
            bail!("could not find texture coordinate buffer for a textured mesh");
        }
        Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh texcoords"),
            contents: bytemuck::cast_slice(&mesh.texcoords),
            usage: BufferUsages::VERTEX,
        }))
    } else {
        None
    };

    let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh indices"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: BufferUsages::INDEX,
    });

    log::info!(
        "Uploaded mesh: {} vertices, {} indices, texcoords={}",
        mesh.vertex_count(),
        index_count,
        texcoords.is_some()
    );

    Ok(MeshBuffers {
        positions,
        texcoords,
        indices,
        index_count,
    })
}

/// Sampled 2D texture with its full mip chain.
pub struct GpuTexture {
    pub texture: Texture,
    pub view: TextureView,
    pub sampler: Sampler,
}

pub fn upload_texture(device: &Device, queue: &Queue, data: &TextureData) -> Result<GpuTexture> {
    if !data.is_valid() {
        bail!(
            "texture data does not match its {}x{} size",
            data.width,
            data.height
        );
    }

    let mip_level_count = data.mip_level_count();
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("Mesh texture"),
        size: Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
        mip_level_count,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let chain = data.mip_chain()?;
    for (level, mip) in std::iter::once(data).chain(chain.iter()).enumerate() {
        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                mip_level: level as u32,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            &mip.data,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(mip.width * mip.bytes_per_pixel()),
                rows_per_image: Some(mip.height),
            },
            Extent3d {
                width: mip.width,
                height: mip.height,
                depth_or_array_layers: 1,
            },
        );
    }

    let view = texture.create_view(&Default::default());
    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("Mesh sampler"),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Linear,
        ..Default::default()
    });

    log::info!(
        "Uploaded texture {}x{} ({} mip levels)",
        data.width,
        data.height,
        mip_level_count
    );

    Ok(GpuTexture {
        texture,
        view,
        sampler,
    })
}
