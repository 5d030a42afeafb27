use std::path::Path;

use anyhow::{Context, Result};
use image::GenericImageView;
use wgpu::util::{DeviceExt, TextureDataOrder};

use super::pipeline::{PipelineLayouts, SAMPLE_FORMAT, SLOT_FORMAT};
use super::readback::padded_bytes_per_row;
use super::uniforms::DrawParams;

/// The image every formula samples, bound as texture group 1.
pub(crate) struct SourceImage {
    _texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &PipelineLayouts,
        sampler: &wgpu::Sampler,
        path: &Path,
    ) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to open input image at {}", path.display()))?;
        let (width, height) = image.dimensions();
        let rgba = image.to_rgba8();

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("input image"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = texture_bind_group(device, layouts, &view, sampler, "input image");
        tracing::info!(path = %path.display(), width, height, "loaded input image");

        Ok(Self {
            _texture: texture,
            bind_group,
            width,
            height,
        })
    }
}

/// Small float target for the sample pass plus the buffer it is read back
/// through.
pub(crate) struct SampleTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub readback: wgpu::Buffer,
    pub edge: u32,
    pub padded_bytes_per_row: u32,
}

impl SampleTarget {
    pub const BYTES_PER_PIXEL: u32 = 16;

    pub fn new(device: &wgpu::Device, edge: u32) -> Self {
        let edge = edge.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sample pass target"),
            size: wgpu::Extent3d {
                width: edge,
                height: edge,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SAMPLE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let padded_bytes_per_row = padded_bytes_per_row(edge, Self::BYTES_PER_PIXEL);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sample readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(edge),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            texture,
            view,
            readback,
            edge,
            padded_bytes_per_row,
        }
    }
}

/// One gallery image: render target for the final pass, sampled by the
/// display pipeline.
pub(crate) struct SlotTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

impl SlotTexture {
    pub fn new(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        sampler: &wgpu::Sampler,
        edge: u32,
        index: usize,
    ) -> Self {
        let label = format!("gallery slot #{index}");
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: edge,
                height: edge,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SLOT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = texture_bind_group(device, layouts, &view, sampler, &label);
        Self {
            _texture: texture,
            view,
            bind_group,
        }
    }
}

/// A `DrawParams` uniform buffer with its group 0 bind group.
pub(crate) struct ParamsBinding {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ParamsBinding {
    pub fn new(device: &wgpu::Device, layouts: &PipelineLayouts, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<DrawParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, params: &DrawParams) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(params));
    }
}

pub(crate) fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("gallery sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn texture_bind_group(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
