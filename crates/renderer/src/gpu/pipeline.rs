use formula::FragmentBody;

use crate::compile::{compile_display_shader, compile_formula_shader, compile_vertex_shader};

/// Scratch format for the sample pass; unclamped so the true range survives.
pub(crate) const SAMPLE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
/// Format of every gallery slot image.
pub(crate) const SLOT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Layouts and the vertex stage shared by every quad pipeline.
///
/// Group 0 is the per-draw `DrawParams` block, group 1 the sampled texture.
pub(crate) struct PipelineLayouts {
    pub params_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
    pub vertex_module: wgpu::ShaderModule,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw params layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("source texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad pipeline layout"),
            bind_group_layouts: &[&params_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let vertex_module = compile_vertex_shader(device);

        Self {
            params_layout,
            texture_layout,
            pipeline_layout,
            vertex_module,
        }
    }
}

/// Draws slot textures onto the swapchain.
pub(crate) fn create_display_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let fragment_module = compile_display_shader(device);
    create_quad_pipeline(
        device,
        layouts,
        &fragment_module,
        surface_format,
        "gallery display pipeline",
    )
}

/// The two pipelines one formula needs: an unclamped sample pass and the
/// final pass into an 8-bit slot.
pub(crate) struct FormulaProgram {
    pub sample: wgpu::RenderPipeline,
    pub image: wgpu::RenderPipeline,
}

impl FormulaProgram {
    /// Must run inside a validation error scope; a bad body yields invalid
    /// pipelines, reported when the scope is popped.
    pub fn build(device: &wgpu::Device, layouts: &PipelineLayouts, body: &FragmentBody) -> Self {
        let fragment_module = compile_formula_shader(device, body);
        Self {
            sample: create_quad_pipeline(
                device,
                layouts,
                &fragment_module,
                SAMPLE_FORMAT,
                "formula sample pipeline",
            ),
            image: create_quad_pipeline(
                device,
                layouts,
                &fragment_module,
                SLOT_FORMAT,
                "formula image pipeline",
            ),
        }
    }
}

fn create_quad_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    fragment_module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layouts.pipeline_layout),
        vertex: wgpu::VertexState {
            module: &layouts.vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
