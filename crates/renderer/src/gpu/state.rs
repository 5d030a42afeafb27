use anyhow::{anyhow, Result};
use formula::Formula;
use gallery::{ImageRenderer, PlacedTile, SlotId, RESERVED_SLOTS};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::normalize::NormalizationParams;
use crate::types::{RenderError, RendererConfig};

use super::context::GpuContext;
use super::pipeline::{create_display_pipeline, FormulaProgram, PipelineLayouts};
use super::readback::{encode_sample_copy, read_samples};
use super::targets::{create_sampler, ParamsBinding, SampleTarget, SlotTexture, SourceImage};
use super::uniforms::DrawParams;

/// Every GPU resource the gallery needs: the swapchain, the input image, the
/// sample scratch target and one texture per display slot.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    display_pipeline: wgpu::RenderPipeline,
    source: SourceImage,
    sample_target: SampleTarget,
    sample_params: ParamsBinding,
    image_params: ParamsBinding,
    // indexed by slot index - RESERVED_SLOTS
    slots: Vec<SlotTexture>,
    slot_params: Vec<ParamsBinding>,
    render_size: u32,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
        display_slots: usize,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let device = &context.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let layouts = PipelineLayouts::new(device);
        let display_pipeline = create_display_pipeline(device, &layouts, context.surface_format);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(anyhow!("failed to build gallery display pipeline: {err}"));
        }

        let sampler = create_sampler(device);
        let source = SourceImage::load(
            device,
            &context.queue,
            &layouts,
            &sampler,
            &config.input_image,
        )?;
        let render_size = source.width.min(context.max_texture_dimension).max(1);
        if render_size != source.width {
            warn!(
                width = source.width,
                render_size, "input image wider than the GPU allows; rendering smaller"
            );
        }
        if source.width != source.height {
            debug!(
                width = source.width,
                height = source.height,
                "non-square input is stretched into square images"
            );
        }

        let sample_target = SampleTarget::new(device, config.sample_size);
        let sample_params = ParamsBinding::new(device, &layouts, "sample pass params");
        let image_params = ParamsBinding::new(device, &layouts, "image pass params");
        let slots = (0..display_slots)
            .map(|offset| {
                SlotTexture::new(device, &layouts, &sampler, render_size, offset + RESERVED_SLOTS)
            })
            .collect();
        let slot_params = (0..display_slots)
            .map(|offset| {
                let label = format!("slot params #{}", offset + RESERVED_SLOTS);
                ParamsBinding::new(device, &layouts, &label)
            })
            .collect();
        debug!(display_slots, render_size, "allocated gallery slots");

        Ok(Self {
            context,
            layouts,
            display_pipeline,
            source,
            sample_target,
            sample_params,
            image_params,
            slots,
            slot_params,
            render_size,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Compiles `formula`, estimates its output range from a small sample
    /// pass, then renders it normalised into `slot`.
    ///
    /// The slot texture is only written once the formula compiled and its
    /// range was read back.
    pub(crate) fn render_formula(
        &mut self,
        slot: SlotId,
        formula: &Formula,
    ) -> Result<NormalizationParams, RenderError> {
        let index = self.display_index(slot)?;
        let body = formula.fragment_body();
        let device = &self.context.device;
        let queue = &self.context.queue;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let program = FormulaProgram::build(device, &self.layouts, &body);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Compile(err.to_string()));
        }

        self.sample_params
            .write(queue, &DrawParams::full_target(self.sample_target.edge));
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("formula sample encoder"),
        });
        encode_quad_pass(
            &mut encoder,
            &self.sample_target.view,
            &program.sample,
            &self.sample_params.bind_group,
            &self.source.bind_group,
            "formula sample pass",
        );
        encode_sample_copy(&mut encoder, &self.sample_target);
        queue.submit(std::iter::once(encoder.finish()));
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Target(err.to_string()));
        }

        let samples = read_samples(device, &self.sample_target)?;
        let params = NormalizationParams::from_samples(&samples);

        let draw = DrawParams::full_target(self.render_size).with_normalization(&params);
        self.image_params.write(queue, &draw);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("formula image encoder"),
        });
        encode_quad_pass(
            &mut encoder,
            &self.slots[index].view,
            &program.image,
            &self.image_params.bind_group,
            &self.source.bind_group,
            "formula image pass",
        );
        queue.submit(std::iter::once(encoder.finish()));
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Target(err.to_string()));
        }

        Ok(params)
    }

    /// Presents one frame with every placed tile drawn at `tile_size` pixels.
    pub(crate) fn draw_gallery(
        &mut self,
        tiles: &[PlacedTile],
        tile_size: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let PhysicalSize { width, height } = self.context.size;

        let drawable: Vec<usize> = tiles
            .iter()
            .filter_map(|tile| {
                let index = self.display_index(tile.slot).ok()?;
                let params = DrawParams::new(width, height, tile.origin, tile_size);
                self.slot_params[index].write(&self.context.queue, &params);
                Some(index)
            })
            .collect();

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("gallery encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gallery pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.display_pipeline);
            for index in drawable {
                render_pass.set_bind_group(0, &self.slot_params[index].bind_group, &[]);
                render_pass.set_bind_group(1, &self.slots[index].bind_group, &[]);
                render_pass.draw(0..4, 0..1);
            }
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn display_index(&self, slot: SlotId) -> Result<usize, RenderError> {
        slot.index()
            .checked_sub(RESERVED_SLOTS)
            .filter(|index| *index < self.slots.len())
            .ok_or(RenderError::UnknownSlot(slot.index()))
    }
}

impl ImageRenderer for GpuState {
    type Error = RenderError;

    fn render(&mut self, slot: SlotId, formula: &Formula) -> Result<(), RenderError> {
        let params = self.render_formula(slot, formula)?;
        debug!(
            slot = slot.index(),
            %formula,
            mult = ?params.mult,
            add = ?params.add,
            "rendered gallery image"
        );
        Ok(())
    }
}

fn encode_quad_pass(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    params: &wgpu::BindGroup,
    texture: &wgpu::BindGroup,
    label: &str,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, params, &[]);
    render_pass.set_bind_group(1, texture, &[]);
    render_pass.draw(0..4, 0..1);
}
